//! Read-only view of the world for renderers and UI
//!
//! A [`Snapshot`] is plain data: it can be serialized, diffed, or flattened
//! into [`RenderInstance`] records and uploaded as a GPU instance buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::Serialize;

use super::asteroid::AsteroidType;
use super::cargo::{DepositLabel, OrbSize};
use super::enemy::EnemyState;
use super::projectile::Faction;
use super::state::{EntityId, EntityKind, GamePhase, HitEffect, World};

/// What an entity looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityTag {
    Player,
    Enemy(EnemyState),
    Asteroid(AsteroidType),
    Orb(OrbSize),
    Projectile(Faction),
    Drone,
}

impl EntityTag {
    fn of(kind: &EntityKind) -> Self {
        match kind {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Enemy(e) => EntityTag::Enemy(e.state),
            EntityKind::Asteroid(a) => EntityTag::Asteroid(a.kind),
            EntityKind::Orb(o) => EntityTag::Orb(o.size),
            EntityKind::Projectile(p) => EntityTag::Projectile(p.faction),
            EntityKind::Drone(_) => EntityTag::Drone,
        }
    }

    /// Stable numeric code for shaders
    pub fn code(self) -> u32 {
        match self {
            EntityTag::Player => 0,
            EntityTag::Enemy(_) => 1,
            EntityTag::Asteroid(_) => 2,
            EntityTag::Orb(_) => 3,
            EntityTag::Projectile(Faction::Player) => 4,
            EntityTag::Projectile(Faction::Enemy) => 5,
            EntityTag::Drone => 6,
        }
    }
}

/// Visual state bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisualFlags {
    pub thrusting: bool,
    pub grabbing: bool,
    pub hit_flash: bool,
    pub fading: bool,
}

impl VisualFlags {
    pub fn bits(self) -> u32 {
        (self.thrusting as u32) | (self.grabbing as u32) << 1 | (self.hit_flash as u32) << 2 | (self.fading as u32) << 3
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub tag: EntityTag,
    pub position: Vec2,
    pub rotation: f32,
    pub radius: f32,
    pub flags: VisualFlags,
}

/// Held orb in hold-local coordinates
#[derive(Debug, Clone, Serialize)]
pub struct HeldOrbSnapshot {
    pub size: OrbSize,
    pub position: Vec2,
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub experience: u64,
    pub player_health: Option<i32>,
    pub entities: Vec<EntitySnapshot>,
    pub held_orbs: Vec<HeldOrbSnapshot>,
    pub hit_effects: Vec<HitEffect>,
    /// Player and grabbed target positions
    pub grab_line: Option<(Vec2, Vec2)>,
    pub labels: Vec<DepositLabel>,
}

/// One instanced draw record (32 bytes, matches the shader layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub pos: [f32; 2],
    pub radius: f32,
    pub rotation: f32,
    pub kind: u32,
    pub flags: u32,
    pub alpha: f32,
    pub _pad: u32,
}

impl Snapshot {
    /// World entities as GPU instance records, in id order
    pub fn instances(&self) -> Vec<RenderInstance> {
        self.entities
            .iter()
            .map(|e| RenderInstance {
                pos: e.position.to_array(),
                radius: e.radius,
                rotation: e.rotation,
                kind: e.tag.code(),
                flags: e.flags.bits(),
                alpha: if e.flags.fading { 0.5 } else { 1.0 },
                _pad: 0,
            })
            .collect()
    }

    pub fn instance_bytes(instances: &[RenderInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

impl World {
    pub fn snapshot(&self) -> Snapshot {
        let grabbed = self.player().and_then(|p| p.grabbed);
        let fade_total = crate::secs_to_ticks(self.tuning.held_orb_fade_secs);
        let entities = self
            .entities()
            .map(|e| {
                let (thrusting, grabbing) = match &e.kind {
                    EntityKind::Player(p) => (p.thrusting, p.grabbed.is_some()),
                    _ => (false, false),
                };
                // Loose orbs blink out over their last fade window
                let fading = matches!(&e.kind, EntityKind::Orb(o) if o.ttl_ticks <= fade_total);
                EntitySnapshot {
                    id: e.id,
                    tag: EntityTag::of(&e.kind),
                    position: e.body.position,
                    rotation: e.body.rotation,
                    radius: e.body.radius,
                    flags: VisualFlags {
                        thrusting,
                        grabbing,
                        hit_flash: e.hit_flash > 0,
                        fading,
                    },
                }
            })
            .collect();

        let (held_orbs, labels) = match self.player() {
            Some(p) => (
                p.hold
                    .orbs()
                    .iter()
                    .map(|o| HeldOrbSnapshot {
                        size: o.size,
                        position: o.pos,
                        alpha: o.alpha(fade_total),
                    })
                    .collect(),
                p.hold.labels.clone(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let grab_line = match (self.player_body(), grabbed.and_then(|id| self.get(id))) {
            (Some(player), Some(target)) => Some((player.position, target.body.position)),
            _ => None,
        };

        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            experience: self.experience(),
            player_health: self.player_health(),
            entities,
            held_orbs,
            hit_effects: self.effects.clone(),
            grab_line,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), 32);
        let instances = vec![RenderInstance::default(); 3];
        assert_eq!(Snapshot::instance_bytes(&instances).len(), 96);
    }

    #[test]
    fn test_snapshot_of_default_layout() {
        let world = World::with_default_layout(7, Tuning::default());
        let snap = world.snapshot();
        assert_eq!(snap.entities.len(), 102);
        assert_eq!(snap.player_health, Some(10));
        assert_eq!(snap.entities[0].tag, EntityTag::Player);
        assert!(snap.grab_line.is_none());
        assert_eq!(snap.instances().len(), 102);
        assert!(serde_json::to_string(&snap).is_ok());
    }

    #[test]
    fn test_grab_line_and_flags() {
        let mut world = World::new(7, Tuning::default());
        world.spawn_player(Vec2::ZERO);
        let rock = world.spawn_asteroid(AsteroidType::Small, Vec2::new(0.0, 400.0));
        assert!(world.grab(rock));
        let snap = world.snapshot();
        assert_eq!(snap.grab_line, Some((Vec2::ZERO, Vec2::new(0.0, 400.0))));
        assert!(snap.entities[0].flags.grabbing);
        assert_eq!(snap.instances()[0].flags, 0b10);
    }
}
