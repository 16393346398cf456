//! Collision detection and response
//!
//! Two separate mechanisms share the same circle tests:
//! - **Blocking**: bodies whose collision mask names the other's category are
//!   pushed apart and bounce. This runs inside the physics stage.
//! - **Contacts**: pairs whose categories and contact masks match are
//!   reported and dispatched to gameplay reactions through a symmetric table.

use glam::Vec2;

use super::body::{Category, PhysicsBody};
use super::cargo::CargoHold;
use super::projectile::Faction;
use super::state::{Entity, EntityId, EntityKind, World};
use crate::consts::*;

/// Result of a circle-circle overlap test
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Unit normal pointing from the first circle toward the second
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Overlap of two circles, with `slop` added to the combined radius.
///
/// Concentric circles get a fixed +X normal so response stays finite.
pub fn circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32, slop: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let reach = a_radius + b_radius + slop;
    if dist >= reach {
        return CollisionResult::miss();
    }
    let normal = if dist > 1e-4 { delta / dist } else { Vec2::X };
    CollisionResult {
        hit: true,
        normal,
        penetration: a_radius + b_radius - dist,
    }
}

// Blocking

/// Push apart and bounce two overlapping bodies. Only a body whose collision
/// mask contains the other's category is moved.
pub fn resolve_blocking(a: &mut PhysicsBody, b: &mut PhysicsBody) {
    let a_blocked = a.blocked_by(b);
    let b_blocked = b.blocked_by(a);
    if !a_blocked && !b_blocked {
        return;
    }
    let hit = circle_collision(a.position, a.radius, b.position, b.radius, 0.0);
    if !hit.hit || hit.penetration <= 0.0 {
        return;
    }
    let n = hit.normal;

    // Unblocked side acts as an immovable wall for the other
    let inv_a = if a_blocked { a.inv_mass() } else { 0.0 };
    let inv_b = if b_blocked { b.inv_mass() } else { 0.0 };
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let correction = n * (hit.penetration / inv_sum);
    a.position -= correction * inv_a;
    b.position += correction * inv_b;

    let closing = (b.velocity - a.velocity).dot(n);
    if closing >= 0.0 {
        return;
    }
    let restitution = a.restitution.min(b.restitution);
    let j = -(1.0 + restitution) * closing / inv_sum;
    a.velocity -= n * (j * inv_a);
    b.velocity += n * (j * inv_b);
}

/// Blocking pass over every pair of live entities
pub fn resolve_all_blocking(world: &mut World) {
    let n = world.entities.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = world.pair_mut(i, j);
            if a.despawned || b.despawned {
                continue;
            }
            resolve_blocking(&mut a.body, &mut b.body);
        }
    }
}

/// Keep wall-colliding bodies inside the world bounds
pub fn constrain_to_walls(body: &mut PhysicsBody) {
    if !body.is_dynamic || !body.collision_mask.intersects(Category::WALL) {
        return;
    }
    let r = body.radius;
    let e = body.restitution;
    if body.position.x - r < WORLD_MIN_X {
        body.position.x = WORLD_MIN_X + r;
        if body.velocity.x < 0.0 {
            body.velocity.x = -body.velocity.x * e;
        }
    } else if body.position.x + r > WORLD_MAX_X {
        body.position.x = WORLD_MAX_X - r;
        if body.velocity.x > 0.0 {
            body.velocity.x = -body.velocity.x * e;
        }
    }
    if body.position.y - r < WORLD_MIN_Y {
        body.position.y = WORLD_MIN_Y + r;
        if body.velocity.y < 0.0 {
            body.velocity.y = -body.velocity.y * e;
        }
    } else if body.position.y + r > WORLD_MAX_Y {
        body.position.y = WORLD_MAX_Y - r;
        if body.velocity.y > 0.0 {
            body.velocity.y = -body.velocity.y * e;
        }
    }
}

/// True once a body has left the world by more than `margin`
pub fn out_of_bounds(body: &PhysicsBody, margin: f32) -> bool {
    let p = body.position;
    p.x < WORLD_MIN_X - margin || p.x > WORLD_MAX_X + margin || p.y < WORLD_MIN_Y - margin || p.y > WORLD_MAX_Y + margin
}

// Contacts

/// Closed set of participants in contact reactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Enemy,
    Asteroid,
    Orb,
    HeldOrb,
    Catcher,
    PlayerProjectile,
    EnemyProjectile,
    Drone,
}

impl Role {
    pub fn of(kind: &EntityKind) -> Role {
        match kind {
            EntityKind::Player(_) => Role::Player,
            EntityKind::Enemy(_) => Role::Enemy,
            EntityKind::Asteroid(_) => Role::Asteroid,
            EntityKind::Orb(_) => Role::Orb,
            EntityKind::Projectile(p) => match p.faction {
                Faction::Player => Role::PlayerProjectile,
                Faction::Enemy => Role::EnemyProjectile,
            },
            EntityKind::Drone(_) => Role::Drone,
        }
    }
}

/// One side of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRef {
    Entity(EntityId),
    /// Hold-local held orb id
    HeldOrb(u32),
    Catcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: ContactRef,
    pub a_role: Role,
    pub b: ContactRef,
    pub b_role: Role,
}

impl Contact {
    pub fn between(a: &Entity, b: &Entity) -> Self {
        Self {
            a: ContactRef::Entity(a.id),
            a_role: Role::of(&a.kind),
            b: ContactRef::Entity(b.id),
            b_role: Role::of(&b.kind),
        }
    }
}

/// Touching pairs that want contact notification, in (lower id, higher id) order
pub fn detect_contacts(entities: &[Entity], slop: f32) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        if a.despawned {
            continue;
        }
        for b in &entities[i + 1..] {
            if b.despawned || !a.body.wants_contact(&b.body) {
                continue;
            }
            if circle_collision(a.body.position, a.body.radius, b.body.position, b.body.radius, slop).hit {
                contacts.push(Contact::between(a, b));
            }
        }
    }
    contacts
}

/// Held orbs touching the hold's catcher line
pub fn hold_contacts(hold: &CargoHold) -> Vec<Contact> {
    hold.catcher_contacts()
        .into_iter()
        .map(|id| Contact {
            a: ContactRef::HeldOrb(id),
            a_role: Role::HeldOrb,
            b: ContactRef::Catcher,
            b_role: Role::Catcher,
        })
        .collect()
}

/// Gameplay outcome of a contact pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Player projectile damages an asteroid
    ProjectileHitsAsteroid,
    /// Player collects a loose orb
    OrbPickup,
    /// Held orb falls out of the hold
    HeldOrbCaught,
    /// Enemy projectile damages the player
    PlayerHit,
    /// Player projectile damages an enemy
    EnemyHit,
}

/// Ordered (first, second) role pairs. Lookup tries both orientations.
const REACTIONS: &[(Role, Role, Reaction)] = &[
    (Role::PlayerProjectile, Role::Asteroid, Reaction::ProjectileHitsAsteroid),
    (Role::Orb, Role::Player, Reaction::OrbPickup),
    (Role::HeldOrb, Role::Catcher, Reaction::HeldOrbCaught),
    (Role::Player, Role::EnemyProjectile, Reaction::PlayerHit),
    (Role::Enemy, Role::PlayerProjectile, Reaction::EnemyHit),
];

/// Find the reaction for a pair. The flag is true when `b` plays the first role.
pub fn lookup(a: Role, b: Role) -> Option<(Reaction, bool)> {
    REACTIONS.iter().find_map(|&(first, second, reaction)| {
        if (first, second) == (a, b) {
            Some((reaction, false))
        } else if (first, second) == (b, a) {
            Some((reaction, true))
        } else {
            None
        }
    })
}

/// Run the reaction for one contact. Pairs outside the table are ignored, as
/// are entities that were despawned earlier in the tick.
pub fn dispatch(world: &mut World, contact: &Contact) {
    let Some((reaction, swapped)) = lookup(contact.a_role, contact.b_role) else {
        return;
    };
    let (first, second) = if swapped { (contact.b, contact.a) } else { (contact.a, contact.b) };

    match (reaction, first, second) {
        (Reaction::ProjectileHitsAsteroid, ContactRef::Entity(bullet), ContactRef::Entity(rock)) => {
            let Some(at) = live_pair_position(world, bullet, rock) else {
                return;
            };
            world.damage(rock, 1);
            world.commands.hit_effect(at);
            world.despawn(bullet);
        }
        (Reaction::OrbPickup, ContactRef::Entity(orb), ContactRef::Entity(player)) => {
            if world.get(player).is_some() {
                world.collect_orb(orb);
            }
        }
        (Reaction::HeldOrbCaught, ContactRef::HeldOrb(held), ContactRef::Catcher) => {
            let ticks = crate::secs_to_ticks(world.tuning.held_orb_fade_secs);
            if let Some(player) = world.player_mut() {
                if player.hold.start_fade(held, ticks) {
                    log::debug!("Held orb {} slipped onto the catcher", held);
                }
            }
        }
        (Reaction::PlayerHit, ContactRef::Entity(player), ContactRef::Entity(bullet)) => {
            let Some(at) = live_pair_position(world, bullet, player) else {
                return;
            };
            world.commands.hit_effect(at);
            world.damage(player, 1);
            world.despawn(bullet);
        }
        (Reaction::EnemyHit, ContactRef::Entity(enemy), ContactRef::Entity(bullet)) => {
            if world.get(bullet).is_none() {
                return;
            }
            let Some(at) = world.get(enemy).map(|e| e.body.position) else {
                return;
            };
            world.damage(enemy, 1);
            world.commands.hit_effect(at);
            world.despawn(bullet);
        }
        _ => {}
    }
}

/// Position of `source` if both entities are still live
fn live_pair_position(world: &World, source: EntityId, other: EntityId) -> Option<Vec2> {
    world.get(other)?;
    world.get(source).map(|e| e.body.position)
}
