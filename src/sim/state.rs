//! World state and core simulation types
//!
//! The [`World`] owns every entity. Behaviors never add or remove entities
//! directly; they queue work in [`Commands`] which the world flushes once per
//! tick. Entities are kept sorted by id (ids are never reused), which gives
//! every per-entity pass a stable, insertion-ordered iteration.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::asteroid::{Asteroid, AsteroidType};
use super::body::PhysicsBody;
use super::cargo::{Orb, OrbSize};
use super::drone::Drone;
use super::enemy::Enemy;
use super::joint::SpringJoint;
use super::player::{Player, PlayerIntents};
use super::projectile::{Faction, Projectile};
use crate::consts::*;
use crate::tuning::Tuning;

/// Stable entity handle. Never reused within a world.
pub type EntityId = u32;

/// Anything with health
pub trait Damageable {
    fn health(&self) -> i32;
    fn health_mut(&mut self) -> &mut i32;

    /// Subtract `amount`. Returns true if this killed the entity.
    fn take_damage(&mut self, amount: i32) -> bool {
        *self.health_mut() -= amount;
        if self.health() <= 0 { self.death() } else { false }
    }

    fn heal(&mut self, amount: i32) {
        *self.health_mut() += amount;
    }

    /// Called once health reaches zero. Returns whether the entity is dead.
    fn death(&mut self) -> bool {
        true
    }
}

/// Targets for the grab action and for automatic aiming
pub trait Grabbable {
    fn is_grabbable(&self) -> bool;
}

/// Per-kind entity data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Player(Box<Player>),
    Enemy(Enemy),
    Asteroid(Asteroid),
    Orb(Orb),
    Projectile(Projectile),
    Drone(Drone),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player(_) => "player",
            EntityKind::Enemy(_) => "enemy",
            EntityKind::Asteroid(_) => "asteroid",
            EntityKind::Orb(_) => "orb",
            EntityKind::Projectile(_) => "projectile",
            EntityKind::Drone(_) => "drone",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub body: PhysicsBody,
    pub kind: EntityKind,
    /// Ticks left on the damage flash
    pub hit_flash: u32,
    /// Marked for removal at the next flush
    #[serde(skip)]
    pub(crate) despawned: bool,
}

impl Entity {
    pub fn is_alive(&self) -> bool {
        !self.despawned
    }
}

impl Grabbable for Entity {
    fn is_grabbable(&self) -> bool {
        matches!(self.kind, EntityKind::Asteroid(_))
    }
}

/// A queued entity, assigned an id when the queue is flushed
#[derive(Debug, Clone)]
pub struct Spawn {
    pub body: PhysicsBody,
    pub kind: EntityKind,
}

/// Deferred world mutations produced while entities are being iterated
#[derive(Debug, Default)]
pub struct Commands {
    pub spawns: Vec<Spawn>,
    /// Hit effect positions
    pub effects: Vec<Vec2>,
    pub events: Vec<GameEvent>,
}

impl Commands {
    pub fn spawn(&mut self, body: PhysicsBody, kind: EntityKind) {
        self.spawns.push(Spawn { body, kind });
    }

    pub fn hit_effect(&mut self, pos: Vec2) {
        self.effects.push(pos);
    }

    pub fn event(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Gameplay notifications for scoring, UI and audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired { faction: Faction },
    AsteroidDestroyed { id: EntityId, kind: AsteroidType, position: Vec2 },
    EnemyDestroyed { id: EntityId },
    OrbCollected { size: OrbSize },
    /// An asteroid hauled into the depot was salvaged for cargo
    AsteroidSalvaged { id: EntityId },
    Deposited { value: u32, experience: u64 },
    PlayerDamaged { health: i32 },
    PlayerDied { experience: u64 },
    Grabbed { target: EntityId },
    Released { target: EntityId },
}

/// Short-lived impact burst (visual only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitEffect {
    pub pos: Vec2,
    pub ticks_left: u32,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// The player died; the rest of the world keeps running
    GameOver,
}

/// The drop-off area
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Depot {
    pub center: Vec2,
    pub half_extent: Vec2,
}

impl Default for Depot {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            half_extent: Vec2::splat(DEPOT_HALF_EXTENT),
        }
    }
}

impl Depot {
    pub fn overlaps(&self, body: &PhysicsBody) -> bool {
        super::geom::circle_overlaps_rect(body.position, body.radius, self.center, self.half_extent)
    }
}

/// The complete simulation
#[derive(Debug)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub depot: Depot,
    pub(crate) rng: Pcg32,
    /// Sorted by id
    pub(crate) entities: Vec<Entity>,
    pub(crate) joints: Vec<SpringJoint>,
    pub(crate) player_id: Option<EntityId>,
    pub(crate) effects: Vec<HitEffect>,
    pub(crate) commands: Commands,
    pub(crate) pending_fire: bool,
    pub(crate) pending_grab_toggle: bool,
    /// Intents for the next tick, taking priority over its `TickInput`
    pub(crate) pending_intents: Option<PlayerIntents>,
    events: Vec<GameEvent>,
    /// Experience banked when the player died
    final_experience: u64,
    next_id: EntityId,
}

impl World {
    /// An empty world
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            tuning,
            time_ticks: 0,
            phase: GamePhase::Playing,
            depot: Depot::default(),
            rng: Pcg32::seed_from_u64(seed),
            entities: Vec::new(),
            joints: Vec::new(),
            player_id: None,
            effects: Vec::new(),
            commands: Commands::default(),
            pending_fire: false,
            pending_grab_toggle: false,
            pending_intents: None,
            events: Vec::new(),
            final_experience: 0,
            next_id: 1,
        }
    }

    /// Player at the origin, a random asteroid field and one enemy
    pub fn with_default_layout(seed: u64, tuning: Tuning) -> Self {
        let mut world = Self::new(seed, tuning);
        world.spawn_player(Vec2::ZERO);

        for _ in 0..world.tuning.initial_asteroids {
            let kind = AsteroidType::random(&mut world.rng);
            let x = world.rng.random_range(WORLD_MIN_X..WORLD_MAX_X);
            let y = world.rng.random_range(WORLD_MIN_Y..WORLD_MAX_Y + 1000.0);
            world.spawn_asteroid(kind, Vec2::new(x, y));
        }

        world.spawn_enemy(Vec2::new(0.0, -700.0));
        log::info!(
            "World seeded with {}: {} entities",
            seed,
            world.entities.len()
        );
        world
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an entity right away. Only valid between ticks.
    pub fn insert(&mut self, body: PhysicsBody, kind: EntityKind) -> EntityId {
        let id = self.next_entity_id();
        if matches!(kind, EntityKind::Player(_)) {
            if self.player().is_some() {
                log::warn!("Replacing the active player with entity {}", id);
            }
            self.player_id = Some(id);
        }
        self.entities.push(Entity {
            id,
            body,
            kind,
            hit_flash: 0,
            despawned: false,
        });
        id
    }

    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let body = Player::body(position, &self.tuning);
        let player = Player::new(&self.tuning);
        self.insert(body, EntityKind::Player(Box::new(player)))
    }

    pub fn spawn_asteroid(&mut self, kind: AsteroidType, position: Vec2) -> EntityId {
        let asteroid = Asteroid::new(kind, &mut self.rng);
        let body = asteroid.body(position, &mut self.rng, &self.tuning);
        self.insert(body, EntityKind::Asteroid(asteroid))
    }

    /// Enemy hunting the current player
    pub fn spawn_enemy(&mut self, position: Vec2) -> EntityId {
        let enemy = Enemy::new(self.player_id, &self.tuning);
        let body = Enemy::body(position, &self.tuning);
        self.insert(body, EntityKind::Enemy(enemy))
    }

    pub fn spawn_orb(&mut self, size: OrbSize, position: Vec2, velocity: Vec2) -> EntityId {
        let orb = Orb::new(size, &self.tuning);
        let body = orb.body(position, velocity, &self.tuning);
        self.insert(body, EntityKind::Orb(orb))
    }

    pub fn spawn_drone(&mut self, position: Vec2) -> EntityId {
        let drone = Drone::new(&self.tuning);
        self.insert(Drone::body(position), EntityKind::Drone(drone))
    }

    /// Player bullet along `angle`, outside of the normal cooldown
    pub fn spawn_player_projectile(&mut self, origin: Vec2, angle: f32) -> EntityId {
        let (projectile, body) = Projectile::player_shot(origin, angle, &self.tuning);
        self.insert(body, EntityKind::Projectile(projectile))
    }

    pub fn spawn_enemy_projectile(&mut self, origin: Vec2, target: Vec2) -> EntityId {
        let (projectile, body) = Projectile::enemy_shot(origin, target, &self.tuning);
        self.insert(body, EntityKind::Projectile(projectile))
    }

    // Lookup

    pub(crate) fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .filter(|&i| !self.entities[i].despawned)
    }

    /// A live entity
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    /// Live entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.despawned)
    }

    pub fn entity_count(&self) -> usize {
        self.entities().count()
    }

    /// Live entity count per kind name
    pub fn count_of(&self, name: &str) -> usize {
        self.entities().filter(|e| e.kind.name() == name).count()
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id.filter(|&id| self.index_of(id).is_some())
    }

    pub fn player(&self) -> Option<&Player> {
        match &self.get(self.player_id?)?.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player_parts_mut().map(|(p, _)| p)
    }

    pub fn player_body(&self) -> Option<&PhysicsBody> {
        self.get(self.player_id?).map(|e| &e.body)
    }

    pub(crate) fn player_parts_mut(&mut self) -> Option<(&mut Player, &mut PhysicsBody)> {
        let id = self.player_id?;
        let entity = self.get_mut(id)?;
        match &mut entity.kind {
            EntityKind::Player(p) => Some((p.as_mut(), &mut entity.body)),
            _ => None,
        }
    }

    /// Two distinct entities by index
    pub(crate) fn pair_mut(&mut self, i: usize, j: usize) -> (&mut Entity, &mut Entity) {
        debug_assert_ne!(i, j);
        if i < j {
            let (left, right) = self.entities.split_at_mut(j);
            (&mut left[i], &mut right[0])
        } else {
            let (left, right) = self.entities.split_at_mut(i);
            (&mut right[0], &mut left[j])
        }
    }

    // Scoring / UI

    pub fn experience(&self) -> u64 {
        self.player().map_or(self.final_experience, |p| p.experience())
    }

    pub fn player_health(&self) -> Option<i32> {
        self.player().map(|p| p.health)
    }

    pub fn reset_experience(&mut self) {
        if let Some(player) = self.player_mut() {
            player.reset_experience();
        }
        self.final_experience = 0;
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    // Input conveniences

    /// Steer the player on the next tick, overriding that tick's input
    pub fn set_player_intents(&mut self, intents: PlayerIntents) {
        self.pending_intents = Some(intents);
    }

    /// Fire at the nearest target on the next tick
    pub fn request_shoot(&mut self) {
        self.pending_fire = true;
    }

    /// Grab or release on the next tick
    pub fn request_grab_toggle(&mut self) {
        self.pending_grab_toggle = true;
    }

    // Targets

    /// Live grabbable entities with their positions
    pub fn grabbable_positions(&self) -> Vec<(EntityId, Vec2)> {
        self.entities()
            .filter(|e| e.is_grabbable())
            .map(|e| (e.id, e.body.position))
            .collect()
    }

    /// Closest grabbable to `from` (ties go to the lower id)
    pub fn nearest_grabbable(&self, from: Vec2) -> Option<(EntityId, Vec2)> {
        self.entities()
            .filter(|e| e.is_grabbable())
            .map(|e| (e.id, e.body.position, e.body.position.distance_squared(from)))
            .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
            .map(|(id, pos, _)| (id, pos))
    }

    // Grab

    /// Attach the player to `target` with a spring. Replaces any current grab.
    pub fn grab(&mut self, target: EntityId) -> bool {
        let Some(player_id) = self.player_id() else {
            return false;
        };
        if target == player_id || !self.get(target).is_some_and(|e| e.is_grabbable()) {
            return false;
        }
        self.release_grab();

        let (Some(pi), Some(ti)) = (self.index_of(player_id), self.index_of(target)) else {
            return false;
        };
        let joint = SpringJoint::new(
            player_id,
            &self.entities[pi].body,
            target,
            &self.entities[ti].body,
            self.tuning.grab_frequency,
            self.tuning.grab_damping,
        );
        self.joints.push(joint);
        if let Some(player) = self.player_mut() {
            player.grabbed = Some(target);
        }
        log::debug!("Player grabbed entity {}", target);
        self.emit(GameEvent::Grabbed { target });
        true
    }

    /// Drop the current grab, if any
    pub fn release_grab(&mut self) {
        let Some(player_id) = self.player_id else {
            return;
        };
        let Some(target) = self.player_mut().and_then(|p| p.grabbed.take()) else {
            return;
        };
        self.joints.retain(|j| !(j.involves(player_id) && j.involves(target)));
        self.emit(GameEvent::Released { target });
    }

    /// Release if grabbing, otherwise grab the nearest grabbable
    pub fn toggle_grab(&mut self) {
        if self.player().is_some_and(|p| p.grabbed.is_some()) {
            self.release_grab();
            return;
        }
        let Some(origin) = self.player_body().map(|b| b.position) else {
            return;
        };
        if let Some((target, _)) = self.nearest_grabbable(origin) {
            self.grab(target);
        }
    }

    // Lifecycle

    /// Mark an entity for removal. Its joints go at once; the entity itself
    /// is dropped at the next flush. Repeated calls are no-ops.
    pub fn despawn(&mut self, id: EntityId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.entities[index].despawned = true;
        self.joints.retain(|j| !j.involves(id));

        let released = match self.player_mut() {
            Some(player) if player.grabbed == Some(id) => {
                player.grabbed = None;
                true
            }
            _ => false,
        };
        if released {
            self.emit(GameEvent::Released { target: id });
        }
    }

    /// Apply damage and run the death outcome. Returns true if `id` died.
    pub fn damage(&mut self, id: EntityId, amount: i32) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let flash = self.tuning.hit_flash_ticks;
        let entity = &mut self.entities[index];
        let died = match &mut entity.kind {
            EntityKind::Player(p) => p.take_damage(amount),
            EntityKind::Enemy(e) => e.take_damage(amount),
            EntityKind::Asteroid(a) => a.take_damage(amount),
            _ => return false,
        };
        entity.hit_flash = flash;
        if let EntityKind::Player(p) = &entity.kind {
            let health = p.health;
            self.emit(GameEvent::PlayerDamaged { health });
        }

        if died {
            self.kill(index);
        }
        died
    }

    fn kill(&mut self, index: usize) {
        let entity = &self.entities[index];
        let id = entity.id;
        let position = entity.body.position;
        match &entity.kind {
            EntityKind::Asteroid(asteroid) => {
                let kind = asteroid.kind;
                asteroid.fragment(position, &mut self.rng, &self.tuning, &mut self.commands);
                log::info!("Asteroid {} ({:?}) destroyed", id, kind);
                self.emit(GameEvent::AsteroidDestroyed { id, kind, position });
            }
            EntityKind::Enemy(_) => {
                log::info!("Enemy {} destroyed", id);
                self.emit(GameEvent::EnemyDestroyed { id });
            }
            EntityKind::Player(player) => {
                let experience = player.experience();
                self.final_experience = experience;
                self.phase = GamePhase::GameOver;
                log::info!("Player destroyed with {} experience", experience);
                self.emit(GameEvent::PlayerDied { experience });
            }
            _ => {}
        }
        self.despawn(id);
    }

    /// Player picks up a loose orb
    pub fn collect_orb(&mut self, orb_id: EntityId) -> bool {
        let size = match self.get(orb_id).map(|e| &e.kind) {
            Some(EntityKind::Orb(orb)) => orb.size,
            _ => return false,
        };
        if self.player().is_none() {
            return false;
        }
        self.despawn(orb_id);
        self.stow(&[Orb::new(size, &self.tuning)]);
        self.emit(GameEvent::OrbCollected { size });
        true
    }

    /// Put items straight into the player's hold
    pub fn stow(&mut self, items: &[Orb]) {
        let Some(index) = self.player_id.and_then(|id| self.index_of(id)) else {
            return;
        };
        let entity = &mut self.entities[index];
        if let EntityKind::Player(player) = &mut entity.kind {
            player.add_to_cargo(&mut entity.body, items, &mut self.rng, &self.tuning);
        }
    }

    /// Apply queued spawns, effects and events, then drop despawned entities
    pub fn flush(&mut self) {
        let removed = self.entities.iter().filter(|e| e.despawned).count();
        self.entities.retain(|e| !e.despawned);

        let spawns = std::mem::take(&mut self.commands.spawns);
        let spawned = spawns.len();
        for spawn in spawns {
            self.insert(spawn.body, spawn.kind);
        }

        let ticks = crate::secs_to_ticks(self.tuning.hit_effect_secs);
        for pos in self.commands.effects.drain(..) {
            self.effects.push(HitEffect { pos, ticks_left: ticks });
        }
        self.events.append(&mut self.commands.events);

        if removed > 0 || spawned > 0 {
            log::debug!("Flush: +{} -{} ({} live)", spawned, removed, self.entities.len());
        }
    }
}
