//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically. Stage order:
//! input, physics, docking, behaviors, contacts, scheduled timers, flush.

use super::autopilot::autopilot_input;
use super::cargo::{Orb, OrbSize};
use super::collision::{constrain_to_walls, detect_contacts, dispatch, hold_contacts, out_of_bounds, resolve_all_blocking};
use super::geom::angle_to;
use super::player::PlayerIntents;
use super::projectile::{Faction, Projectile};
use super::state::{EntityKind, GameEvent, GamePhase, World};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub forward: bool,
    pub backward: bool,
    pub boost: bool,
    /// Desired ship facing (radians)
    pub target_angle: Option<f32>,
    /// Held fire button
    pub fire: bool,
    /// Grab/release (one-shot)
    pub grab_toggle: bool,
    /// Pause toggle (one-shot)
    pub pause: bool,
    /// Idle/demo mode - AI flies the ship
    pub idle_mode: bool,
}

impl TickInput {
    pub fn intents(&self) -> PlayerIntents {
        PlayerIntents {
            forward: self.forward,
            backward: self.backward,
            boost: self.boost,
            target_angle: self.target_angle,
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match world.phase {
            GamePhase::Playing => {
                world.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", world.time_ticks);
                return;
            }
            GamePhase::Paused => world.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if world.phase == GamePhase::Paused {
        return;
    }

    let input = if input.idle_mode { autopilot_input(world) } else { input.clone() };

    world.time_ticks += 1;

    // Input stage
    let intents = world.pending_intents.take().unwrap_or_else(|| input.intents());
    if let Some(player) = world.player_mut() {
        player.intents = intents;
    }
    let fire = input.fire || std::mem::take(&mut world.pending_fire);
    let grab_toggle = input.grab_toggle || std::mem::take(&mut world.pending_grab_toggle);
    if grab_toggle {
        world.toggle_grab();
    }

    step_physics(world, dt);
    update_docking(world);
    update_behaviors(world, fire);
    salvage_hauled_asteroid(world);
    resolve_contacts(world);
    run_timers(world, dt);
    world.flush();
}

/// Forces, integration, blocking and the cargo hold's own little world
fn step_physics(world: &mut World, dt: f32) {
    apply_orb_field(world, dt);

    for joint in world.joints.clone() {
        let (Some(a), Some(b)) = (world.index_of(joint.a), world.index_of(joint.b)) else {
            continue;
        };
        let (a, b) = world.pair_mut(a, b);
        joint.solve(&mut a.body, &mut b.body, dt);
    }

    for entity in world.entities.iter_mut().filter(|e| !e.despawned) {
        entity.body.integrate(dt);
    }

    resolve_all_blocking(world);

    let margin = world.tuning.out_of_bounds_margin;
    let mut lost = Vec::new();
    for entity in world.entities.iter_mut().filter(|e| !e.despawned) {
        constrain_to_walls(&mut entity.body);
        if out_of_bounds(&entity.body, margin) {
            lost.push(entity.id);
        }
    }
    for id in lost {
        log::debug!("Entity {} left the world", id);
        world.despawn(id);
    }

    if let Some(index) = world.player_id.and_then(|id| world.index_of(id)) {
        if let EntityKind::Player(player) = &mut world.entities[index].kind {
            player.hold.step(dt, &world.tuning);
        }
    }
}

/// Radial pull toward the player on every field-affected body.
///
/// Acceleration is `strength * scale^2 / max(d, 50)`, where `scale` converts
/// field units to world units.
fn apply_orb_field(world: &mut World, dt: f32) {
    let Some(center) = world.player_body().map(|b| b.position) else {
        return;
    };
    let t = &world.tuning;
    let (strength, scale, radius) = (t.orb_field_strength, t.orb_field_scale, t.orb_field_radius);
    if strength == 0.0 {
        return;
    }
    for entity in world.entities.iter_mut().filter(|e| !e.despawned && e.body.affected_by_fields) {
        let offset = center - entity.body.position;
        let d = offset.length();
        if d >= radius || d <= f32::EPSILON {
            continue;
        }
        let accel = strength * scale * scale / d.max(50.0);
        entity.body.velocity += offset / d * accel * dt;
    }
}

fn update_docking(world: &mut World) {
    let depot = world.depot;
    if let Some((player, body)) = world.player_parts_mut() {
        player.docked = depot.overlaps(body);
    }
}

/// Per-entity behavior in insertion order. Entities spawned here only join
/// the world at the flush, so they first act next tick.
fn update_behaviors(world: &mut World, fire: bool) {
    let player = world.player_id().zip(world.player_body().map(|b| b.position));
    let fire_angle = match player {
        Some((_, pos)) if fire => world.nearest_grabbable(pos).map(|(_, target)| angle_to(pos, target)),
        _ => None,
    };
    let has_drones = world.entities().any(|e| matches!(e.kind, EntityKind::Drone(_)));
    let candidates = if has_drones { world.grabbable_positions() } else { Vec::new() };

    for i in 0..world.entities.len() {
        let entity = &mut world.entities[i];
        if entity.despawned {
            continue;
        }
        let body = &mut entity.body;
        match &mut entity.kind {
            EntityKind::Player(p) => {
                if let Some(angle) = fire_angle {
                    p.shoot(body.position, angle, &world.tuning, &mut world.commands);
                }
                p.update(body, &mut world.rng, &world.tuning, &mut world.commands);
            }
            EntityKind::Enemy(enemy) => {
                let target = player.filter(|(id, _)| enemy.target == Some(*id)).map(|(_, pos)| pos);
                enemy.update(body, target, &world.tuning, &mut world.commands);
            }
            EntityKind::Drone(drone) => {
                if let Some(target) = drone.targeting.update(body, &candidates) {
                    let angle = angle_to(body.position, target);
                    let (projectile, shot) = Projectile::player_shot(body.position, angle, &world.tuning);
                    world.commands.spawn(shot, EntityKind::Projectile(projectile));
                    world.commands.event(GameEvent::ShotFired {
                        faction: Faction::Player,
                    });
                }
            }
            EntityKind::Asteroid(_) | EntityKind::Orb(_) | EntityKind::Projectile(_) => {}
        }
    }
}

/// A grabbed asteroid towed into the depot is broken down into a large orb
fn salvage_hauled_asteroid(world: &mut World) {
    let Some(target) = world.player().and_then(|p| p.grabbed) else {
        return;
    };
    let hauled = world.get(target).is_some_and(|e| world.depot.overlaps(&e.body));
    if !hauled {
        return;
    }
    log::info!("Asteroid {} salvaged at the depot", target);
    world.despawn(target);
    let orb = Orb::new(OrbSize::Large, &world.tuning);
    world.stow(&[orb]);
    world.emit(GameEvent::AsteroidSalvaged { id: target });
}

fn resolve_contacts(world: &mut World) {
    let mut contacts = detect_contacts(&world.entities, world.tuning.contact_slop);
    if let Some(player) = world.player() {
        contacts.extend(hold_contacts(&player.hold));
    }
    for contact in &contacts {
        dispatch(world, contact);
    }
}

/// Count down lifetimes, flashes and visual effects
fn run_timers(world: &mut World, dt: f32) {
    let mut expired = Vec::new();
    for entity in world.entities.iter_mut().filter(|e| !e.despawned) {
        entity.hit_flash = entity.hit_flash.saturating_sub(1);
        let ttl = match &mut entity.kind {
            EntityKind::Projectile(p) => Some(&mut p.ttl_ticks),
            EntityKind::Orb(o) => Some(&mut o.ttl_ticks),
            EntityKind::Player(p) => {
                p.hold.tick_timers(dt);
                None
            }
            _ => None,
        };
        if let Some(ttl) = ttl {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                expired.push(entity.id);
            }
        }
    }
    for id in expired {
        world.despawn(id);
    }

    for effect in &mut world.effects {
        effect.ticks_left = effect.ticks_left.saturating_sub(1);
    }
    world.effects.retain(|e| e.ticks_left > 0);
}

/// Frame-rate independent driver around [`tick`]
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `frame_dt` covers (capped at [`MAX_SUBSTEPS`]).
    /// One-shot inputs only apply to the first tick. Returns ticks run.
    pub fn advance(&mut self, world: &mut World, input: &TickInput, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.min(0.1);

        let mut input = input.clone();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(world, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.pause = false;
            input.grab_toggle = false;
        }
        substeps
    }
}

impl World {
    /// One fixed tick
    pub fn step(&mut self, input: &TickInput) {
        tick(self, input, SIM_DT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::AsteroidType;
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn quiet_tuning() -> Tuning {
        Tuning {
            asteroid_spin_max: 0.0,
            ..Tuning::default()
        }
    }

    #[test]
    fn test_tick_pause() {
        let mut world = World::with_default_layout(12345, Tuning::default());
        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.phase, GamePhase::Paused);
        let ticks = world.time_ticks;

        // Nothing advances while paused
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.time_ticks, ticks);

        tick(&mut world, &input, SIM_DT);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.time_ticks, ticks + 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = World::with_default_layout(99999, Tuning::default());
        let mut b = World::with_default_layout(99999, Tuning::default());
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..300 {
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        let sa = serde_json::to_string(&a.snapshot()).unwrap();
        let sb = serde_json::to_string(&b.snapshot()).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_projectile_expires() {
        let mut world = World::new(1, quiet_tuning());
        let bullet = world.spawn_player_projectile(Vec2::new(0.0, 0.0), std::f32::consts::FRAC_PI_2);
        for _ in 0..899 {
            world.step(&TickInput::default());
        }
        assert!(world.get(bullet).is_some());
        world.step(&TickInput::default());
        assert!(world.get(bullet).is_none());
    }

    #[test]
    fn test_fire_aims_at_nearest_grabbable() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::ZERO);
        world.spawn_asteroid(AsteroidType::Small, Vec2::new(0.0, 900.0));
        world.spawn_asteroid(AsteroidType::Small, Vec2::new(-600.0, 0.0));
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        world.step(&input);
        let shots: Vec<_> = world
            .entities()
            .filter(|e| matches!(e.kind, EntityKind::Projectile(_)))
            .collect();
        assert_eq!(shots.len(), 1);
        assert!(shots[0].body.velocity.x < -499.0);

        // Held fire respects the cooldown
        for _ in 0..14 {
            world.step(&input);
        }
        assert_eq!(world.count_of("projectile"), 1);
        world.step(&input);
        assert_eq!(world.count_of("projectile"), 2);
    }

    #[test]
    fn test_fire_without_targets_is_skipped() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::ZERO);
        world.request_shoot();
        world.step(&TickInput::default());
        assert_eq!(world.count_of("projectile"), 0);
    }

    #[test]
    fn test_thrust_moves_player() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::ZERO);
        let input = TickInput {
            forward: true,
            target_angle: Some(0.0),
            ..Default::default()
        };
        for _ in 0..30 {
            world.step(&input);
        }
        let body = world.player_body().cloned().unwrap();
        assert!(body.position.x > 0.0);
        assert!(body.position.y.abs() < 1e-3);
        assert!(world.player().is_some_and(|p| p.thrusting));
    }

    #[test]
    fn test_set_player_intents_survives_step() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::ZERO);
        world.set_player_intents(PlayerIntents {
            forward: true,
            target_angle: Some(0.0),
            ..Default::default()
        });
        world.step(&TickInput::default());
        let velocity = world.player_body().map(|b| b.velocity).unwrap_or_default();
        assert!(velocity.x > 0.0);
        assert!(world.player().is_some_and(|p| p.thrusting));

        // Applies to one tick only
        world.step(&TickInput::default());
        assert!(world.player().is_some_and(|p| !p.thrusting));
    }

    #[test]
    fn test_huge_target_angle_does_not_stall() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::ZERO);
        for angle in [1.0e10, f32::INFINITY, f32::NAN] {
            world.step(&TickInput {
                target_angle: Some(angle),
                forward: true,
                ..Default::default()
            });
        }
        assert_eq!(world.time_ticks, 3);
        let body = world.player_body().cloned().unwrap();
        assert!(body.rotation.is_finite());
        assert!(body.position.is_finite());
    }

    #[test]
    fn test_walls_hold_player_in() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::new(WORLD_MAX_X - 60.0, 0.0));
        let input = TickInput {
            forward: true,
            boost: true,
            target_angle: Some(0.0),
            ..Default::default()
        };
        for _ in 0..120 {
            world.step(&input);
        }
        let x = world.player_body().map_or(0.0, |b| b.position.x);
        assert!(x <= WORLD_MAX_X - PLAYER_RADIUS + 1e-3);
    }

    #[test]
    fn test_docking_flag() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::new(0.0, 100.0));
        world.step(&TickInput::default());
        assert!(world.player().is_some_and(|p| p.docked));

        let mut far = World::new(1, quiet_tuning());
        far.spawn_player(Vec2::new(0.0, 900.0));
        far.step(&TickInput::default());
        assert!(far.player().is_some_and(|p| !p.docked));
    }

    #[test]
    fn test_grab_toggle_via_input_and_request() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::new(0.0, 1000.0));
        let rock = world.spawn_asteroid(AsteroidType::Small, Vec2::new(0.0, 1400.0));
        world.step(&TickInput {
            grab_toggle: true,
            ..Default::default()
        });
        assert_eq!(world.player().and_then(|p| p.grabbed), Some(rock));

        world.request_grab_toggle();
        world.step(&TickInput::default());
        assert_eq!(world.player().and_then(|p| p.grabbed), None);
    }

    #[test]
    fn test_grab_spring_pulls_target() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::new(0.0, 1000.0));
        let rock = world.spawn_asteroid(AsteroidType::Small, Vec2::new(0.0, 1400.0));
        assert!(world.grab(rock));
        let input = TickInput {
            forward: true,
            target_angle: Some(-std::f32::consts::FRAC_PI_2),
            ..Default::default()
        };
        for _ in 0..60 {
            world.step(&input);
        }
        let rock_y = world.get(rock).map_or(0.0, |e| e.body.position.y);
        assert!(rock_y < 1400.0);
    }

    #[test]
    fn test_hauled_asteroid_salvaged_at_depot() {
        let mut world = World::new(1, quiet_tuning());
        world.spawn_player(Vec2::new(0.0, 400.0));
        let rock = world.spawn_asteroid(AsteroidType::Small, Vec2::new(0.0, 120.0));
        assert!(world.grab(rock));
        world.step(&TickInput::default());
        assert!(world.get(rock).is_none());
        assert_eq!(world.player().map(|p| p.hold.total_value()), Some(10));
        assert!(world.drain_events().contains(&GameEvent::AsteroidSalvaged { id: rock }));
    }

    #[test]
    fn test_out_of_bounds_projectile_despawns() {
        let mut world = World::new(1, quiet_tuning());
        let bullet = world.spawn_player_projectile(Vec2::new(WORLD_MAX_X - 10.0, 0.0), 0.0);
        for _ in 0..40 {
            world.step(&TickInput::default());
        }
        assert!(world.get(bullet).is_none());
    }

    #[test]
    fn test_fixed_step_accumulates() {
        let mut world = World::new(1, quiet_tuning());
        let mut stepper = FixedStep::new();
        assert_eq!(stepper.advance(&mut world, &TickInput::default(), SIM_DT * 0.5), 0);
        assert_eq!(stepper.advance(&mut world, &TickInput::default(), SIM_DT * 0.6), 1);
        // Long frames are capped
        let ran = stepper.advance(&mut world, &TickInput::default(), 1.0);
        assert_eq!(ran, 6);
        assert_eq!(world.time_ticks, 7);
    }

    #[test]
    fn test_one_shot_pause_applies_once_per_frame() {
        let mut world = World::new(1, quiet_tuning());
        let mut stepper = FixedStep::new();
        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        stepper.advance(&mut world, &input, SIM_DT * 3.0);
        assert_eq!(world.phase, GamePhase::Paused);
    }
}
