//! Idle/demo mode AI
//!
//! Produces the same [`TickInput`] a human would. Priorities, in order: fly
//! home once the hold is full, chase loose orbs nearby, then shoot the
//! nearest asteroid.

use glam::Vec2;

use super::geom::angle_to;
use super::state::{EntityKind, World};
use super::tick::TickInput;

/// Head home with this many orbs aboard
const HAUL_THRESHOLD: usize = 12;
/// Loose orbs closer than this are worth a detour
const ORB_CHASE_RANGE: f32 = 600.0;
/// Engage asteroids inside this range
const FIRE_RANGE: f32 = 700.0;
/// Stop thrusting when this close to an asteroid
const STANDOFF: f32 = 300.0;

/// Decide this tick's controls for the player ship
pub fn autopilot_input(world: &World) -> TickInput {
    let mut input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let (Some(player), Some(body)) = (world.player(), world.player_body()) else {
        return input;
    };
    let pos = body.position;

    // Small oscillation so the ship doesn't fly perfectly straight lines
    let time_factor = world.time_ticks as f32 * 0.01;
    let wobble = time_factor.sin() * 0.1 + (time_factor * 0.7).sin() * 0.05;

    if player.hold.count() >= HAUL_THRESHOLD || (player.docked && !player.hold.is_empty()) {
        let home = world.depot.center;
        input.target_angle = Some(angle_to(pos, home));
        input.forward = !world.depot.overlaps(body);
        input.boost = pos.distance(home) > 2000.0;
        return input;
    }

    let nearest_orb = world
        .entities()
        .filter(|e| matches!(e.kind, EntityKind::Orb(_)))
        .map(|e| (e.body.position, e.body.position.distance(pos)))
        .filter(|(_, d)| *d < ORB_CHASE_RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((orb_pos, _)) = nearest_orb {
        input.target_angle = Some(angle_to(pos, orb_pos) + wobble);
        input.forward = true;
    } else if let Some((_, rock_pos)) = world.nearest_grabbable(pos) {
        let dist = rock_pos.distance(pos);
        input.target_angle = Some(angle_to(pos, rock_pos) + wobble);
        input.forward = dist > STANDOFF;
        input.fire = dist < FIRE_RANGE;
    } else {
        // Nothing left to do: drift back to the depot
        input.target_angle = Some(angle_to(pos, Vec2::ZERO));
        input.forward = !world.depot.overlaps(body);
    }

    input
}
