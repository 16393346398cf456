//! Star Hauler - An open-world space hauling arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, entity behavior)
//! - `tuning`: Data-driven game constants
//! - `error`: Configuration errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{TuningError, TuningResult};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, cooldowns are counted in these ticks)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Simulation ticks per second
    pub const TICKS_PER_SECOND: u32 = 60;

    /// World bounds (walls)
    pub const WORLD_MIN_X: f32 = -1000.0;
    pub const WORLD_MAX_X: f32 = 1000.0;
    pub const WORLD_MIN_Y: f32 = -1000.0;
    pub const WORLD_MAX_Y: f32 = 20000.0;

    /// Depot (drop-off area) centered at the origin
    pub const DEPOT_HALF_EXTENT: f32 = 150.0;

    /// Collision circle radii
    pub const PLAYER_RADIUS: f32 = 50.0;
    pub const ENEMY_RADIUS: f32 = 75.0;
    pub const DRONE_RADIUS: f32 = 25.0;
    pub const PLAYER_BULLET_RADIUS: f32 = 10.0;
    pub const ENEMY_BULLET_RADIUS: f32 = 5.0;
}

/// Convert seconds to whole simulation ticks
#[inline]
pub fn secs_to_ticks(secs: f32) -> u32 {
    (secs * consts::TICKS_PER_SECOND as f32).round() as u32
}

/// Normalized angle to [-π, π). Non-finite input comes back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to exactly TAU
    if wrapped >= PI { -PI } else { wrapped }
}
