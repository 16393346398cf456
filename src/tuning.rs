//! Data-driven game constants
//!
//! [`Tuning`] mirrors every design constant the simulation reads. The
//! defaults are the shipped values; a JSON document can override any subset
//! (missing keys keep their defaults).

use serde::{Deserialize, Serialize};

use crate::error::{TuningResult, require_non_negative, require_positive};

/// Runtime-readable gameplay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Player
    pub player_health: i32,
    pub player_base_mass: f32,
    pub player_linear_damping: f32,
    pub thrust_modifier: f32,
    pub boost_multiplier: f32,
    pub reverse_thrust: f32,
    pub shoot_wait_ticks: u32,
    pub deposit_wait_ticks: i32,
    pub player_bullet_speed: f32,
    pub player_bullet_lifetime_secs: f32,
    /// Held cargo mass is divided by this before being added to the ship
    pub cargo_mass_divisor: f32,

    // Orb attraction field (around the player)
    pub orb_field_strength: f32,
    pub orb_field_scale: f32,
    pub orb_field_radius: f32,

    // Orbs
    pub orb_lifetime_secs: f32,
    pub orb_cargo_mass: f32,
    pub orb_restitution: f32,
    /// Fragments and orbs scatter by an offset in [-scatter, scatter]
    pub scatter_offset: f32,
    /// Scatter velocity = offset * this
    pub scatter_speed: f32,

    // Asteroids
    pub asteroid_mass: f32,
    pub asteroid_spin_max: f32,

    // Enemy
    pub enemy_health: i32,
    pub enemy_max_speed: f32,
    pub enemy_detect_range: f32,
    pub enemy_firing_range: f32,
    pub enemy_leash_range: f32,
    pub enemy_circling_radius: f32,
    pub enemy_radial_gain: f32,
    pub enemy_tangential_gain: f32,
    pub enemy_angular_speed: f32,
    pub enemy_shooting_interval: u32,
    pub enemy_bullet_speed: f32,
    pub enemy_bullet_lifetime_secs: f32,
    pub enemy_linear_damping: f32,

    // Drone
    pub drone_acquire_range: f32,
    pub drone_leash_range: f32,
    pub drone_firing_range: f32,
    pub drone_speed: f32,
    pub drone_shooting_interval: u32,

    // Cargo hold
    pub hold_gravity: f32,
    pub hold_insert_x: f32,
    pub hold_insert_y: f32,
    pub hold_jitter: f32,
    pub deposit_animation_ticks: u32,
    pub held_orb_fade_secs: f32,
    pub deposit_label_secs: f32,

    // Effects
    pub hit_effect_secs: f32,
    pub hit_flash_ticks: u32,

    // Collision
    pub contact_slop: f32,
    pub out_of_bounds_margin: f32,

    // Grab spring
    pub grab_frequency: f32,
    pub grab_damping: f32,

    // Layout
    pub initial_asteroids: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_health: 10,
            player_base_mass: 1.0,
            player_linear_damping: 1.0,
            thrust_modifier: 5.0,
            boost_multiplier: 2.0,
            reverse_thrust: 1.0,
            shoot_wait_ticks: 15,
            deposit_wait_ticks: 7,
            player_bullet_speed: 500.0,
            player_bullet_lifetime_secs: 15.0,
            cargo_mass_divisor: 10.0,

            orb_field_strength: 5.0,
            orb_field_scale: 150.0,
            orb_field_radius: 600.0,

            orb_lifetime_secs: 15.0,
            orb_cargo_mass: 0.1,
            orb_restitution: 0.7,
            scatter_offset: 15.0,
            scatter_speed: 10.0,

            asteroid_mass: 1.0,
            asteroid_spin_max: 1.0,

            enemy_health: 5,
            enemy_max_speed: 100.0,
            enemy_detect_range: 400.0,
            enemy_firing_range: 300.0,
            enemy_leash_range: 600.0,
            enemy_circling_radius: 200.0,
            enemy_radial_gain: 0.002,
            enemy_tangential_gain: 0.05,
            enemy_angular_speed: 1.5,
            enemy_shooting_interval: 40,
            enemy_bullet_speed: 500.0,
            enemy_bullet_lifetime_secs: 5.0,
            enemy_linear_damping: 0.5,

            drone_acquire_range: 400.0,
            drone_leash_range: 600.0,
            drone_firing_range: 300.0,
            drone_speed: 100.0,
            drone_shooting_interval: 120,

            hold_gravity: 600.0,
            hold_insert_x: 25.0,
            hold_insert_y: 200.0,
            hold_jitter: 2.0,
            deposit_animation_ticks: 4,
            held_orb_fade_secs: 2.0,
            deposit_label_secs: 4.0,

            hit_effect_secs: 0.2,
            hit_flash_ticks: 6,

            contact_slop: 0.5,
            out_of_bounds_margin: 200.0,

            grab_frequency: 1.0,
            grab_damping: 0.0,

            initial_asteroids: 100,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate the result
    pub fn from_json(json: &str) -> TuningResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    /// Check every value the simulation relies on being in range
    pub fn validate(&self) -> TuningResult<()> {
        require_positive("player_base_mass", self.player_base_mass)?;
        require_positive("asteroid_mass", self.asteroid_mass)?;
        require_positive("orb_cargo_mass", self.orb_cargo_mass)?;
        require_positive("cargo_mass_divisor", self.cargo_mass_divisor)?;
        require_positive("player_bullet_speed", self.player_bullet_speed)?;
        require_positive("enemy_bullet_speed", self.enemy_bullet_speed)?;
        require_positive("enemy_max_speed", self.enemy_max_speed)?;
        require_positive("drone_speed", self.drone_speed)?;
        require_positive("grab_frequency", self.grab_frequency)?;
        require_positive("player_health", self.player_health as f32)?;
        require_positive("enemy_health", self.enemy_health as f32)?;
        require_non_negative("player_linear_damping", self.player_linear_damping)?;
        require_non_negative("enemy_linear_damping", self.enemy_linear_damping)?;
        require_non_negative("grab_damping", self.grab_damping)?;
        require_non_negative("contact_slop", self.contact_slop)?;
        require_non_negative("hold_jitter", self.hold_jitter)?;
        require_non_negative("scatter_offset", self.scatter_offset)?;
        Ok(())
    }

    /// Player bullet lifetime in ticks
    pub fn player_bullet_ticks(&self) -> u32 {
        crate::secs_to_ticks(self.player_bullet_lifetime_secs)
    }

    /// Enemy bullet lifetime in ticks
    pub fn enemy_bullet_ticks(&self) -> u32 {
        crate::secs_to_ticks(self.enemy_bullet_lifetime_secs)
    }

    /// Loose orb lifetime in ticks
    pub fn orb_lifetime_ticks(&self) -> u32 {
        crate::secs_to_ticks(self.orb_lifetime_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TuningError;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "enemy_max_speed": 150.0, "shoot_wait_ticks": 5 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.enemy_max_speed, 150.0);
        assert_eq!(tuning.shoot_wait_ticks, 5);
        // Untouched keys keep defaults
        assert_eq!(tuning.enemy_firing_range, 300.0);
    }

    #[test]
    fn test_rejects_zero_mass() {
        let err = Tuning::from_json(r#"{ "player_base_mass": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "player_base_mass",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_lifetime_ticks() {
        let tuning = Tuning::default();
        assert_eq!(tuning.player_bullet_ticks(), 900);
        assert_eq!(tuning.enemy_bullet_ticks(), 300);
        assert_eq!(tuning.orb_lifetime_ticks(), 900);
    }
}
