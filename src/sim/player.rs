//! The player's ship

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use super::cargo::{CargoHold, Orb};
use super::geom::direction;
use super::projectile::{Faction, Projectile};
use super::state::{Commands, Damageable, EntityId, EntityKind, GameEvent};
use crate::consts::PLAYER_RADIUS;
use crate::tuning::Tuning;

/// Held movement controls, sampled every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerIntents {
    pub forward: bool,
    pub backward: bool,
    pub boost: bool,
    /// Desired facing; `None` keeps the current rotation
    pub target_angle: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub health: i32,
    experience: u64,
    pub intents: PlayerIntents,
    /// Thrust visual flag
    pub thrusting: bool,
    /// Overlapping the depot this tick
    pub docked: bool,
    pub shoot_cooldown: u32,
    /// Counts down to -1 while waiting and is reset on every deposit attempt
    pub deposit_cooldown: i32,
    pub grabbed: Option<EntityId>,
    pub hold: CargoHold,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            health: tuning.player_health,
            experience: 0,
            intents: PlayerIntents::default(),
            thrusting: false,
            docked: false,
            shoot_cooldown: 0,
            deposit_cooldown: 0,
            grabbed: None,
            hold: CargoHold::new(),
        }
    }

    pub fn body(position: Vec2, tuning: &Tuning) -> PhysicsBody {
        PhysicsBody::new(position, PLAYER_RADIUS, tuning.player_base_mass)
            .with_damping(tuning.player_linear_damping)
            .with_masks(
                Category::PLAYER,
                Category::ENEMY | Category::WALL,
                Category::ORB | Category::ENEMY_PROJECTILE,
            )
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn reset_experience(&mut self) {
        self.experience = 0;
    }

    /// Apply intents, run the deposit cadence and count down the gun
    pub fn update(
        &mut self,
        body: &mut PhysicsBody,
        rng: &mut impl Rng,
        tuning: &Tuning,
        commands: &mut Commands,
    ) {
        // Non-finite targets keep the current facing
        if let Some(angle) = self.intents.target_angle.filter(|a| a.is_finite()) {
            body.rotation = crate::normalize_angle(angle);
        }
        let facing = direction(body.rotation);

        if self.intents.forward {
            let boost = if self.intents.boost { tuning.boost_multiplier } else { 1.0 };
            body.apply_impulse(facing * tuning.thrust_modifier * boost);
            self.thrusting = true;
        } else {
            self.thrusting = false;
        }

        if self.intents.backward {
            body.apply_impulse(-facing * tuning.reverse_thrust);
        }

        if self.docked && self.deposit_cooldown <= 0 {
            self.deposit_cooldown = tuning.deposit_wait_ticks;
            let value = self.hold.deposit(rng, tuning);
            if value > 0 {
                self.experience += u64::from(value);
                commands.event(GameEvent::Deposited {
                    value,
                    experience: self.experience,
                });
            }
            self.recompute_mass(body, tuning);
        } else {
            self.deposit_cooldown = (self.deposit_cooldown - 1).max(-1);
        }

        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
    }

    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown == 0
    }

    /// Fire along `angle` from `origin`. Returns false while reloading.
    pub fn shoot(&mut self, origin: Vec2, angle: f32, tuning: &Tuning, commands: &mut Commands) -> bool {
        if !self.can_shoot() {
            return false;
        }
        self.shoot_cooldown = tuning.shoot_wait_ticks;
        let (projectile, body) = Projectile::player_shot(origin, angle, tuning);
        commands.spawn(body, EntityKind::Projectile(projectile));
        commands.event(GameEvent::ShotFired {
            faction: Faction::Player,
        });
        true
    }

    /// Stow collected items and make the ship heavier
    pub fn add_to_cargo(&mut self, body: &mut PhysicsBody, items: &[Orb], rng: &mut impl Rng, tuning: &Tuning) {
        for item in items {
            self.hold.insert(item, rng, tuning);
        }
        self.recompute_mass(body, tuning);
    }

    /// Ship mass = base + held cargo mass / divisor
    pub fn recompute_mass(&self, body: &mut PhysicsBody, tuning: &Tuning) {
        body.set_mass(tuning.player_base_mass + self.hold.total_mass() / tuning.cargo_mass_divisor);
    }
}

impl Damageable for Player {
    fn health(&self) -> i32 {
        self.health
    }

    fn health_mut(&mut self) -> &mut i32 {
        &mut self.health
    }
}
