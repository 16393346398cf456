//! Bullets fired by the player, drones and enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use super::geom::direction;
use crate::consts::{ENEMY_BULLET_RADIUS, PLAYER_BULLET_RADIUS};
use crate::tuning::Tuning;

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// A bullet in flight. Velocity is fixed at spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub faction: Faction,
    /// Ticks until the bullet expires
    pub ttl_ticks: u32,
}

impl Projectile {
    /// Player-side bullet heading along `angle`
    pub fn player_shot(origin: Vec2, angle: f32, tuning: &Tuning) -> (Projectile, PhysicsBody) {
        let velocity = direction(angle) * tuning.player_bullet_speed;
        let body = PhysicsBody::new(origin, PLAYER_BULLET_RADIUS, 1.0001)
            .with_velocity(velocity)
            .with_masks(Category::PROJECTILE, Category::ENEMY, Category::ENEMY);
        let projectile = Projectile {
            faction: Faction::Player,
            ttl_ticks: tuning.player_bullet_ticks(),
        };
        (projectile, body)
    }

    /// Enemy bullet aimed at `target`
    pub fn enemy_shot(origin: Vec2, target: Vec2, tuning: &Tuning) -> (Projectile, PhysicsBody) {
        let velocity = (target - origin).normalize_or_zero() * tuning.enemy_bullet_speed;
        let body = PhysicsBody::new(origin, ENEMY_BULLET_RADIUS, 1.0)
            .with_velocity(velocity)
            .with_masks(Category::ENEMY_PROJECTILE, Category::PLAYER, Category::PLAYER);
        let projectile = Projectile {
            faction: Faction::Enemy,
            ttl_ticks: tuning.enemy_bullet_ticks(),
        };
        (projectile, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_shot_velocity() {
        let tuning = Tuning::default();
        let (shot, body) = Projectile::player_shot(Vec2::ZERO, 0.0, &tuning);
        assert_eq!(shot.faction, Faction::Player);
        assert_eq!(shot.ttl_ticks, 900);
        assert!((body.velocity - Vec2::new(500.0, 0.0)).length() < 1e-3);
        assert_eq!(body.linear_damping, 0.0);
    }

    #[test]
    fn test_enemy_shot_aims_at_target() {
        let tuning = Tuning::default();
        let (shot, body) = Projectile::enemy_shot(Vec2::ZERO, Vec2::new(0.0, -10.0), &tuning);
        assert_eq!(shot.faction, Faction::Enemy);
        assert_eq!(shot.ttl_ticks, 300);
        assert!((body.velocity - Vec2::new(0.0, -500.0)).length() < 1e-3);
        assert!(body.category.intersects(Category::ENEMY_PROJECTILE));
    }
}
