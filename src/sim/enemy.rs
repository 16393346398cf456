//! Enemy ships
//!
//! Enemies idle until the player comes close, chase it down and then orbit
//! it at a fixed radius while firing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use super::drone::ShotTimer;
use super::geom::{angle_to, clamp_length, heading};
use super::projectile::Projectile;
use super::state::{Commands, Damageable, EntityId, EntityKind};
use crate::consts::ENEMY_RADIUS;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    Idle,
    Approaching,
    Circling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub state: EnemyState,
    pub health: i32,
    /// Weak handle to the player; resolved by the world every tick
    pub target: Option<EntityId>,
    pub timer: ShotTimer,
}

impl Enemy {
    pub fn new(target: Option<EntityId>, tuning: &Tuning) -> Self {
        Self {
            state: EnemyState::Idle,
            health: tuning.enemy_health,
            target,
            timer: ShotTimer::new(tuning.enemy_shooting_interval),
        }
    }

    pub fn body(position: Vec2, tuning: &Tuning) -> PhysicsBody {
        PhysicsBody::new(position, ENEMY_RADIUS, 1.0)
            .with_damping(tuning.enemy_linear_damping)
            .with_masks(
                Category::ENEMY,
                Category::PLAYER | Category::WALL,
                Category::PLAYER | Category::PROJECTILE,
            )
    }

    /// Run one tick of the state machine. `player` is the resolved target
    /// position, or `None` when the target no longer exists.
    pub fn update(
        &mut self,
        body: &mut PhysicsBody,
        player: Option<Vec2>,
        tuning: &Tuning,
        commands: &mut Commands,
    ) {
        let Some(player_pos) = player else {
            self.state = EnemyState::Idle;
            return;
        };
        let dist = body.position.distance(player_pos);

        match self.state {
            EnemyState::Idle => {
                if dist < tuning.enemy_detect_range {
                    log::debug!("Enemy spotted player at distance {:.1}", dist);
                    self.state = EnemyState::Approaching;
                }
            }
            EnemyState::Approaching => {
                self.move_towards(body, player_pos, tuning);
                if dist < tuning.enemy_firing_range {
                    self.state = EnemyState::Circling;
                } else if dist >= tuning.enemy_leash_range {
                    self.state = EnemyState::Idle;
                }
            }
            EnemyState::Circling => {
                self.circle_around(body, player_pos, tuning);
                if self.timer.advance() {
                    self.shoot_at(body.position, player_pos, tuning, commands);
                }
                if dist >= tuning.enemy_detect_range {
                    self.state = EnemyState::Approaching;
                }
            }
        }
    }

    fn move_towards(&self, body: &mut PhysicsBody, player_pos: Vec2, tuning: &Tuning) {
        let dir = (player_pos - body.position).normalize_or_zero();
        body.velocity = dir * tuning.enemy_max_speed;
        body.rotation = angle_to(body.position, player_pos);
    }

    fn circle_around(&self, body: &mut PhysicsBody, player_pos: Vec2, tuning: &Tuning) {
        let radial = body.position - player_pos;
        let error = tuning.enemy_circling_radius - radial.length();
        // Unnormalized radial, so the correction scales with distance
        let radial_adjust = radial * error * tuning.enemy_radial_gain;

        let tangent = Vec2::new(-radial.y, radial.x).normalize_or_zero();
        let desired = tangent * tuning.enemy_angular_speed * tuning.enemy_circling_radius;
        let velocity_adjust = (desired - body.velocity) * tuning.enemy_tangential_gain;

        body.velocity = clamp_length(body.velocity + velocity_adjust + radial_adjust, tuning.enemy_max_speed);
        if let Some(angle) = heading(body.velocity) {
            body.rotation = angle;
        }
    }

    fn shoot_at(&self, origin: Vec2, target: Vec2, tuning: &Tuning, commands: &mut Commands) {
        let (projectile, body) = Projectile::enemy_shot(origin, target, tuning);
        commands.spawn(body, EntityKind::Projectile(projectile));
    }
}

impl Damageable for Enemy {
    fn health(&self) -> i32 {
        self.health
    }

    fn health_mut(&mut self) -> &mut i32 {
        &mut self.health
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(enemy_pos: Vec2) -> (Enemy, PhysicsBody, Tuning, Commands) {
        let tuning = Tuning::default();
        (
            Enemy::new(Some(1), &tuning),
            Enemy::body(enemy_pos, &tuning),
            tuning,
            Commands::default(),
        )
    }

    #[test]
    fn test_idle_until_player_close() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(0.0, 500.0));
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Idle);

        body.position = Vec2::new(0.0, 350.0);
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Approaching);
    }

    #[test]
    fn test_approach_moves_at_max_speed() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(0.0, 350.0));
        enemy.state = EnemyState::Approaching;
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert!((body.velocity - Vec2::new(0.0, -100.0)).length() < 1e-3);
        assert!((body.rotation + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(enemy.state, EnemyState::Approaching);

        body.position = Vec2::new(0.0, 250.0);
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Circling);
    }

    #[test]
    fn test_approach_gives_up_when_far() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(0.0, 650.0));
        enemy.state = EnemyState::Approaching;
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Idle);
    }

    #[test]
    fn test_circling_fires_on_interval() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(200.0, 0.0));
        enemy.state = EnemyState::Circling;
        for _ in 0..tuning.enemy_shooting_interval {
            enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        }
        assert!(cmds.spawns.is_empty());
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(cmds.spawns.len(), 1);
        assert!(matches!(cmds.spawns[0].kind, EntityKind::Projectile(_)));
        assert!(body.velocity.length() <= tuning.enemy_max_speed + 1e-3);
    }

    #[test]
    fn test_circling_breaks_off_when_player_leaves() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(450.0, 0.0));
        enemy.state = EnemyState::Circling;
        enemy.update(&mut body, Some(Vec2::ZERO), &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Approaching);
    }

    #[test]
    fn test_missing_player_means_idle() {
        let (mut enemy, mut body, tuning, mut cmds) = setup(Vec2::new(10.0, 0.0));
        enemy.state = EnemyState::Circling;
        body.velocity = Vec2::new(5.0, 5.0);
        enemy.update(&mut body, None, &tuning, &mut cmds);
        assert_eq!(enemy.state, EnemyState::Idle);
        assert_eq!(body.velocity, Vec2::new(5.0, 5.0));
        assert!(cmds.spawns.is_empty());
    }

    #[test]
    fn test_damage_and_heal() {
        let tuning = Tuning::default();
        let mut enemy = Enemy::new(None, &tuning);
        enemy.heal(2);
        assert_eq!(enemy.health, 7);
        assert!(!enemy.take_damage(6));
        assert!(enemy.take_damage(1));
    }
}
