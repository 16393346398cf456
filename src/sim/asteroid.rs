//! Asteroids and their fragmentation
//!
//! An asteroid is alive until its health runs out. Dying breaks anything
//! bigger than a small rock into two small rocks, and every asteroid sheds a
//! burst of experience orbs.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use super::cargo::{Orb, OrbSize};
use super::state::{Commands, Damageable, EntityKind};
use crate::tuning::Tuning;

/// Asteroid size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidType {
    Small,
    Medium,
    Large,
    SuperLarge,
}

impl AsteroidType {
    pub const ALL: [AsteroidType; 4] = [
        AsteroidType::Small,
        AsteroidType::Medium,
        AsteroidType::Large,
        AsteroidType::SuperLarge,
    ];

    /// Inclusive sprite size range
    pub fn size_range(self) -> (f32, f32) {
        match self {
            AsteroidType::Small => (75.0, 200.0),
            AsteroidType::Medium => (175.0, 275.0),
            AsteroidType::Large => (250.0, 325.0),
            AsteroidType::SuperLarge => (500.0, 700.0),
        }
    }

    /// Health at spawn
    pub fn base_health(self) -> i32 {
        match self {
            AsteroidType::Small => 5,
            AsteroidType::Medium => 10,
            AsteroidType::Large => 15,
            AsteroidType::SuperLarge => 25,
        }
    }

    /// Inclusive upper bound of the orb burst (`bound + 1` orbs drop)
    pub fn orb_upper_bound(self) -> u32 {
        match self {
            AsteroidType::Small => 5,
            AsteroidType::Medium => 10,
            AsteroidType::Large => 15,
            AsteroidType::SuperLarge => 25,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub kind: AsteroidType,
    pub health: i32,
    /// Sprite width; the collision radius is half of this
    pub size: f32,
}

impl Asteroid {
    pub fn new(kind: AsteroidType, rng: &mut impl Rng) -> Self {
        let (lower, upper) = kind.size_range();
        Self {
            kind,
            health: kind.base_health(),
            size: rng.random_range(lower..=upper),
        }
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// Physics body with a random spin
    pub fn body(&self, position: Vec2, rng: &mut impl Rng, tuning: &Tuning) -> PhysicsBody {
        let mut body = PhysicsBody::new(position, self.radius(), tuning.asteroid_mass).with_masks(
            Category::ENEMY,
            Category::ENEMY | Category::PLAYER | Category::WALL,
            Category::NONE,
        );
        if tuning.asteroid_spin_max > 0.0 {
            body.angular_velocity = rng.random_range(-tuning.asteroid_spin_max..=tuning.asteroid_spin_max);
        }
        body
    }

    /// Queue the debris of a dead asteroid at `position`
    pub fn fragment(&self, position: Vec2, rng: &mut impl Rng, tuning: &Tuning, commands: &mut Commands) {
        if self.kind != AsteroidType::Small {
            for _ in 0..2 {
                let velocity = scatter(rng, tuning) * tuning.scatter_speed;
                let child = Asteroid::new(AsteroidType::Small, rng);
                let body = child.body(position, rng, tuning).with_velocity(velocity);
                commands.spawn(body, EntityKind::Asteroid(child));
            }
        }

        for _ in 0..=self.kind.orb_upper_bound() {
            let size = OrbSize::random(rng);
            let offset = scatter(rng, tuning);
            let orb = Orb::new(size, tuning);
            let body = orb.body(position + offset, offset * tuning.scatter_speed, tuning);
            commands.spawn(body, EntityKind::Orb(orb));
        }
    }
}

/// Random offset in [-scatter, scatter] on each axis
fn scatter(rng: &mut impl Rng, tuning: &Tuning) -> Vec2 {
    let s = tuning.scatter_offset;
    if s <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(rng.random_range(-s..=s), rng.random_range(-s..=s))
}

impl Damageable for Asteroid {
    fn health(&self) -> i32 {
        self.health
    }

    fn health_mut(&mut self) -> &mut i32 {
        &mut self.health
    }

    /// Asteroids cannot be healed
    fn heal(&mut self, _amount: i32) {}

    /// Takes one extra point before checking the threshold again
    fn death(&mut self) -> bool {
        self.health -= 1;
        self.health <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn count_kinds(commands: &Commands) -> (usize, usize) {
        let rocks = commands
            .spawns
            .iter()
            .filter(|s| matches!(s.kind, EntityKind::Asteroid(_)))
            .count();
        let orbs = commands
            .spawns
            .iter()
            .filter(|s| matches!(s.kind, EntityKind::Orb(_)))
            .count();
        (rocks, orbs)
    }

    #[test]
    fn test_spawn_table() {
        let mut rng = Pcg32::seed_from_u64(42);
        for kind in AsteroidType::ALL {
            for _ in 0..50 {
                let rock = Asteroid::new(kind, &mut rng);
                let (lo, hi) = kind.size_range();
                assert!(rock.size >= lo && rock.size <= hi);
                assert_eq!(rock.health, kind.base_health());
            }
        }
    }

    #[test]
    fn test_fragment_large_types() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        for kind in [AsteroidType::Medium, AsteroidType::Large, AsteroidType::SuperLarge] {
            let mut commands = Commands::default();
            let rock = Asteroid::new(kind, &mut rng);
            rock.fragment(Vec2::new(10.0, 20.0), &mut rng, &tuning, &mut commands);
            let (rocks, orbs) = count_kinds(&commands);
            assert_eq!(rocks, 2);
            assert_eq!(orbs, kind.orb_upper_bound() as usize + 1);

            for spawn in &commands.spawns {
                if let EntityKind::Asteroid(child) = &spawn.kind {
                    assert_eq!(child.kind, AsteroidType::Small);
                    assert_eq!(spawn.body.position, Vec2::new(10.0, 20.0));
                    assert!(spawn.body.velocity.x.abs() <= 150.0);
                    assert!(spawn.body.velocity.y.abs() <= 150.0);
                }
            }
        }
    }

    #[test]
    fn test_fragment_small() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut commands = Commands::default();
        let rock = Asteroid::new(AsteroidType::Small, &mut rng);
        rock.fragment(Vec2::ZERO, &mut rng, &tuning, &mut commands);
        assert_eq!(count_kinds(&commands), (0, 6));
    }

    #[test]
    fn test_damage_triggers_death() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut rock = Asteroid::new(AsteroidType::Small, &mut rng);
        for _ in 0..4 {
            assert!(!rock.take_damage(1));
        }
        assert_eq!(rock.health, 1);
        assert!(rock.take_damage(1));
        // Death takes one extra point past zero
        assert_eq!(rock.health, -1);
    }

    #[test]
    fn test_heal_is_noop() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut rock = Asteroid::new(AsteroidType::Medium, &mut rng);
        rock.take_damage(3);
        rock.heal(3);
        assert_eq!(rock.health, 7);
    }
}
