//! Target acquisition shared by drones, plus the drone entity itself

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use super::geom::{angle_to, distance};
use super::state::EntityId;
use crate::consts::DRONE_RADIUS;
use crate::tuning::Tuning;

/// Tick counter that fires once every `interval + 1` advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotTimer {
    pub elapsed: u32,
    pub interval: u32,
}

impl ShotTimer {
    pub fn new(interval: u32) -> Self {
        Self { elapsed: 0, interval }
    }

    /// Count one tick. Returns true (and restarts) once the interval is exceeded.
    pub fn advance(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed > self.interval {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
    }
}

/// Chase-and-shoot behavior: lock onto the nearest candidate, follow it and
/// fire on a fixed cadence while in range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Targeting {
    pub target: Option<EntityId>,
    pub acquire_range: f32,
    pub leash_range: f32,
    pub firing_range: f32,
    pub speed: f32,
    pub timer: ShotTimer,
}

impl Targeting {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            target: None,
            acquire_range: tuning.drone_acquire_range,
            leash_range: tuning.drone_leash_range,
            firing_range: tuning.drone_firing_range,
            speed: tuning.drone_speed,
            timer: ShotTimer::new(tuning.drone_shooting_interval),
        }
    }

    /// Steer `body` for one tick. `candidates` are the live targetable
    /// entities. Returns the position to shoot at when a shot is due.
    pub fn update(&mut self, body: &mut PhysicsBody, candidates: &[(EntityId, Vec2)]) -> Option<Vec2> {
        // Drop a target that died or wandered off
        if let Some(id) = self.target {
            let keep = candidates
                .iter()
                .find(|(cid, _)| *cid == id)
                .is_some_and(|(_, pos)| distance(body.position, *pos) <= self.leash_range);
            if !keep {
                log::debug!("Targeting dropped entity {}", id);
                self.target = None;
                self.timer.reset();
            }
        }

        if self.target.is_none() {
            self.target = candidates
                .iter()
                .map(|(id, pos)| (*id, distance(body.position, *pos)))
                .filter(|(_, d)| *d <= self.acquire_range)
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .map(|(id, _)| id);
        }

        let Some(id) = self.target else {
            body.velocity = Vec2::ZERO;
            return None;
        };
        let target_pos = candidates.iter().find(|(cid, _)| *cid == id).map(|(_, pos)| *pos)?;

        let offset = target_pos - body.position;
        body.velocity = offset.normalize_or_zero() * self.speed;
        body.rotation = angle_to(body.position, target_pos);

        if offset.length() <= self.firing_range && self.timer.advance() {
            Some(target_pos)
        } else {
            None
        }
    }
}

/// Autonomous helper ship that shoots asteroids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub targeting: Targeting,
}

impl Drone {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            targeting: Targeting::new(tuning),
        }
    }

    /// Drones only interact with each other
    pub fn body(position: Vec2) -> PhysicsBody {
        PhysicsBody::new(position, DRONE_RADIUS, 1.0).with_masks(
            Category::DRONE,
            Category::DRONE,
            Category::DRONE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_timer_cadence() {
        let mut timer = ShotTimer::new(40);
        let fired: Vec<u32> = (1..=100).filter(|_| timer.advance()).collect();
        assert_eq!(fired.len(), 2);

        let mut timer = ShotTimer::new(2);
        assert!(!timer.advance());
        assert!(!timer.advance());
        assert!(timer.advance());
        assert_eq!(timer.elapsed, 0);
    }

    #[test]
    fn test_acquires_nearest_in_range() {
        let tuning = Tuning::default();
        let mut targeting = Targeting::new(&tuning);
        let mut body = Drone::body(Vec2::ZERO);
        let candidates = [
            (7, Vec2::new(350.0, 0.0)),
            (3, Vec2::new(0.0, 200.0)),
            (9, Vec2::new(1000.0, 0.0)),
        ];
        targeting.update(&mut body, &candidates);
        assert_eq!(targeting.target, Some(3));
        assert!((body.velocity - Vec2::new(0.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_nothing_in_range() {
        let tuning = Tuning::default();
        let mut targeting = Targeting::new(&tuning);
        let mut body = Drone::body(Vec2::ZERO).with_velocity(Vec2::X);
        assert_eq!(targeting.update(&mut body, &[(1, Vec2::new(900.0, 0.0))]), None);
        assert_eq!(targeting.target, None);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_drops_dead_or_distant_target() {
        let tuning = Tuning::default();
        let mut targeting = Targeting::new(&tuning);
        let mut body = Drone::body(Vec2::ZERO);
        targeting.update(&mut body, &[(1, Vec2::new(100.0, 0.0))]);
        assert_eq!(targeting.target, Some(1));

        // Target gone
        targeting.update(&mut body, &[]);
        assert_eq!(targeting.target, None);

        targeting.update(&mut body, &[(2, Vec2::new(300.0, 0.0))]);
        assert_eq!(targeting.target, Some(2));
        // Beyond the leash, and nothing else close enough to acquire
        targeting.update(&mut body, &[(2, Vec2::new(700.0, 0.0))]);
        assert_eq!(targeting.target, None);
    }

    #[test]
    fn test_fires_on_cadence_in_range() {
        let tuning = Tuning::default();
        let mut targeting = Targeting::new(&tuning);
        let mut body = Drone::body(Vec2::ZERO);
        let candidates = [(4, Vec2::new(100.0, 0.0))];
        let shots = (0..=tuning.drone_shooting_interval)
            .filter_map(|_| targeting.update(&mut body, &candidates))
            .count();
        assert_eq!(shots, 1);
    }
}
