//! Experience orbs and the player's cargo hold
//!
//! Loose orbs float in the world until the player touches them. Collected
//! orbs become [`HeldOrb`]s inside the [`CargoHold`], a small box with its own
//! local coordinates and gravity where orbs pile up. Depositing always takes
//! the orb physically at the bottom of the pile.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::{Category, PhysicsBody};
use crate::tuning::Tuning;

/// Something that can be carried and cashed in
pub trait Cargoable {
    /// Experience awarded on deposit
    fn value(&self) -> u32;
    /// Mass contributed to the carrier
    fn mass(&self) -> f32;
}

/// Orb sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrbSize {
    Small,
    Medium,
    Large,
    Mega,
}

impl OrbSize {
    pub const ALL: [OrbSize; 4] = [OrbSize::Small, OrbSize::Medium, OrbSize::Large, OrbSize::Mega];

    pub fn value(self) -> u32 {
        match self {
            OrbSize::Small => 1,
            OrbSize::Medium => 5,
            OrbSize::Large => 10,
            OrbSize::Mega => 50,
        }
    }

    /// Collision radius (half the sprite width)
    pub fn radius(self) -> f32 {
        match self {
            OrbSize::Small => 10.0,
            OrbSize::Medium => 15.0,
            OrbSize::Large => 20.0,
            OrbSize::Mega => 40.0,
        }
    }

    /// Uniformly random size
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A loose orb in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub size: OrbSize,
    /// Ticks until the orb evaporates
    pub ttl_ticks: u32,
    mass: f32,
}

impl Orb {
    pub fn new(size: OrbSize, tuning: &Tuning) -> Self {
        Self {
            size,
            ttl_ticks: tuning.orb_lifetime_ticks(),
            mass: tuning.orb_cargo_mass,
        }
    }

    /// Physics body for a loose orb
    pub fn body(&self, position: Vec2, velocity: Vec2, tuning: &Tuning) -> PhysicsBody {
        let mut body = PhysicsBody::new(position, self.size.radius(), self.mass)
            .with_velocity(velocity)
            .with_masks(
                Category::ORB,
                Category::PLAYER | Category::WALL | Category::ENEMY,
                Category::PLAYER,
            );
        body.restitution = tuning.orb_restitution;
        body.affected_by_fields = true;
        body
    }
}

impl Cargoable for Orb {
    fn value(&self) -> u32 {
        self.size.value()
    }

    fn mass(&self) -> f32 {
        self.mass
    }
}

/// Hold geometry (local coordinates)
pub const HOLD_HALF_WIDTH: f32 = 80.0;
pub const HOLD_FLOOR_Y: f32 = -75.0;
pub const HOLD_WALL_THICKNESS: f32 = 5.0;
pub const CATCHER_Y: f32 = -100.0;
pub const CATCHER_HALF_WIDTH: f32 = 500.0;
/// Separation passes per step when settling the pile
const SETTLE_ITERATIONS: usize = 4;
/// Floating "+value" label rise speed
const LABEL_RISE_SPEED: f32 = 27.0;

/// An orb resting in the cargo hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldOrb {
    /// Hold-local id (never reused within a hold)
    pub id: u32,
    pub size: OrbSize,
    pub pos: Vec2,
    pub vel: Vec2,
    mass: f32,
    /// Remaining fade ticks once the orb has touched the catcher
    pub fade_ticks: Option<u32>,
}

impl HeldOrb {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size.radius()
    }

    /// Opacity for rendering (1 = solid)
    pub fn alpha(&self, fade_total: u32) -> f32 {
        match self.fade_ticks {
            Some(left) if fade_total > 0 => left as f32 / fade_total as f32,
            Some(_) => 0.0,
            None => 1.0,
        }
    }
}

impl Cargoable for HeldOrb {
    fn value(&self) -> u32 {
        self.size.value()
    }

    fn mass(&self) -> f32 {
        self.mass
    }
}

/// Floating deposit label (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositLabel {
    pub value: u32,
    pub pos: Vec2,
    pub ticks_left: u32,
}

/// The player's cargo hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CargoHold {
    orbs: Vec<HeldOrb>,
    /// Ticks left in the current removal animation
    removing_ticks: u32,
    pub labels: Vec<DepositLabel>,
    next_id: u32,
}

impl CargoHold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of held orbs (fading ones included)
    pub fn count(&self) -> usize {
        self.orbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }

    pub fn orbs(&self) -> &[HeldOrb] {
        &self.orbs
    }

    /// Sum of held orb masses
    pub fn total_mass(&self) -> f32 {
        self.orbs.iter().map(|o| o.mass()).sum()
    }

    /// Sum of held orb values
    pub fn total_value(&self) -> u32 {
        self.orbs.iter().map(|o| o.value()).sum()
    }

    /// True while a deposit removal animation is running
    pub fn is_animating(&self) -> bool {
        self.removing_ticks > 0
    }

    /// Drop a fresh orb in at the insertion point. Returns its hold-local id.
    pub fn insert(&mut self, item: &Orb, rng: &mut impl Rng, tuning: &Tuning) -> u32 {
        let jitter = if tuning.hold_jitter > 0.0 {
            rng.random_range(-tuning.hold_jitter..=tuning.hold_jitter)
        } else {
            0.0
        };
        let id = self.next_id;
        self.next_id += 1;
        self.orbs.push(HeldOrb {
            id,
            size: item.size,
            pos: Vec2::new(tuning.hold_insert_x + jitter, tuning.hold_insert_y),
            vel: Vec2::ZERO,
            mass: item.mass(),
            fade_ticks: None,
        });
        id
    }

    /// Place an orb at an exact local position (tests and scripted scenes)
    pub fn insert_at(&mut self, size: OrbSize, pos: Vec2, mass: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.orbs.push(HeldOrb {
            id,
            size,
            pos,
            vel: Vec2::ZERO,
            mass,
            fade_ticks: None,
        });
        id
    }

    /// Remove the bottom-most orb and return its value.
    ///
    /// Returns 0 when the hold is empty or a removal is still animating.
    pub fn deposit(&mut self, rng: &mut impl Rng, tuning: &Tuning) -> u32 {
        if self.is_animating() || self.orbs.is_empty() {
            return 0;
        }

        let Some(index) = self.bottom_index() else {
            return 0;
        };
        let orb = self.orbs.remove(index);
        let value = orb.value();

        self.removing_ticks = tuning.deposit_animation_ticks;

        let offset = Vec2::new(rng.random_range(-15.0..=15.0), rng.random_range(-15.0..=15.0));
        self.labels.push(DepositLabel {
            value,
            pos: orb.pos + Vec2::new(0.0, 10.0) + offset,
            ticks_left: crate::secs_to_ticks(tuning.deposit_label_secs),
        });

        log::debug!("Deposited held orb {} ({:?}) for {}", orb.id, orb.size, value);
        value
    }

    /// Index of the orb with the lowest position (y, then x, then id)
    fn bottom_index(&self) -> Option<usize> {
        self.orbs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.pos
                    .y
                    .total_cmp(&b.pos.y)
                    .then(a.pos.x.total_cmp(&b.pos.x))
                    .then(a.id.cmp(&b.id))
            })
            .map(|(i, _)| i)
    }

    /// Let the pile fall and settle for one step
    pub fn step(&mut self, dt: f32, tuning: &Tuning) {
        for orb in &mut self.orbs {
            orb.vel.y -= tuning.hold_gravity * dt;
            orb.pos += orb.vel * dt;
        }

        let inner_half = HOLD_HALF_WIDTH - HOLD_WALL_THICKNESS / 2.0;
        let floor = HOLD_FLOOR_Y + HOLD_WALL_THICKNESS / 2.0;

        for _ in 0..SETTLE_ITERATIONS {
            for i in 0..self.orbs.len() {
                for j in (i + 1)..self.orbs.len() {
                    let (left, right) = self.orbs.split_at_mut(j);
                    let a = &mut left[i];
                    let b = &mut right[0];
                    let delta = b.pos - a.pos;
                    let min_dist = a.radius() + b.radius();
                    let dist = delta.length();
                    if dist >= min_dist {
                        continue;
                    }
                    let normal = if dist > 1e-4 { delta / dist } else { Vec2::Y };
                    let push = normal * ((min_dist - dist) * 0.5);
                    a.pos -= push;
                    b.pos += push;
                    // Resting on something: stop falling
                    if push.y > 0.0 {
                        b.vel.y = b.vel.y.max(0.0);
                    } else if push.y < 0.0 {
                        a.vel.y = a.vel.y.max(0.0);
                    }
                }
            }

            for orb in &mut self.orbs {
                let r = orb.radius();
                orb.pos.x = orb.pos.x.clamp(-inner_half + r, inner_half - r);
                if orb.pos.y - r < floor {
                    orb.pos.y = floor + r;
                    orb.vel.y = orb.vel.y.max(0.0);
                    orb.vel.x *= 0.9;
                }
            }
        }
    }

    /// Held orbs currently touching the catcher line
    pub fn catcher_contacts(&self) -> Vec<u32> {
        self.orbs
            .iter()
            .filter(|o| o.pos.x.abs() <= CATCHER_HALF_WIDTH + o.radius())
            .filter(|o| o.pos.y - o.radius() <= CATCHER_Y + HOLD_WALL_THICKNESS / 2.0)
            .map(|o| o.id)
            .collect()
    }

    /// Begin fading an orb out. No-op if it is already fading or gone.
    pub fn start_fade(&mut self, id: u32, ticks: u32) -> bool {
        match self.orbs.iter_mut().find(|o| o.id == id) {
            Some(orb) if orb.fade_ticks.is_none() => {
                orb.fade_ticks = Some(ticks);
                true
            }
            _ => false,
        }
    }

    /// Count down fades, labels and the removal animation
    pub fn tick_timers(&mut self, dt: f32) {
        self.removing_ticks = self.removing_ticks.saturating_sub(1);

        for orb in &mut self.orbs {
            if let Some(left) = orb.fade_ticks.as_mut() {
                *left = left.saturating_sub(1);
            }
        }
        let before = self.orbs.len();
        self.orbs.retain(|o| o.fade_ticks != Some(0));
        if self.orbs.len() != before {
            log::debug!("{} held orb(s) faded out of the hold", before - self.orbs.len());
        }

        for label in &mut self.labels {
            label.pos.y += LABEL_RISE_SPEED * dt;
            label.ticks_left = label.ticks_left.saturating_sub(1);
        }
        self.labels.retain(|l| l.ticks_left > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn orb(size: OrbSize) -> Orb {
        Orb::new(size, &Tuning::default())
    }

    #[test]
    fn test_orb_values() {
        assert_eq!(orb(OrbSize::Small).value(), 1);
        assert_eq!(orb(OrbSize::Medium).value(), 5);
        assert_eq!(orb(OrbSize::Large).value(), 10);
        assert_eq!(orb(OrbSize::Mega).value(), 50);
    }

    #[test]
    fn test_insert_point_has_jitter_bounds() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut hold = CargoHold::new();
        for _ in 0..20 {
            hold.insert(&orb(OrbSize::Small), &mut rng, &tuning);
        }
        for held in hold.orbs() {
            assert!((held.pos.x - 25.0).abs() <= 2.0);
            assert_eq!(held.pos.y, 200.0);
        }
        assert_eq!(hold.count(), 20);
    }

    #[test]
    fn test_deposit_takes_lowest_orb() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut hold = CargoHold::new();
        hold.insert_at(OrbSize::Small, Vec2::new(0.0, 50.0), 0.1);
        hold.insert_at(OrbSize::Mega, Vec2::new(0.0, -30.0), 0.1);
        hold.insert_at(OrbSize::Medium, Vec2::new(0.0, 10.0), 0.1);

        assert_eq!(hold.deposit(&mut rng, &tuning), 50);
        assert_eq!(hold.count(), 2);
        assert_eq!(hold.labels.len(), 1);
    }

    #[test]
    fn test_deposit_blocked_while_animating() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut hold = CargoHold::new();
        hold.insert_at(OrbSize::Small, Vec2::new(0.0, 0.0), 0.1);
        hold.insert_at(OrbSize::Small, Vec2::new(0.0, 30.0), 0.1);

        assert_eq!(hold.deposit(&mut rng, &tuning), 1);
        assert_eq!(hold.deposit(&mut rng, &tuning), 0);
        for _ in 0..tuning.deposit_animation_ticks {
            hold.tick_timers(crate::consts::SIM_DT);
        }
        assert_eq!(hold.deposit(&mut rng, &tuning), 1);
    }

    #[test]
    fn test_deposit_tie_breaks_by_x() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut hold = CargoHold::new();
        hold.insert_at(OrbSize::Large, Vec2::new(20.0, 0.0), 0.1);
        hold.insert_at(OrbSize::Medium, Vec2::new(-20.0, 0.0), 0.1);
        assert_eq!(hold.deposit(&mut rng, &tuning), 5);
    }

    #[test]
    fn test_pile_settles_on_floor() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut hold = CargoHold::new();
        for _ in 0..3 {
            hold.insert(&orb(OrbSize::Medium), &mut rng, &tuning);
        }
        for _ in 0..600 {
            hold.step(crate::consts::SIM_DT, &tuning);
        }
        let floor = HOLD_FLOOR_Y + HOLD_WALL_THICKNESS / 2.0;
        let lowest = hold
            .orbs()
            .iter()
            .map(|o| o.pos.y - o.radius())
            .fold(f32::INFINITY, f32::min);
        assert!((lowest - floor).abs() < 1.0);
        for held in hold.orbs() {
            assert!(held.pos.x.abs() <= HOLD_HALF_WIDTH);
            assert!(held.pos.y < tuning.hold_insert_y);
        }
        assert!(hold.catcher_contacts().is_empty());
    }

    #[test]
    fn test_catcher_fade_removes_orb() {
        let mut hold = CargoHold::new();
        let id = hold.insert_at(OrbSize::Small, Vec2::new(0.0, -105.0), 0.1);
        assert_eq!(hold.catcher_contacts(), vec![id]);

        assert!(hold.start_fade(id, 3));
        // Second contact while fading is ignored
        assert!(!hold.start_fade(id, 3));

        hold.tick_timers(crate::consts::SIM_DT);
        hold.tick_timers(crate::consts::SIM_DT);
        assert_eq!(hold.count(), 1);
        hold.tick_timers(crate::consts::SIM_DT);
        assert_eq!(hold.count(), 0);
    }
}
