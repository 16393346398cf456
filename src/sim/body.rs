//! Physics body state and integration
//!
//! Every simulated entity owns exactly one [`PhysicsBody`]. Shapes are circles.
//! Integration is semi-implicit Euler: damping and impulses change velocity
//! first, then position advances by the new velocity.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Category bit set used for collision (blocking) and contact (notify) masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Category(pub u32);

impl Category {
    pub const NONE: Self = Self(0);
    pub const PLAYER: Self = Self(1 << 0);
    pub const ENEMY: Self = Self(1 << 1);
    pub const WALL: Self = Self(1 << 2);
    pub const BACKGROUND: Self = Self(1 << 3);
    pub const PROJECTILE: Self = Self(1 << 4);
    pub const ORB: Self = Self(1 << 5);
    pub const CARGO_HOLD: Self = Self(1 << 6);
    pub const STATION: Self = Self(1 << 7);
    pub const CATCHER: Self = Self(1 << 8);
    pub const DRONE: Self = Self(1 << 9);
    pub const ENEMY_PROJECTILE: Self = Self(1 << 10);

    /// True if any bit is shared
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Category {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Category {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Category {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Bounce factor for bodies that don't set their own
pub const DEFAULT_RESTITUTION: f32 = 0.2;

/// Per-entity physical state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing angle (radians). Set directly by behavior for ships.
    pub rotation: f32,
    /// Integrated into `rotation` each tick (asteroid spin only)
    pub angular_velocity: f32,
    /// Collision circle radius
    pub radius: f32,
    /// Always > 0; only changed through [`PhysicsBody::set_mass`]
    mass: f32,
    pub linear_damping: f32,
    pub restitution: f32,
    /// Pulled by attraction fields (the player's orb field)
    pub affected_by_fields: bool,
    /// Static bodies never move
    pub is_dynamic: bool,
    pub category: Category,
    /// Categories that physically block this body
    pub collision_mask: Category,
    /// Categories that produce contact events with this body
    pub contact_mask: Category,
}

impl PhysicsBody {
    /// Create a dynamic body with no masks set
    pub fn new(position: Vec2, radius: f32, mass: f32) -> Self {
        let mut body = Self {
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            radius,
            mass: 1.0,
            linear_damping: 0.0,
            restitution: DEFAULT_RESTITUTION,
            affected_by_fields: false,
            is_dynamic: true,
            category: Category::NONE,
            collision_mask: Category::NONE,
            contact_mask: Category::NONE,
        };
        body.set_mass(mass);
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }

    pub fn with_masks(mut self, category: Category, collision: Category, contact: Category) -> Self {
        self.category = category;
        self.collision_mask = collision;
        self.contact_mask = contact;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass. Non-positive or non-finite values are ignored.
    pub fn set_mass(&mut self, mass: f32) {
        if mass.is_finite() && mass > 0.0 {
            self.mass = mass;
        } else {
            log::warn!("Rejected invalid mass {} (keeping {})", mass, self.mass);
        }
    }

    /// Inverse mass, zero for static bodies
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.is_dynamic { 1.0 / self.mass } else { 0.0 }
    }

    /// Instantaneous change of momentum
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.is_dynamic {
            self.velocity += impulse / self.mass;
        }
    }

    /// Advance one fixed step
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_dynamic {
            return;
        }
        if self.linear_damping > 0.0 {
            self.velocity *= (-self.linear_damping * dt).exp();
        }
        self.position += self.velocity * dt;
        if self.angular_velocity != 0.0 {
            self.rotation = crate::normalize_angle(self.rotation + self.angular_velocity * dt);
        }
    }

    /// Whether this body and `other` should report contact when touching
    #[inline]
    pub fn wants_contact(&self, other: &PhysicsBody) -> bool {
        self.category.intersects(other.contact_mask) || other.category.intersects(self.contact_mask)
    }

    /// Whether `other` physically blocks this body
    #[inline]
    pub fn blocked_by(&self, other: &PhysicsBody) -> bool {
        self.is_dynamic && self.collision_mask.intersects(other.category)
    }
}
