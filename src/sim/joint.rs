//! Spring joints between two bodies

use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use super::state::EntityId;

/// Damped Hooke spring between two entities' centers.
///
/// Stiffness and damping are derived from the reduced mass of the pair, so a
/// joint keeps the same oscillation frequency no matter how heavy the ends are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringJoint {
    pub a: EntityId,
    pub b: EntityId,
    pub rest_length: f32,
    /// Oscillation frequency (Hz)
    pub frequency: f32,
    /// Damping ratio (0 = undamped)
    pub damping: f32,
}

impl SpringJoint {
    /// Joint whose rest length is the current distance between the bodies
    pub fn new(a: EntityId, a_body: &PhysicsBody, b: EntityId, b_body: &PhysicsBody, frequency: f32, damping: f32) -> Self {
        Self {
            a,
            b,
            rest_length: a_body.position.distance(b_body.position),
            frequency,
            damping,
        }
    }

    pub fn involves(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// Apply one step of spring impulses to both ends
    pub fn solve(&self, a: &mut PhysicsBody, b: &mut PhysicsBody, dt: f32) {
        let inv_sum = a.inv_mass() + b.inv_mass();
        if inv_sum <= 0.0 {
            return;
        }
        let delta = b.position - a.position;
        let len = delta.length();
        if len <= f32::EPSILON {
            return;
        }
        let axis = delta / len;

        let reduced_mass = 1.0 / inv_sum;
        let omega = std::f32::consts::TAU * self.frequency;
        let stiffness = reduced_mass * omega * omega;
        let damping = 2.0 * reduced_mass * self.damping * omega;

        let stretch = len - self.rest_length;
        let closing = (b.velocity - a.velocity).dot(axis);
        let force = stiffness * stretch + damping * closing;

        let impulse = axis * (force * dt);
        a.apply_impulse(impulse);
        b.apply_impulse(-impulse);
    }
}
