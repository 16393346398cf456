//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod asteroid;
pub mod autopilot;
pub mod body;
pub mod cargo;
pub mod collision;
pub mod drone;
pub mod enemy;
pub mod geom;
pub mod joint;
pub mod player;
pub mod projectile;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use asteroid::{Asteroid, AsteroidType};
pub use autopilot::autopilot_input;
pub use body::{Category, PhysicsBody};
pub use cargo::{CargoHold, Cargoable, HeldOrb, Orb, OrbSize};
pub use collision::{Contact, ContactRef, Reaction, Role};
pub use drone::{Drone, ShotTimer, Targeting};
pub use enemy::{Enemy, EnemyState};
pub use joint::SpringJoint;
pub use player::{Player, PlayerIntents};
pub use projectile::{Faction, Projectile};
pub use snapshot::{EntitySnapshot, EntityTag, RenderInstance, Snapshot, VisualFlags};
pub use state::{
    Commands, Damageable, Depot, Entity, EntityId, EntityKind, GameEvent, GamePhase, Grabbable, HitEffect, World,
};
pub use tick::{FixedStep, TickInput, tick};
