//! # WB Core
//!
//! Fixed-step physics for a ball bouncing off an arbitrarily posed wall.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec3, body state and properties, wall pose)
//! - `integrator`: Closed-form per-step kinematics and ground contact
//! - `collision`: Probe-point wall detection and angle-space bounce response
//! - `simulation`: Fixed-step clock over the live bodies
//! - `config`: YAML preset loader

pub mod collision;
pub mod config;
pub mod integrator;
pub mod simulation;
pub mod types;

pub use collision::{CollisionDetector, CollisionResolver, WallContact};
pub use config::{ConfigLoader, LaunchConfig, SimulationConfig, WallConfig};
pub use integrator::MotionIntegrator;
pub use simulation::{tick, SimulationClock, TickOutcome, TickReport};
pub use types::{
    BodyExtents, BodyId, BodyProperties, BodyState, LaunchParams, ProjectileBody,
    ValidationError, Vec3, WallPose,
};
