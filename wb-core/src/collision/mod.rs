//! Wall collision detection and resolution.
//!
//! This module handles:
//! - **Detection**: probe points on the body against the posed wall (broad box
//!   test, then plane distance)
//! - **Resolution**: angle-space reflection of the body's heading and launch
//!   angle, followed by an immediate integration step
//!
//! ```text
//!        wall (tilted by V, yawed by H)
//!           ╱
//!     ●───→╱      probes: center, +r on x, −r on y
//!     ↖   ╱
//!      ↖ ╱        launch ← 2V − launch
//!        ╱        heading ← heading − 2H
//! ```
//!
//! Detection is discrete: the body is sampled once per tick.

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
