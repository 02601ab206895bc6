//! Wall contact response.
//!
//! The bounce is worked out in angle space. The heading is mirrored about
//! the wall's horizontal angle and the launch angle about its vertical angle.
//! The velocity vector is not reflected about the plane normal, so the result
//! reads right on screen but is not an exact elastic reflection.
//!
//! ## Response sequence
//!
//! ```text
//! 1. s       ← s · recovery
//! 2. heading ← heading − 2·H          (degrees)
//! 3. if |heading| ≥ 90:
//!        heading ← sign(heading)·(180 − |heading|)
//!        launch  ← 180 mod launch
//! 4. p       ← p − (0.2, 0.2, 0.2)
//! 5. launch  ← 2·V − launch           (degrees)
//! 6. one integration step
//! ```
//!
//! Step 4 is a fixed diagonal shift, not a push along the normal. Together with
//! step 6 it usually carries the body out of the contact band before the next
//! check.

use log::debug;

use crate::integrator::MotionIntegrator;
use crate::types::{constants, sign, BodyProperties, BodyState, Vec3, WallPose};

/// Collision resolver for the wall.
pub struct CollisionResolver;

impl CollisionResolver {
    /// Resolve a wall contact and return the new body state.
    ///
    /// Runs the reflection and then one step of `integrator`, so the returned
    /// state has already moved away from the contact.
    pub fn resolve(
        state: &BodyState,
        props: &BodyProperties,
        wall: &WallPose,
        integrator: &MotionIntegrator,
    ) -> BodyState {
        let reflected = Self::reflect(state, props, wall);
        debug!(
            "wall contact: heading {:.2} -> {:.2}, launch {:.2} -> {:.2}, speed {:.3} -> {:.3}",
            state.heading_angle,
            reflected.heading_angle,
            state.launch_angle,
            reflected.launch_angle,
            state.speed,
            reflected.speed
        );
        integrator.step(&reflected, props)
    }

    /// Steps 1 to 5 of the response, without the follow-up integration.
    pub fn reflect(state: &BodyState, props: &BodyProperties, wall: &WallPose) -> BodyState {
        let speed = state.speed * props.speed_recovery;

        let mut heading =
            -2.0 * wall.horizontal_angle() / constants::DEG_TO_RAD + state.heading_angle;
        let mut launch = state.launch_angle;

        if heading.abs() >= 90.0 {
            heading = sign(heading) * (180.0 - heading.abs());
            launch = fold_launch(launch);
        }

        let position = state.position - Vec3::splat(constants::WALL_PUSH_OUT);
        launch = 2.0 * wall.vertical_angle() / constants::DEG_TO_RAD - launch;

        BodyState {
            position,
            speed,
            launch_angle: launch,
            heading_angle: heading,
        }
    }
}

/// `180 mod launch` with the remainder taking the sign of 180.
///
/// A zero launch angle has no remainder and is kept as zero.
fn fold_launch(launch: f64) -> f64 {
    if launch == 0.0 {
        return 0.0;
    }
    180.0 % launch
}

// =============================================================================
// Tests
// =============================================================================
