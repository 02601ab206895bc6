//! Fixed-step motion integration.
//!
//! Each step advances a body with a closed-form update rather than by
//! sub-stepping an acceleration function. Gravity and quadratic drag are
//! folded directly into the position and speed formulas.
//!
//! ## Algorithm
//!
//! With launch angle θ, heading φ, speed s and drag factor k = resistance / weight:
//!
//! ```text
//! 1. p' = p + s·dir(θ, φ)·dt − (k·s²·dir(θ, φ)/2 + g·ŷ)·dt²
//! 2. θ' = elevation of the displacement p' − p
//! 3. v' = s·dir(θ', φ) − (k·s²·dir(θ', φ) + g·ŷ)·dt
//! 4. s' = |v'|
//! ```
//!
//! The angle is taken from the displacement rather than the velocity so that
//! the drawn path and the next projection agree with each other. The heading
//! is never changed by integration; only wall contacts turn the body sideways.
//!
//! ## Ground contact
//!
//! There is no floor collider. A body found below y = 0 at the start of a tick
//! loses speed, has its launch angle mirrored upward and is lifted back onto
//! the ground before it is integrated.

use log::debug;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::types::{constants, sign, BodyProperties, BodyState, Vec3};

/// Closed-form projectile integrator with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntegrator {
    pub dt: f64,
    pub gravity: f64,
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self {
            dt: constants::DEFAULT_DT,
            gravity: constants::GRAVITY,
        }
    }
}

impl MotionIntegrator {
    pub fn new(dt: f64, gravity: f64) -> Self {
        Self { dt, gravity }
    }

    /// Full per-tick body update: ground contact, then one step.
    pub fn update(&self, state: &BodyState, props: &BodyProperties) -> BodyState {
        let grounded = Self::ground_contact(state, props);
        self.step(&grounded, props)
    }

    /// Run `steps` consecutive updates.
    pub fn update_n(&self, state: &BodyState, props: &BodyProperties, steps: usize) -> BodyState {
        let mut current = *state;
        for _ in 0..steps {
            current = self.update(&current, props);
        }
        current
    }

    /// Advance position, launch angle and speed by one `dt`.
    pub fn step(&self, state: &BodyState, props: &BodyProperties) -> BodyState {
        let dt = self.dt;
        let dt2 = dt * dt;
        let speed = state.speed;
        let drag = props.drag_factor() * speed * speed;

        let theta = state.launch_angle * constants::DEG_TO_RAD;
        let phi = state.heading_angle * constants::DEG_TO_RAD;
        let (sin_t, cos_t) = (theta.sin(), theta.cos());
        let (sin_p, cos_p) = (phi.sin(), phi.cos());

        let p = state.position;
        let position = Vec3::new(
            p.x + speed * cos_t * cos_p * dt - (drag * cos_t * cos_p / 2.0) * dt2,
            p.y + speed * sin_t * dt - (self.gravity + drag * sin_t / 2.0) * dt2,
            p.z + speed * cos_t * sin_p * dt - (drag * cos_t * sin_p / 2.0) * dt2,
        );

        let launch_angle = elevation_of(position - p) / constants::DEG_TO_RAD;

        // Speed is evaluated along the freshly recomputed launch angle.
        let theta = launch_angle * constants::DEG_TO_RAD;
        let (sin_t, cos_t) = (theta.sin(), theta.cos());
        let vx = speed * cos_t * cos_p - drag * cos_t * cos_p * dt;
        let vy = speed * sin_t - (self.gravity + drag * sin_t) * dt;
        let vz = speed * cos_t * sin_p - drag * cos_t * sin_p * dt;

        BodyState {
            position,
            speed: Vec3::new(vx, vy, vz).magnitude(),
            launch_angle,
            heading_angle: state.heading_angle,
        }
    }

    /// Inelastic floor bounce for a body that has sunk below y = 0.
    ///
    /// Airborne bodies are returned unchanged.
    pub fn ground_contact(state: &BodyState, props: &BodyProperties) -> BodyState {
        if state.is_airborne() {
            return *state;
        }

        let recovery = props.speed_recovery;
        let mut speed = state.speed * recovery;
        if speed > 0.0 && speed < constants::REST_SPEED && recovery != 1.0 {
            speed -= speed * recovery;
        }

        let mut position = state.position;
        position.y += (0.0 - position.y).abs();

        debug!(
            "ground contact: speed {:.3} -> {:.3}, launch {:.2} -> {:.2}",
            state.speed,
            speed,
            state.launch_angle,
            state.launch_angle.abs()
        );

        BodyState {
            position,
            speed,
            launch_angle: state.launch_angle.abs(),
            heading_angle: state.heading_angle,
        }
    }
}

/// Signed elevation (radians) of a displacement, in (-π, π].
///
/// The horizontal magnitude takes the sign of Δx, so motion toward negative x
/// lands beyond ±π/2. Zero horizontal travel is treated as purely vertical.
pub fn elevation_of(delta: Vec3) -> f64 {
    let horizontal = sign(delta.x) * (delta.x * delta.x + delta.z * delta.z).sqrt();
    if horizontal == 0.0 {
        return sign(delta.y) * FRAC_PI_2;
    }

    let slope = (delta.y / horizontal).abs().atan();
    if horizontal < 0.0 {
        sign(delta.y) * (PI - slope)
    } else {
        sign(delta.y) * slope
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyId, LaunchParams, ProjectileBody};
    use proptest::prelude::*;

    fn body(params: LaunchParams) -> ProjectileBody {
        ProjectileBody::new(BodyId(0), params).unwrap()
    }

    #[test]
    fn test_single_step_matches_closed_form() {
        let body = body(LaunchParams::default());
        let integrator = MotionIntegrator::default();

        let next = integrator.update(body.state(), body.props());

        // x = 30·cos30°·0.1, y = 20 + 30·sin30°·0.1 − 9.81·0.01
        assert!(
            (next.position.x - 2.598_076_211_353_316).abs() < 1e-9,
            "Expected x≈2.598, got {}",
            next.position.x
        );
        assert!(
            (next.position.y - 21.4019).abs() < 1e-9,
            "Expected y≈21.4019, got {}",
            next.position.y
        );
        assert!(next.position.z.abs() < 1e-12);
        assert_eq!(next.heading_angle, 0.0);
    }

    #[test]
    fn test_drag_free_height_is_exact() {
        let body = body(LaunchParams::default());
        let integrator = MotionIntegrator::default();
        let dt = integrator.dt;

        let mut state = *body.state();
        for tick in 0..10 {
            let sin_t = (state.launch_angle * constants::DEG_TO_RAD).sin();
            let expected_y =
                state.position.y + state.speed * sin_t * dt - constants::GRAVITY * (dt * dt);

            state = integrator.update(&state, body.props());

            assert!(state.position.y > 0.0, "Should stay airborne");
            assert_eq!(
                state.position.y, expected_y,
                "Height diverged from the per-step formula at tick {}",
                tick
            );
        }
    }

    #[test]
    fn test_drag_slows_body() {
        let free = body(LaunchParams::default());
        let dragged = body(LaunchParams {
            air_resistance: 5.0,
            ..LaunchParams::default()
        });
        let integrator = MotionIntegrator::default();

        let a = integrator.update_n(free.state(), free.props(), 5);
        let b = integrator.update_n(dragged.state(), dragged.props(), 5);

        assert!(
            b.position.x < a.position.x,
            "Drag should shorten horizontal travel ({} vs {})",
            b.position.x,
            a.position.x
        );
        assert!(b.speed < a.speed, "Drag should lower speed");
    }

    #[test]
    fn test_ground_contact_mirrors_launch_angle() {
        let body = body(LaunchParams {
            position: Vec3::new(0.0, -0.001, 0.0),
            launch_angle: -45.0,
            speed_recovery: 0.8,
            ..LaunchParams::default()
        });
        let integrator = MotionIntegrator::default();

        let grounded = MotionIntegrator::ground_contact(body.state(), body.props());
        assert_eq!(grounded.position.y, 0.0);
        assert_eq!(grounded.launch_angle, 45.0);
        assert!((grounded.speed - 24.0).abs() < 1e-12);

        let next = integrator.update(body.state(), body.props());
        assert!(
            next.launch_angle >= 0.0,
            "Launch angle should be non-negative after a ground tick, got {}",
            next.launch_angle
        );
    }

    #[test]
    fn test_ground_contact_rest_damping() {
        let body = body(LaunchParams {
            position: Vec3::new(0.0, -0.5, 0.0),
            speed: 4.0,
            speed_recovery: 0.5,
            ..LaunchParams::default()
        });

        let grounded = MotionIntegrator::ground_contact(body.state(), body.props());

        // 4·0.5 = 2, then 2 − 2·0.5 = 1
        assert!((grounded.speed - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ground_contact_full_recovery_skips_damping() {
        let body = body(LaunchParams {
            position: Vec3::new(0.0, -0.5, 0.0),
            speed: 4.0,
            speed_recovery: 1.0,
            ..LaunchParams::default()
        });

        let grounded = MotionIntegrator::ground_contact(body.state(), body.props());
        assert_eq!(grounded.speed, 4.0);
    }

    #[test]
    fn test_airborne_body_skips_ground_contact() {
        let body = body(LaunchParams::default());
        let grounded = MotionIntegrator::ground_contact(body.state(), body.props());
        assert_eq!(&grounded, body.state());
    }

    #[test]
    fn test_elevation_of_quadrants() {
        let up_forward = elevation_of(Vec3::new(1.0, 1.0, 0.0));
        assert!((up_forward - PI / 4.0).abs() < 1e-12);

        let up_backward = elevation_of(Vec3::new(-1.0, 1.0, 0.0));
        assert!((up_backward - 3.0 * PI / 4.0).abs() < 1e-12);

        let down_backward = elevation_of(Vec3::new(-1.0, -1.0, 0.0));
        assert!((down_backward + 3.0 * PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_elevation_of_zero_horizontal() {
        assert_eq!(elevation_of(Vec3::new(0.0, 2.0, 0.0)), FRAC_PI_2);
        assert_eq!(elevation_of(Vec3::new(0.0, -2.0, 0.0)), -FRAC_PI_2);
        assert_eq!(elevation_of(Vec3::ZERO), 0.0);
        // Pure z travel has zero signed horizontal magnitude
        assert_eq!(elevation_of(Vec3::new(0.0, 1.0, 3.0)), FRAC_PI_2);
    }

    #[test]
    fn test_straight_drop_stays_finite() {
        let body = body(LaunchParams {
            launch_angle: -90.0,
            speed: 0.0,
            ..LaunchParams::default()
        });
        let integrator = MotionIntegrator::default();

        let state = integrator.update_n(body.state(), body.props(), 50);
        assert!(state.position.is_finite());
        assert!(state.speed.is_finite());
        assert!(state.launch_angle.is_finite());
    }

    proptest! {
        #[test]
        fn speed_never_negative(
            speed in 0.0f64..100.0,
            launch in -180.0f64..180.0,
            heading in -180.0f64..180.0,
            y in -10.0f64..100.0,
            recovery in 0.0f64..=1.0,
            resistance in 0.0f64..5.0,
            steps in 1usize..60,
        ) {
            let body = body(LaunchParams {
                speed,
                launch_angle: launch,
                heading_angle: heading,
                position: Vec3::new(0.0, y, 0.0),
                speed_recovery: recovery,
                air_resistance: resistance,
                ..LaunchParams::default()
            });
            let integrator = MotionIntegrator::default();

            let mut state = *body.state();
            for _ in 0..steps {
                state = integrator.update(&state, body.props());
                prop_assert!(state.speed >= 0.0, "speed went negative: {}", state.speed);
            }
        }
    }
}
