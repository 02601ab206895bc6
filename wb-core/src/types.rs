//! Core types for the bounce simulation.
//!
//! Units follow the host scene rather than SI:
//! - Position: scene units (the default wall sits 40 units from the origin)
//! - Speed: scene units per time unit
//! - Body angles (launch, heading): degrees
//! - Wall angles (vertical, horizontal): radians

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Vec3 - 3D Vector
// =============================================================================

/// A 3D vector used for positions and plane normals.
///
/// Coordinate system:
/// - X: horizontal, toward the wall (positive away from the launch point)
/// - Y: vertical (positive upward, ground at y = 0)
/// - Z: horizontal, across the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same value on every axis
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Squared magnitude (avoids sqrt for comparisons)
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude (length) of the vector
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// Operator overloads for Vec3
impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Three-valued sign: -1, 0 or 1.
///
/// Unlike `f64::signum`, zero maps to zero. NaN maps to zero as well.
pub(crate) fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Rejected construction input for a body or a wall.
///
/// Raised once at creation time; the per-tick functions never validate.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NonFinite { field: &'static str, value: f64 },
    NonPositive { field: &'static str, value: f64 },
    Negative { field: &'static str, value: f64 },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonFinite { field, value } => {
                write!(f, "{} must be finite, got {}", field, value)
            }
            ValidationError::NonPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            ValidationError::Negative { field, value } => {
                write!(f, "{} must not be negative, got {}", field, value)
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} must be in [{}, {}], got {}", field, min, max, value),
        }
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if finite(field, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NonPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if finite(field, value)? >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::Negative { field, value })
    }
}

fn finite_vec(field: &'static str, v: Vec3) -> Result<Vec3, ValidationError> {
    finite(field, v.x)?;
    finite(field, v.y)?;
    finite(field, v.z)?;
    Ok(v)
}

// =============================================================================
// Body State
// =============================================================================

/// Kinematic state of a body at a given instant.
///
/// Every update produces a whole new `BodyState`; the owning body swaps it in
/// with a single assignment so a tick never leaves fields half-written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    /// Magnitude of the current velocity, never negative after an update
    pub speed: f64,
    /// Elevation of travel above the x-z plane, degrees.
    /// Values beyond ±90 mean travel toward negative x.
    pub launch_angle: f64,
    /// Azimuth of the horizontal component, degrees
    pub heading_angle: f64,
}

impl BodyState {
    pub fn new(position: Vec3, speed: f64, launch_angle: f64, heading_angle: f64) -> Self {
        Self {
            position,
            speed,
            launch_angle,
            heading_angle,
        }
    }

    /// Direction of travel implied by the two angles.
    pub fn direction(&self) -> Vec3 {
        let theta = self.launch_angle * constants::DEG_TO_RAD;
        let phi = self.heading_angle * constants::DEG_TO_RAD;
        Vec3::new(
            theta.cos() * phi.cos(),
            theta.sin(),
            theta.cos() * phi.sin(),
        )
    }

    pub fn is_airborne(&self) -> bool {
        self.position.y >= 0.0
    }
}

// =============================================================================
// Body Properties
// =============================================================================

/// Collision-box extents carried by a body for the broad-phase wall test.
///
/// `height` is the thickness margin added around the wall on x and y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyExtents {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl BodyExtents {
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}

impl Default for BodyExtents {
    fn default() -> Self {
        Self::new(25.0, 30.0, 2.0)
    }
}

/// Physical parameters of a body. Fixed for the body's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyProperties {
    pub radius: f64,
    /// Drag divisor: the effective drag factor is `air_resistance / weight`
    pub weight: f64,
    pub air_resistance: f64,
    /// Fraction of speed kept after a ground or wall contact
    pub speed_recovery: f64,
    pub extents: BodyExtents,
}

impl BodyProperties {
    /// Quadratic drag factor `k`.
    pub fn drag_factor(&self) -> f64 {
        self.air_resistance / self.weight
    }
}

// =============================================================================
// Projectile Body
// =============================================================================

/// Identifier handed out by the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchParams {
    pub radius: f64,
    pub speed: f64,
    pub launch_angle: f64,
    pub heading_angle: f64,
    pub position: Vec3,
    pub speed_recovery: f64,
    pub air_resistance: f64,
    pub extents: BodyExtents,
    pub weight: f64,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            radius: 5.0,
            speed: 30.0,
            launch_angle: 30.0,
            heading_angle: 0.0,
            position: Vec3::new(0.0, 20.0, 0.0),
            speed_recovery: 1.0,
            air_resistance: 0.0,
            extents: BodyExtents::default(),
            weight: constants::DEFAULT_WEIGHT,
        }
    }
}

/// A single live ball.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileBody {
    id: BodyId,
    state: BodyState,
    props: BodyProperties,
    expires_at: Option<f64>,
}

impl ProjectileBody {
    /// Validate `params` and create a body.
    ///
    /// Negative or non-finite input is a caller error and is rejected here,
    /// so ticks can assume a well-formed body.
    pub fn new(id: BodyId, params: LaunchParams) -> Result<Self, ValidationError> {
        let radius = positive("radius", params.radius)?;
        let speed = non_negative("speed", params.speed)?;
        let launch_angle = finite("launch_angle", params.launch_angle)?;
        let heading_angle = finite("heading_angle", params.heading_angle)?;
        let position = finite_vec("position", params.position)?;
        let weight = positive("weight", params.weight)?;
        let air_resistance = non_negative("air_resistance", params.air_resistance)?;

        let speed_recovery = finite("speed_recovery", params.speed_recovery)?;
        if !(0.0..=1.0).contains(&speed_recovery) {
            return Err(ValidationError::OutOfRange {
                field: "speed_recovery",
                value: speed_recovery,
                min: 0.0,
                max: 1.0,
            });
        }

        let extents = BodyExtents::new(
            non_negative("extents.length", params.extents.length)?,
            non_negative("extents.width", params.extents.width)?,
            non_negative("extents.height", params.extents.height)?,
        );

        Ok(Self {
            id,
            state: BodyState::new(position, speed, launch_angle, heading_angle),
            props: BodyProperties {
                radius,
                weight,
                air_resistance,
                speed_recovery,
                extents,
            },
            expires_at: None,
        })
    }

    /// Mark the body for removal once simulation time reaches `at`.
    pub fn with_expiry(mut self, at: f64) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn state(&self) -> &BodyState {
        &self.state
    }

    pub fn props(&self) -> &BodyProperties {
        &self.props
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn launch_angle(&self) -> f64 {
        self.state.launch_angle
    }

    pub fn heading_angle(&self) -> f64 {
        self.state.heading_angle
    }

    pub fn radius(&self) -> f64 {
        self.props.radius
    }

    pub fn expires_at(&self) -> Option<f64> {
        self.expires_at
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Point on the surface facing the direction of travel.
    pub fn leading_point(&self) -> Vec3 {
        self.state.position + self.state.direction() * self.props.radius
    }

    /// Replace the kinematic state in one step.
    pub(crate) fn commit(&mut self, state: BodyState) {
        self.state = state;
    }
}

// =============================================================================
// Wall Pose
// =============================================================================

/// Snapshot of the wall as posed by the host.
///
/// The host may re-orient the wall between any two ticks, so the core takes a
/// fresh `&WallPose` on every call and never stores one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallPose {
    position: Vec3,
    vertical_angle: f64,
    horizontal_angle: f64,
    plane_length: f64,
    plane_width: f64,
}

impl WallPose {
    /// Create a pose. Angles are in radians.
    pub fn new(
        position: Vec3,
        vertical_angle: f64,
        horizontal_angle: f64,
        plane_length: f64,
        plane_width: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            position: finite_vec("wall.position", position)?,
            vertical_angle: finite("wall.vertical_angle", vertical_angle)?,
            horizontal_angle: finite("wall.horizontal_angle", horizontal_angle)?,
            plane_length: positive("wall.plane_length", plane_length)?,
            plane_width: positive("wall.plane_width", plane_width)?,
        })
    }

    /// Same as [`WallPose::new`] with angles given in degrees.
    pub fn from_degrees(
        position: Vec3,
        vertical_deg: f64,
        horizontal_deg: f64,
        plane_length: f64,
        plane_width: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(
            position,
            vertical_deg * constants::DEG_TO_RAD,
            horizontal_deg * constants::DEG_TO_RAD,
            plane_length,
            plane_width,
        )
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn vertical_angle(&self) -> f64 {
        self.vertical_angle
    }

    pub fn horizontal_angle(&self) -> f64 {
        self.horizontal_angle
    }

    pub fn plane_length(&self) -> f64 {
        self.plane_length
    }

    pub fn plane_width(&self) -> f64 {
        self.plane_width
    }

    pub fn set_position(&mut self, position: Vec3) -> Result<(), ValidationError> {
        self.position = finite_vec("wall.position", position)?;
        Ok(())
    }

    /// Re-orient the wall. Angles are in radians.
    pub fn set_orientation(
        &mut self,
        vertical_angle: f64,
        horizontal_angle: f64,
    ) -> Result<(), ValidationError> {
        let vertical_angle = finite("wall.vertical_angle", vertical_angle)?;
        let horizontal_angle = finite("wall.horizontal_angle", horizontal_angle)?;
        self.vertical_angle = vertical_angle;
        self.horizontal_angle = horizontal_angle;
        Ok(())
    }
}

impl Default for WallPose {
    /// Upright wall 40 units down the x axis, facing the launch point.
    fn default() -> Self {
        Self {
            position: Vec3::new(40.0, 0.0, 0.0),
            vertical_angle: std::f64::consts::FRAC_PI_2,
            horizontal_angle: 0.0,
            plane_length: 25.0,
            plane_width: 30.0,
        }
    }
}

// =============================================================================
// Physical Constants
// =============================================================================

/// Constants used in the simulation.
pub mod constants {
    /// Gravitational acceleration
    pub const GRAVITY: f64 = 9.81;

    /// Fixed integration step
    pub const DEFAULT_DT: f64 = 0.1;

    /// Default drag divisor
    pub const DEFAULT_WEIGHT: f64 = 100.0;

    pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

    /// Below this speed a ground contact also applies rest damping
    pub const REST_SPEED: f64 = 5.0;

    /// Per-axis shift applied after a wall hit
    pub const WALL_PUSH_OUT: f64 = 0.2;

    /// Small value for floating-point comparisons
    pub const EPSILON: f64 = 1e-10;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a - b, Vec3::new(-3.0, -3.0, -3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.dot(&b), 32.0);
    }

    #[test]
    fn test_vec3_cross_product() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert!((z.x).abs() < 1e-10);
        assert!((z.y).abs() < 1e-10);
        assert!((z.z - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_sign_is_three_valued() {
        assert_eq!(sign(3.5), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(f64::NAN), 0.0);
    }

    #[test]
    fn test_create_body_defaults() {
        let body = ProjectileBody::new(BodyId(1), LaunchParams::default()).unwrap();
        assert_eq!(body.position(), Vec3::new(0.0, 20.0, 0.0));
        assert_eq!(body.speed(), 30.0);
        assert_eq!(body.launch_angle(), 30.0);
        assert_eq!(body.heading_angle(), 0.0);
        assert_eq!(body.props().drag_factor(), 0.0);
        assert!(body.expires_at().is_none());
    }

    #[test]
    fn test_create_body_rejects_bad_radius() {
        let params = LaunchParams {
            radius: -1.0,
            ..LaunchParams::default()
        };
        match ProjectileBody::new(BodyId(1), params) {
            Err(ValidationError::NonPositive { field, .. }) => assert_eq!(field, "radius"),
            other => panic!("Expected NonPositive radius, got {:?}", other),
        }
    }

    #[test]
    fn test_create_body_rejects_non_finite_speed() {
        let params = LaunchParams {
            speed: f64::INFINITY,
            ..LaunchParams::default()
        };
        assert!(matches!(
            ProjectileBody::new(BodyId(1), params),
            Err(ValidationError::NonFinite { field: "speed", .. })
        ));

        let params = LaunchParams {
            speed: -2.0,
            ..LaunchParams::default()
        };
        assert!(matches!(
            ProjectileBody::new(BodyId(1), params),
            Err(ValidationError::Negative { field: "speed", .. })
        ));
    }

    #[test]
    fn test_create_body_rejects_recovery_out_of_range() {
        let params = LaunchParams {
            speed_recovery: 1.5,
            ..LaunchParams::default()
        };
        let err = ProjectileBody::new(BodyId(1), params).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert!(err.to_string().contains("speed_recovery"));
    }

    #[test]
    fn test_expiry() {
        let body = ProjectileBody::new(BodyId(7), LaunchParams::default())
            .unwrap()
            .with_expiry(6.0);
        assert!(!body.is_expired(5.9));
        assert!(body.is_expired(6.0));
    }

    #[test]
    fn test_leading_point() {
        let params = LaunchParams {
            launch_angle: 0.0,
            heading_angle: 0.0,
            position: Vec3::new(1.0, 2.0, 3.0),
            ..LaunchParams::default()
        };
        let body = ProjectileBody::new(BodyId(1), params).unwrap();
        let p = body.leading_point();
        assert!((p.x - 6.0).abs() < 1e-10);
        assert!((p.y - 2.0).abs() < 1e-10);
        assert!((p.z - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_wall_pose_validation() {
        assert!(WallPose::new(Vec3::ZERO, 0.0, 0.0, 0.0, 10.0).is_err());
        assert!(WallPose::new(Vec3::ZERO, f64::NAN, 0.0, 10.0, 10.0).is_err());

        let mut wall = WallPose::from_degrees(Vec3::ZERO, 90.0, 0.0, 25.0, 30.0).unwrap();
        assert!((wall.vertical_angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(wall.set_orientation(f64::INFINITY, 0.0).is_err());
        // Rejected update leaves the pose untouched
        assert!((wall.vertical_angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
