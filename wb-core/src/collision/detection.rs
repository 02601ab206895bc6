//! Probe-point collision detection against the wall.
//!
//! The wall is a finite rectangle, rotated by a vertical angle (tilt) and a
//! horizontal angle (yaw) about its anchor corner. Detection runs in two
//! phases:
//!
//! 1. **Broad phase**: an axis-aligned box around the rotated rectangle,
//!    padded by the body's collision height on x and y.
//! 2. **Narrow phase**: the perpendicular distance from each probe point to
//!    the wall's infinite plane.
//!
//! A probe touches the wall when it is inside the box and its distance
//! falls in the first contact band, `floor(distance / band) == 0`. With the
//! default band of 1.0 that is any distance in `[0, 1)`.
//!
//! Only three points on the body are sampled, and only at tick boundaries.
//! A fast body can pass through the wall between two ticks.

use std::f64::consts::FRAC_PI_2;

use crate::types::{
    constants, BodyExtents, BodyProperties, BodyState, ProjectileBody, Vec3, WallPose,
};

/// Configuration for collision detection.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Width of the distance band that counts as contact
    pub contact_band: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self { contact_band: 1.0 }
    }
}

/// Sample point on a body used for the wall test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Body center
    Center,
    /// Center shifted by `+radius` on x
    PlusX,
    /// Center shifted by `-radius` on y
    MinusY,
}

impl Probe {
    pub const ALL: [Probe; 3] = [Probe::Center, Probe::PlusX, Probe::MinusY];

    pub fn point(self, center: Vec3, radius: f64) -> Vec3 {
        match self {
            Probe::Center => center,
            Probe::PlusX => center + Vec3::new(radius, 0.0, 0.0),
            Probe::MinusY => center - Vec3::new(0.0, radius, 0.0),
        }
    }
}

/// Detailed wall contact information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    pub probe: Probe,
    pub point: Vec3,
    /// Unsigned distance from `point` to the wall plane
    pub distance: f64,
}

/// Axis-aligned box around the posed wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl ContactBox {
    /// Box around `wall` sized from a body's collision extents.
    ///
    /// Only x and y receive the `height` margin.
    pub fn around(wall: &WallPose, extents: &BodyExtents) -> Self {
        let (sin_v, cos_v) = (wall.vertical_angle().sin(), wall.vertical_angle().cos());
        let (sin_h, cos_h) = (
            wall.horizontal_angle().sin(),
            wall.horizontal_angle().cos(),
        );
        let (length, width, height) = (extents.length, extents.width, extents.height);

        let half = Vec3::new(
            height + (length * cos_v * cos_h).abs() + (width * cos_v * sin_h).abs(),
            height + (length * sin_v).abs(),
            (width * cos_h).abs() + (length * sin_h).abs(),
        );

        let center = wall.position();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Implicit plane `A·x + B·y + C·z + D = 0` through the wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallPlane {
    /// (A, B, C), not normalized
    pub normal: Vec3,
    pub d: f64,
}

impl WallPlane {
    /// Plane through the anchor and the ends of the length and width edges.
    ///
    /// The length edge is turned by both angles; the width edge lies flat and
    /// only follows the horizontal angle.
    pub fn from_pose(wall: &WallPose) -> Self {
        let (v, h) = (wall.vertical_angle(), wall.horizontal_angle());
        let length = wall.plane_length();
        let width = wall.plane_width();

        let length_edge = Vec3::new(
            length * v.cos() * h.cos(),
            length * v.sin(),
            -length * v.cos() * h.sin(),
        );
        let width_edge = Vec3::new(
            -width * (FRAC_PI_2 - h).cos(),
            0.0,
            -width * (FRAC_PI_2 - h).sin(),
        );

        let anchor = wall.position();
        let normal = length_edge.cross(&width_edge);
        Self {
            normal,
            d: -normal.dot(&anchor),
        }
    }

    /// Perpendicular distance from `p`, or `None` for a degenerate plane.
    pub fn distance(&self, p: Vec3) -> Option<f64> {
        let norm = self.normal.magnitude();
        if norm < constants::EPSILON {
            return None;
        }
        Some((self.normal.dot(&p) + self.d).abs() / norm)
    }
}

/// Collision detector for the single wall.
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    pub config: CollisionConfig,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CollisionConfig) -> Self {
        Self { config }
    }

    /// Does `body` touch `wall` right now?
    pub fn check(&self, body: &ProjectileBody, wall: &WallPose) -> bool {
        self.detect(body.state(), body.props(), wall).is_some()
    }

    /// Find the first touching probe, in `Probe::ALL` order.
    pub fn detect(
        &self,
        state: &BodyState,
        props: &BodyProperties,
        wall: &WallPose,
    ) -> Option<WallContact> {
        let bounds = ContactBox::around(wall, &props.extents);
        let plane = WallPlane::from_pose(wall);

        Probe::ALL.into_iter().find_map(|probe| {
            let point = probe.point(state.position, props.radius);
            if !bounds.contains(point) {
                return None;
            }
            let distance = plane.distance(point)?;
            self.in_contact_band(distance).then_some(WallContact {
                probe,
                point,
                distance,
            })
        })
    }

    fn in_contact_band(&self, distance: f64) -> bool {
        (distance / self.config.contact_band).floor() == 0.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyId, LaunchParams};

    fn body_at(position: Vec3, radius: f64) -> ProjectileBody {
        ProjectileBody::new(
            BodyId(0),
            LaunchParams {
                position,
                radius,
                ..LaunchParams::default()
            },
        )
        .unwrap()
    }

    fn upright_wall() -> WallPose {
        WallPose::default()
    }

    #[test]
    fn test_body_on_plane_is_detected() {
        let detector = CollisionDetector::new();
        let body = body_at(Vec3::new(40.0, 10.0, -10.0), 5.0);

        assert!(detector.check(&body, &upright_wall()));

        let contact = detector
            .detect(body.state(), body.props(), &upright_wall())
            .unwrap();
        assert_eq!(contact.probe, Probe::Center);
        assert!(contact.distance < 1e-9, "Distance should be ~0");
    }

    #[test]
    fn test_distant_body_is_not_detected() {
        let detector = CollisionDetector::new();
        let body = body_at(Vec3::new(90.0, 50.0, 50.0), 5.0);
        assert!(!detector.check(&body, &upright_wall()));
    }

    #[test]
    fn test_broad_phase_rejects_point_on_plane_outside_box() {
        let detector = CollisionDetector::new();
        // On the plane x = 40 but above the padded wall top (27)
        let body = body_at(Vec3::new(40.0, 40.0, 0.0), 1.0);
        assert!(!detector.check(&body, &upright_wall()));
    }

    #[test]
    fn test_contact_band_is_unit_wide() {
        let detector = CollisionDetector::new();
        let wall = upright_wall();

        let near = body_at(Vec3::new(40.9, 10.0, -10.0), 0.5);
        assert!(detector.check(&near, &wall), "0.9 from the plane is contact");

        let far = body_at(Vec3::new(41.5, 10.0, -10.0), 0.1);
        assert!(!detector.check(&far, &wall), "1.5 from the plane is not");
    }

    #[test]
    fn test_custom_contact_band() {
        let detector = CollisionDetector::with_config(CollisionConfig { contact_band: 2.0 });
        let body = body_at(Vec3::new(41.5, 10.0, -10.0), 0.1);
        assert!(detector.check(&body, &upright_wall()));
    }

    #[test]
    fn test_plus_x_probe() {
        let detector = CollisionDetector::new();
        // Center sits outside the box on x; its +radius probe reaches the wall
        let body = body_at(Vec3::new(35.5, 10.0, -10.0), 5.0);

        let contact = detector
            .detect(body.state(), body.props(), &upright_wall())
            .expect("Should touch via +x probe");
        assert_eq!(contact.probe, Probe::PlusX);
        assert!((contact.distance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_minus_y_probe() {
        let detector = CollisionDetector::new();
        // Center above the box; its -radius probe is inside it and on the plane
        let body = body_at(Vec3::new(40.0, 30.0, -10.0), 5.0);

        let contact = detector
            .detect(body.state(), body.props(), &upright_wall())
            .expect("Should touch via -y probe");
        assert_eq!(contact.probe, Probe::MinusY);
    }

    #[test]
    fn test_tilted_wall_plane() {
        let detector = CollisionDetector::new();
        let wall = WallPose::from_degrees(Vec3::new(40.0, 0.0, 0.0), 60.0, 30.0, 25.0, 30.0)
            .unwrap();
        let plane = WallPlane::from_pose(&wall);

        // A point inside the rectangle, built from the two edges
        let (v, h) = (wall.vertical_angle(), wall.horizontal_angle());
        let length_edge = Vec3::new(
            25.0 * v.cos() * h.cos(),
            25.0 * v.sin(),
            -25.0 * v.cos() * h.sin(),
        );
        let width_edge = Vec3::new(-30.0 * h.sin(), 0.0, -30.0 * h.cos());
        let on_plane = wall.position() + length_edge * 0.3 + width_edge * 0.3;

        assert!(plane.distance(on_plane).unwrap() < 1e-9);
        assert!(detector.check(&body_at(on_plane, 0.5), &wall));

        // Three units off the plane along its normal
        let unit_normal = plane.normal * (1.0 / plane.normal.magnitude());
        let off_plane = on_plane + unit_normal * 3.0;
        assert!((plane.distance(off_plane).unwrap() - 3.0).abs() < 1e-9);
        assert!(!detector.check(&body_at(off_plane, 0.5), &wall));
    }

    #[test]
    fn test_contact_box_upright() {
        let bounds = ContactBox::around(&upright_wall(), &BodyExtents::default());
        assert!((bounds.min.x - 38.0).abs() < 1e-9);
        assert!((bounds.max.x - 42.0).abs() < 1e-9);
        assert!((bounds.max.y - 27.0).abs() < 1e-9);
        assert!((bounds.min.z + 30.0).abs() < 1e-9);
        assert!((bounds.max.z - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_box_edges_are_inclusive() {
        let bounds = ContactBox {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        assert!(bounds.contains(Vec3::new(1.0, -1.0, 1.0)));
        assert!(!bounds.contains(Vec3::new(1.0 + 1e-9, 0.0, 0.0)));
    }

    #[test]
    fn test_nan_distance_never_touches() {
        let detector = CollisionDetector::new();
        assert!(!detector.in_contact_band(f64::NAN));
    }
}
