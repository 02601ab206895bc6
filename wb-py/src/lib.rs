//! Python bindings for the wb-core wall bounce physics engine.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from wall_bounce import Simulation
//!
//! sim = Simulation()
//! ball = sim.launch(speed=30.0, launch_angle=30.0)
//!
//! for _ in range(100):
//!     sim.set_wall_orientation(90.0, slider_value)
//!     sim.step()
//!     pos = sim.body_position(ball)
//!     if pos is not None:
//!         print(f"Ball at ({pos.x}, {pos.y}, {pos.z})")
//! ```

use log::info;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use wb_core::config::{ConfigError, ConfigLoader, SimulationConfig, WallConfig};
use wb_core::types::{constants, BodyExtents, BodyId, LaunchParams, Vec3 as CoreVec3, WallPose};
use wb_core::SimulationClock;

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn config_error(err: ConfigError) -> PyErr {
    match err {
        ConfigError::IoError(_) | ConfigError::NotFound(_) => PyIOError::new_err(err.to_string()),
        ConfigError::ParseError(_) | ConfigError::Invalid(_) => value_error(err),
    }
}

/// 3D vector for positions.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

/// Main simulation class.
///
/// Owns the live balls and the current wall pose. The wall can be moved or
/// re-oriented between any two steps.
#[pyclass]
pub struct Simulation {
    clock: SimulationClock,
    config: SimulationConfig,
    wall: WallPose,
    wall_thickness: f64,
}

impl Simulation {
    fn from_parts(config: SimulationConfig, wall: &WallConfig) -> PyResult<Self> {
        info!(
            "simulation ready: dt={} gravity={} wall at {:.1}",
            config.dt, config.gravity, wall.distance
        );
        Ok(Self {
            clock: SimulationClock::new(&config).map_err(value_error)?,
            config,
            wall: wall.to_pose().map_err(value_error)?,
            wall_thickness: wall.thickness,
        })
    }

    fn body_extents(&self) -> BodyExtents {
        BodyExtents::new(
            self.wall.plane_length(),
            self.wall.plane_width(),
            self.wall_thickness,
        )
    }
}

#[pymethods]
impl Simulation {
    /// Create a simulation with the default physics and an upright wall.
    #[new]
    #[pyo3(signature = (dt = constants::DEFAULT_DT, gravity = constants::GRAVITY))]
    fn new(dt: f64, gravity: f64) -> PyResult<Self> {
        let config = SimulationConfig {
            dt,
            gravity,
            ..SimulationConfig::default()
        };
        Self::from_parts(config, &WallConfig::default())
    }

    /// Build a simulation from a preset directory.
    #[staticmethod]
    #[pyo3(signature = (path, physics = "default", wall = "upright"))]
    fn from_presets(path: &str, physics: &str, wall: &str) -> PyResult<Self> {
        let loader = ConfigLoader::new(path);
        let config = loader.load_physics(physics).map_err(config_error)?;
        let wall = loader.load_wall(wall).map_err(config_error)?;
        Self::from_parts(config, &wall)
    }

    /// Current simulation time.
    #[getter]
    fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Number of live balls.
    fn __len__(&self) -> usize {
        self.clock.len()
    }

    /// Launch a ball. Angles in degrees.
    ///
    /// Returns the ball id.
    #[pyo3(signature = (
        speed = 30.0,
        launch_angle = 30.0,
        heading_angle = 0.0,
        position = None,
        radius = 5.0,
        speed_recovery = 1.0,
        air_resistance = 0.0,
        lifetime = Some(6.0),
    ))]
    #[allow(clippy::too_many_arguments)]
    fn launch(
        &mut self,
        speed: f64,
        launch_angle: f64,
        heading_angle: f64,
        position: Option<Vec3>,
        radius: f64,
        speed_recovery: f64,
        air_resistance: f64,
        lifetime: Option<f64>,
    ) -> PyResult<u64> {
        let params = LaunchParams {
            radius,
            speed,
            launch_angle,
            heading_angle,
            position: position.map_or(CoreVec3::new(0.0, 20.0, 0.0), Into::into),
            speed_recovery,
            air_resistance,
            extents: self.body_extents(),
            weight: self.config.weight,
        };
        let id = self.clock.spawn(params, lifetime).map_err(value_error)?;
        Ok(id.0)
    }

    /// Launch a ball from a named preset.
    fn launch_preset(&mut self, path: &str, name: &str) -> PyResult<u64> {
        let launch = ConfigLoader::new(path)
            .load_launch(name)
            .map_err(config_error)?;
        let mut params = launch.to_params(&self.config, &WallConfig::default());
        params.extents = self.body_extents();
        let id = self
            .clock
            .spawn(params, launch.lifetime)
            .map_err(value_error)?;
        Ok(id.0)
    }

    /// Remove a ball now. Returns False if it was already gone.
    fn remove(&mut self, id: u64) -> bool {
        self.clock.despawn(BodyId(id)).is_some()
    }

    /// Ids of all live balls.
    fn body_ids(&self) -> Vec<u64> {
        self.clock.bodies().iter().map(|b| b.id().0).collect()
    }

    fn body_position(&self, id: u64) -> Option<Vec3> {
        self.clock.body(BodyId(id)).map(|b| b.position().into())
    }

    fn body_speed(&self, id: u64) -> Option<f64> {
        self.clock.body(BodyId(id)).map(|b| b.speed())
    }

    /// (launch_angle, heading_angle) in degrees.
    fn body_angles(&self, id: u64) -> Option<(f64, f64)> {
        self.clock
            .body(BodyId(id))
            .map(|b| (b.launch_angle(), b.heading_angle()))
    }

    /// Move the wall's anchor corner.
    fn set_wall_position(&mut self, x: f64, y: f64, z: f64) -> PyResult<()> {
        self.wall
            .set_position(CoreVec3::new(x, y, z))
            .map_err(value_error)
    }

    /// Re-orient the wall. Angles in degrees.
    fn set_wall_orientation(&mut self, vertical_deg: f64, horizontal_deg: f64) -> PyResult<()> {
        self.wall
            .set_orientation(
                vertical_deg * constants::DEG_TO_RAD,
                horizontal_deg * constants::DEG_TO_RAD,
            )
            .map_err(value_error)
    }

    /// Wall pose as (position, vertical_deg, horizontal_deg, length, width).
    fn wall(&self) -> (Vec3, f64, f64, f64, f64) {
        (
            self.wall.position().into(),
            self.wall.vertical_angle() / constants::DEG_TO_RAD,
            self.wall.horizontal_angle() / constants::DEG_TO_RAD,
            self.wall.plane_length(),
            self.wall.plane_width(),
        )
    }

    /// Advance one fixed tick.
    ///
    /// Returns the ids of balls that touched the wall.
    fn step(&mut self) -> Vec<u64> {
        let report = self.clock.tick(&self.wall);
        report.contacts.iter().map(|(id, _)| id.0).collect()
    }

    /// Run multiple ticks at once.
    fn step_n(&mut self, steps: usize) {
        for _ in 0..steps {
            self.clock.tick(&self.wall);
        }
    }

    /// Feed elapsed frame time; returns the number of ticks run.
    fn advance(&mut self, frame_dt: f64) -> u32 {
        self.clock.advance(frame_dt, &self.wall).ticks
    }

    /// Remove every ball and rewind time.
    fn reset(&mut self) {
        self.clock.reset();
    }

    /// Get current state as dict for easy inspection.
    fn state_dict(&self) -> PyResult<PyObject> {
        Python::with_gil(|py| {
            let dict = pyo3::types::PyDict::new(py);
            dict.set_item("time", self.clock.time())?;
            dict.set_item("ticks", self.clock.ticks())?;
            let balls = pyo3::types::PyList::empty(py);
            for body in self.clock.bodies() {
                let entry = pyo3::types::PyDict::new(py);
                let p = body.position();
                entry.set_item("id", body.id().0)?;
                entry.set_item("x", p.x)?;
                entry.set_item("y", p.y)?;
                entry.set_item("z", p.z)?;
                entry.set_item("speed", body.speed())?;
                entry.set_item("launch_angle", body.launch_angle())?;
                entry.set_item("heading_angle", body.heading_angle())?;
                balls.append(entry)?;
            }
            dict.set_item("balls", balls)?;
            Ok(dict.into())
        })
    }
}

/// Python module definition.
#[pymodule]
fn wall_bounce(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Simulation>()?;
    Ok(())
}
