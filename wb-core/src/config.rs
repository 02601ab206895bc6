//! Preset configuration loader.
//!
//! Loads physics settings, launch presets and wall presets from YAML files, so
//! scenes can be tuned without recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! presets/
//! ├── physics/
//! │   └── default.yaml
//! ├── launches/
//! │   ├── default.yaml
//! │   ├── lob.yaml
//! │   └── ...
//! └── walls/
//!     ├── upright.yaml
//!     └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{
    constants, finite, positive, BodyExtents, LaunchParams, ValidationError, Vec3, WallPose,
};

/// Error type for preset loading operations.
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(serde_yaml::Error),
    NotFound(String),
    Invalid(ValidationError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "YAML parse error: {}", e),
            ConfigError::NotFound(name) => write!(f, "Preset not found: {}", name),
            ConfigError::Invalid(e) => write!(f, "Invalid preset: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err)
    }
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::Invalid(err)
    }
}

// =============================================================================
// Preset types
// =============================================================================

/// Global physics settings shared by every body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed step per tick
    pub dt: f64,
    pub gravity: f64,
    /// Drag divisor applied to launched bodies
    pub weight: f64,
    /// Upper bound on ticks run for one host frame
    pub max_substeps: u32,
    /// Distance band treated as wall contact
    pub contact_band: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: constants::DEFAULT_DT,
            gravity: constants::GRAVITY,
            weight: constants::DEFAULT_WEIGHT,
            max_substeps: 8,
            contact_band: 1.0,
        }
    }
}

impl SimulationConfig {
    /// Reject settings that would stall the clock or disable wall contact.
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("dt", self.dt)?;
        finite("gravity", self.gravity)?;
        positive("weight", self.weight)?;
        positive("contact_band", self.contact_band)?;
        if self.max_substeps == 0 {
            return Err(ValidationError::NonPositive {
                field: "max_substeps",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Launch settings for new bodies. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub speed: f64,
    pub launch_angle: f64,
    pub heading_angle: f64,
    pub position: Vec3,
    pub radius: f64,
    pub speed_recovery: f64,
    pub air_resistance: f64,
    /// Seconds of simulation time before the body is removed
    pub lifetime: Option<f64>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            launch_angle: 30.0,
            heading_angle: 0.0,
            position: Vec3::new(0.0, 20.0, 0.0),
            radius: 5.0,
            speed_recovery: 1.0,
            air_resistance: 0.0,
            lifetime: Some(6.0),
        }
    }
}

impl LaunchConfig {
    /// Body parameters for this launch against `wall`.
    pub fn to_params(&self, physics: &SimulationConfig, wall: &WallConfig) -> LaunchParams {
        LaunchParams {
            radius: self.radius,
            speed: self.speed,
            launch_angle: self.launch_angle,
            heading_angle: self.heading_angle,
            position: self.position,
            speed_recovery: self.speed_recovery,
            air_resistance: self.air_resistance,
            extents: wall.body_extents(),
            weight: physics.weight,
        }
    }
}

/// Wall placement as edited by a user. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Offset along x from the launch origin
    pub distance: f64,
    /// Offset along y
    pub elevation: f64,
    /// Offset along z
    pub lateral_offset: f64,
    pub vertical_angle_deg: f64,
    pub horizontal_angle_deg: f64,
    pub length: f64,
    pub width: f64,
    /// Collision margin around the wall
    pub thickness: f64,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            distance: 40.0,
            elevation: 0.0,
            lateral_offset: 0.0,
            vertical_angle_deg: 90.0,
            horizontal_angle_deg: 0.0,
            length: 25.0,
            width: 30.0,
            thickness: 2.0,
        }
    }
}

impl WallConfig {
    pub fn to_pose(&self) -> Result<WallPose, ValidationError> {
        WallPose::from_degrees(
            Vec3::new(self.distance, self.elevation, self.lateral_offset),
            self.vertical_angle_deg,
            self.horizontal_angle_deg,
            self.length,
            self.width,
        )
    }

    /// Collision extents handed to bodies launched at this wall.
    pub fn body_extents(&self) -> BodyExtents {
        BodyExtents::new(self.length, self.width, self.thickness)
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Preset loader with configurable base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new loader with the given base path.
    ///
    /// The base path should contain `physics/`, `launches/` and `walls/`
    /// subdirectories.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load physics settings by name (without .yaml extension).
    pub fn load_physics(&self, name: &str) -> Result<SimulationConfig, ConfigError> {
        let config: SimulationConfig = self.load("physics", name)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a launch preset by name.
    ///
    /// # Example
    /// ```ignore
    /// let loader = ConfigLoader::new("presets");
    /// let lob = loader.load_launch("lob")?;
    /// ```
    pub fn load_launch(&self, name: &str) -> Result<LaunchConfig, ConfigError> {
        self.load("launches", name)
    }

    /// Load a wall preset by name. The pose is validated before returning.
    pub fn load_wall(&self, name: &str) -> Result<WallConfig, ConfigError> {
        let config: WallConfig = self.load("walls", name)?;
        config.to_pose()?;
        Ok(config)
    }

    pub fn list_physics(&self) -> Result<Vec<String>, ConfigError> {
        self.list_presets("physics")
    }

    pub fn list_launches(&self) -> Result<Vec<String>, ConfigError> {
        self.list_presets("launches")
    }

    pub fn list_walls(&self) -> Result<Vec<String>, ConfigError> {
        self.list_presets("walls")
    }

    fn load<T: DeserializeOwned>(&self, subdir: &str, name: &str) -> Result<T, ConfigError> {
        let path = self.base_path.join(subdir).join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(format!("{}/{}", subdir, name)));
        }
        let contents = fs::read_to_string(&path)?;
        let value = serde_yaml::from_str(&contents)?;
        info!("loaded preset {}", path.display());
        Ok(value)
    }

    fn list_presets(&self, subdir: &str) -> Result<Vec<String>, ConfigError> {
        let path = self.base_path.join(subdir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================
