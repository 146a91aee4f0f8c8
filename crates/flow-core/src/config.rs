//! Configuration loading for the blood flow viewer.
//!
//! All tunables are loaded from a TOML file. Every section is optional and
//! falls back to the built-in defaults.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::category::{Category, CategoryVisibility};
use crate::vessel::Vessel;

/// Complete viewer configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Tube dimensions
    #[serde(default)]
    pub vessel: VesselConfig,
    /// Flow speed and population settings
    #[serde(default)]
    pub flow: FlowSettings,
    /// Initial per-category visibility
    #[serde(default)]
    pub visibility: CategoryVisibility,
    /// Camera and orbit control settings
    #[serde(default)]
    pub camera: CameraConfig,
}

/// Tube dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VesselConfig {
    pub length: f32,
    pub radius: f32,
}

impl Default for VesselConfig {
    fn default() -> Self {
        let vessel = Vessel::default();
        Self {
            length: vessel.length,
            radius: vessel.radius,
        }
    }
}

impl VesselConfig {
    pub fn vessel(&self) -> Vessel {
        Vessel::new(self.length, self.radius)
    }
}

/// Flow speed and population settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Default flow speed multiplier
    pub flow_speed: f32,
    /// Default number of cells
    pub cell_count: usize,
    pub min_flow_speed: f32,
    pub max_flow_speed: f32,
    pub min_cell_count: usize,
    pub max_cell_count: usize,
    /// Flow speed change per key press
    pub flow_speed_step: f32,
    /// Cell count change per key press
    pub cell_count_step: usize,
    /// Fixed RNG seed for reproducible runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            flow_speed: 2.0,
            cell_count: 120,
            min_flow_speed: 0.1,
            max_flow_speed: 10.0,
            min_cell_count: 10,
            max_cell_count: 500,
            flow_speed_step: 0.1,
            cell_count_step: 10,
            seed: None,
        }
    }
}

impl FlowSettings {
    /// Clamp a flow speed into the allowed range.
    pub fn clamp_flow_speed(&self, speed: f32) -> f32 {
        speed.clamp(self.min_flow_speed, self.max_flow_speed)
    }

    /// Clamp a cell count into the allowed range.
    pub fn clamp_cell_count(&self, count: usize) -> usize {
        count.clamp(self.min_cell_count, self.max_cell_count)
    }
}

/// Camera and orbit control settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Starting camera position; the camera looks at the origin
    pub position: [f32; 3],
    /// Closest orbit distance
    pub min_distance: f32,
    /// Farthest orbit distance
    pub max_distance: f32,
    /// Fraction of the remaining motion applied per 60 Hz frame
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 100.0, 200.0],
            min_distance: 100.0,
            max_distance: 500.0,
            damping: 0.05,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Error serializing config to TOML
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is out of its allowed range
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl FlowConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let vessel = &self.vessel;
        if !(vessel.length > 0.0) {
            return Err(invalid(format!(
                "vessel.length must be positive, got {}",
                vessel.length
            )));
        }
        let geometry = vessel.vessel();
        if !(geometry.min_z() < geometry.entrance_z()) || !(geometry.exit_z() < geometry.recycle_z())
        {
            return Err(invalid(format!(
                "vessel.length {} is too large to place cells around",
                vessel.length
            )));
        }
        let narrowest = 2.0 * Category::max_base_size();
        if !(vessel.radius > narrowest) {
            return Err(invalid(format!(
                "vessel.radius must exceed {narrowest}, got {}",
                vessel.radius
            )));
        }

        let flow = &self.flow;
        if !(flow.min_flow_speed > 0.0) || flow.min_flow_speed > flow.max_flow_speed {
            return Err(invalid(format!(
                "flow speed range [{}, {}] must be positive and ordered",
                flow.min_flow_speed, flow.max_flow_speed
            )));
        }
        if !(flow.min_flow_speed..=flow.max_flow_speed).contains(&flow.flow_speed) {
            return Err(invalid(format!(
                "flow.flow_speed {} is outside [{}, {}]",
                flow.flow_speed, flow.min_flow_speed, flow.max_flow_speed
            )));
        }
        if flow.min_cell_count > flow.max_cell_count {
            return Err(invalid(format!(
                "cell count range [{}, {}] is inverted",
                flow.min_cell_count, flow.max_cell_count
            )));
        }
        if !(flow.min_cell_count..=flow.max_cell_count).contains(&flow.cell_count) {
            return Err(invalid(format!(
                "flow.cell_count {} is outside [{}, {}]",
                flow.cell_count, flow.min_cell_count, flow.max_cell_count
            )));
        }
        if !(flow.flow_speed_step > 0.0) || flow.cell_count_step == 0 {
            return Err(invalid("flow step sizes must be positive".to_string()));
        }

        let camera = &self.camera;
        if !(camera.min_distance > 0.0) || camera.min_distance > camera.max_distance {
            return Err(invalid(format!(
                "camera distance range [{}, {}] must be positive and ordered",
                camera.min_distance, camera.max_distance
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0) || camera.near >= camera.far {
            return Err(invalid(format!(
                "camera clip planes [{}, {}] must be positive and ordered",
                camera.near, camera.far
            )));
        }
        if !(camera.damping > 0.0 && camera.damping <= 1.0) {
            return Err(invalid(format!(
                "camera.damping must be in (0, 1], got {}",
                camera.damping
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Blood Flow Configuration

[vessel]
length = 300.0
radius = 50.0

[flow]
flow_speed = 2.0
cell_count = 120
min_flow_speed = 0.1
max_flow_speed = 10.0
min_cell_count = 10
max_cell_count = 500
flow_speed_step = 0.1
cell_count_step = 10
# seed = 42

[visibility]
red = true
white = true
platelet = true

[camera]
fov_degrees = 75.0
near = 0.1
far = 1000.0
position = [0.0, 100.0, 200.0]
min_distance = 100.0
max_distance = 500.0
damping = 0.05
"#
    .to_string()
}
