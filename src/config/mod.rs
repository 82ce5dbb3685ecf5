//! Mapper configuration, loadable from YAML.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```yaml
//! octree_resolution: 0.25
//! verbosity_level: 3
//! registration:
//!   max_correspondence_distance: 0.5
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::MapperError;
use crate::map::types::validate_resolution;
use crate::registration::RegistrationConfig;

/// Immutable configuration handed to [`crate::mapping::OctreeMapper::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Frame of the map, the registered scan and the refined path.
    pub map_frame: String,
    pub odom_frame: String,
    /// Frame of raw scans and of the published neighbor cloud.
    pub robot_frame: String,
    pub laser_frame: String,

    /// Voxel edge of the map octree (meters).
    pub octree_resolution: f64,

    /// 0 error, 1 warn, 2 info, 3 debug, 4 trace. Only affects logging.
    pub verbosity_level: u8,

    pub registration: RegistrationConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            map_frame: "map".to_string(),
            odom_frame: "odom".to_string(),
            robot_frame: "base_link".to_string(),
            laser_frame: "laser".to_string(),
            octree_resolution: 0.5,
            verbosity_level: 2,
            registration: RegistrationConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Read a YAML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: MapperConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        validate_resolution(self.octree_resolution)?;
        for (name, frame) in [
            ("map_frame", &self.map_frame),
            ("odom_frame", &self.odom_frame),
            ("robot_frame", &self.robot_frame),
            ("laser_frame", &self.laser_frame),
        ] {
            if frame.trim().is_empty() {
                return Err(MapperError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }
        self.registration.validate()
    }

    /// Default log level implied by `verbosity_level`.
    pub fn log_level_filter(&self) -> LevelFilter {
        match self.verbosity_level {
            0 => LevelFilter::ERROR,
            1 => LevelFilter::WARN,
            2 => LevelFilter::INFO,
            3 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
