//! Engine configuration, loaded from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fog::DEFAULT_FOG_RADIUS;
use crate::mapgen::MapGenConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chebyshev radius each unit and city reveals.
    #[serde(default = "default_fog_radius")]
    pub fog_radius: i32,

    /// Turns a worker spends on a road.
    #[serde(default = "default_road_build_turns")]
    pub road_build_turns: u8,

    /// Seed for combat rolls. Unset means a fresh, unseeded stream.
    pub combat_seed: Option<u64>,

    /// Unit data ids every player starts with, placed on their start tile.
    #[serde(default = "default_starting_units")]
    pub starting_units: Vec<String>,

    pub mapgen: MapGenConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fog_radius: default_fog_radius(),
            road_build_turns: default_road_build_turns(),
            combat_seed: None,
            starting_units: default_starting_units(),
            mapgen: MapGenConfig::default(),
        }
    }
}

fn default_fog_radius() -> i32 {
    DEFAULT_FOG_RADIUS
}
fn default_road_build_turns() -> u8 {
    2
}
fn default_starting_units() -> Vec<String> {
    vec!["settler".to_string(), "warrior".to_string()]
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
}
