//! Configuration system
//!
//! Human-editable settings for the world, the accelerators, and the ray
//! benchmark, loadable from TOML or RON files. The binary scene format is
//! independent of this module.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// World rectangle the scene and its accelerators cover
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World width in world units
    pub width: f32,
    /// World height in world units
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 100.0,
        }
    }
}

/// Accelerator tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Recursion depth of the region quadtree
    pub quadtree_depth: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { quadtree_depth: 4 }
    }
}

/// Ray benchmark parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Number of random shapes to generate
    pub shape_count: usize,
    /// Smallest shape radius
    pub min_radius: f32,
    /// Largest shape radius
    pub max_radius: f32,
    /// Number of random rays per strategy
    pub ray_count: usize,
    /// RNG seed for reproducible runs
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            shape_count: 64,
            min_radius: 2.0,
            max_radius: 6.0,
            ray_count: 1024,
            seed: 1,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SceneEngineConfig {
    /// World rectangle
    pub world: WorldConfig,
    /// Accelerator tuning
    pub spatial: SpatialConfig,
    /// Benchmark parameters
    pub bench: BenchConfig,
}

impl SceneEngineConfig {
    /// Load configuration from a TOML or RON file, chosen by extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            "ron" => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a TOML or RON file, chosen by extension
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let contents = match extension {
            "toml" => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            "ron" => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err("world dimensions must be positive".to_string());
        }
        if self.spatial.quadtree_depth == 0 {
            return Err("quadtree depth must be at least 1".to_string());
        }
        if self.bench.min_radius <= 0.0 || self.bench.max_radius <= self.bench.min_radius {
            return Err("shape radius range must be positive and non-empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SceneEngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SceneEngineConfig::default();
        config.bench.ray_count = 4096;
        config.world.width = 400.0;

        let path = std::env::temp_dir().join(format!("scene_engine_cfg_{}.toml", std::process::id()));
        config.save_to_file(&path).expect("save toml");
        let loaded = SceneEngineConfig::load_from_file(&path).expect("load toml");
        assert_eq!(loaded.bench.ray_count, 4096);
        assert_eq!(loaded.world.width, 400.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = SceneEngineConfig::default();
        config.spatial.quadtree_depth = 5;

        let path = std::env::temp_dir().join(format!("scene_engine_cfg_{}.ron", std::process::id()));
        config.save_to_file(&path).expect("save ron");
        let loaded = SceneEngineConfig::load_from_file(&path).expect("load ron");
        assert_eq!(loaded.spatial.quadtree_depth, 5);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let config = SceneEngineConfig::default();
        let path = std::env::temp_dir().join("scene_engine_cfg.yaml");
        assert!(matches!(
            config.save_to_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let mut config = SceneEngineConfig::default();
        config.bench.max_radius = 1.0; // below min_radius
        assert!(config.validate().is_err());
    }
}
