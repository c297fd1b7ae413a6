//! Blending configuration loaded from ~/.crossfade/config.yaml.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::Geometry;

/// Blending options loaded from YAML.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlendConfig {
    /// Mix between straight-line and spherical blending: 0.0 keeps
    /// plain lerp, 1.0 follows the sphere.
    #[serde(default)]
    pub slerp_scale: f64,
    /// Angle threshold below which spherical blending falls back to
    /// lerp (nearly parallel vectors make slerp unstable).
    #[serde(default = "BlendConfig::default_slerp_epsilon")]
    pub slerp_epsilon: f64,
    /// Adjacent schedule entries merge when no component differs by
    /// more than this.
    #[serde(default)]
    pub merge_tolerance: f32,
}

impl BlendConfig {
    /// Load config from the standard path (~/.crossfade/config.yaml).
    /// Returns None if the file doesn't exist (graceful fallback).
    pub fn load() -> Option<Self> {
        let home = dirs::home_dir()?;
        let path = home.join(".crossfade").join("config.yaml");
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            slerp_scale: self.slerp_scale,
            slerp_epsilon: self.slerp_epsilon,
        }
    }

    fn default_slerp_epsilon() -> f64 {
        0.0001
    }
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            slerp_scale: 0.0,
            slerp_epsilon: Self::default_slerp_epsilon(),
            merge_tolerance: 0.0,
        }
    }
}
