/// Settings for the heightmesh command line tool
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// Which kind of mesh to generate from the bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MeshMode {
    /// Luminance-displaced grid ("Mesh From Heightmap")
    Heightmap,
    /// One flat colored quad per pixel ("Mesh From Bitmap")
    Mosaic,
}

impl Default for MeshMode {
    fn default() -> Self {
        MeshMode::Heightmap
    }
}

/// Values read from an optional TOML file. Missing keys keep their defaults.
///
/// ```toml
/// height_scale = 12.5
/// generate_uvs = false
/// max_sample_size = 128
/// debug_mode = true
/// mode = "mosaic"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Elevation given to pure white
    pub height_scale: f32,
    pub generate_uvs: bool,
    /// Down-sample the image so neither side exceeds this many pixels
    pub max_sample_size: Option<u32>,
    pub debug_mode: bool,
    pub mode: MeshMode,
    /// World width the mesh is scaled to; pixel units when unset
    pub world_width: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            height_scale: 30.0,
            generate_uvs: true,
            max_sample_size: None,
            debug_mode: false,
            mode: MeshMode::Heightmap,
            world_width: None,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid settings file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Log filter used when RUST_LOG is not set
    pub fn log_filter(&self) -> &'static str {
        if self.debug_mode {
            "debug"
        } else {
            "info"
        }
    }
}
