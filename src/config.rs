use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number of envelope buckets used when no configuration overrides it.
pub const DEFAULT_BUCKET_COUNT: usize = 120;

/// Tunables for the editor and its host window.
///
/// Every field has a default, so a config file only needs to list the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub bucket_count: usize,
    pub render: RenderConfig,
    /// Milliseconds between drains of the engine's position reports.
    pub tick_interval_ms: u64,
    pub window_width: f32,
    pub window_height: f32,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            render: RenderConfig::default(),
            tick_interval_ms: 16,
            window_width: 1000.0,
            window_height: 360.0,
            log_filter: "info".to_string(),
        }
    }
}

impl TrimConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, falling back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Geometry of the waveform drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fraction of the viewport height a full-scale bar occupies.
    pub bar_height_ratio: f32,
    /// Horizontal gap between neighbouring bars, in logical pixels.
    pub bar_gap: f32,
    pub bar_radius: f32,
    /// Distance from a handle within which a press grabs it.
    pub handle_grab_radius: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bar_height_ratio: 0.85,
            bar_gap: 2.0,
            bar_radius: 2.0,
            handle_grab_radius: 8.0,
        }
    }
}
