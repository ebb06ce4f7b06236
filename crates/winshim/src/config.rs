//! Configuration system
//!
//! [`ShimConfig`] carries the OpenGL context hints the native backends apply
//! before creating windows, plus the sizes of the event queue and error trace.
//! Any [`Config`] type can be loaded from or saved to TOML or RON files.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::error::DEFAULT_TRACE_CAPACITY;

/// Initial capacity of the callback backends' event queue
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 16;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match format {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
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

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// OpenGL context hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlConfig {
    /// Requested context major version
    pub major_version: u32,
    /// Requested context minor version
    pub minor_version: u32,
    /// Request a core profile context
    pub core_profile: bool,
    /// Red channel bits
    pub red_bits: u32,
    /// Green channel bits
    pub green_bits: u32,
    /// Blue channel bits
    pub blue_bits: u32,
    /// Alpha channel bits
    pub alpha_bits: u32,
    /// Depth buffer bits
    pub depth_bits: u32,
    /// Stencil buffer bits
    pub stencil_bits: u32,
    /// Swap interval applied after a context is made current (1 = vsync)
    pub swap_interval: u32,
}

impl Default for GlConfig {
    fn default() -> Self {
        Self {
            major_version: 3,
            minor_version: 3,
            core_profile: true,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            swap_interval: 1,
        }
    }
}

/// Top-level shim configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// OpenGL context hints
    pub gl: GlConfig,
    /// Initial capacity of the event queue (it grows on demand)
    pub event_queue_capacity: usize,
    /// Capacity of the error trace in bytes
    pub error_trace_capacity: usize,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            gl: GlConfig::default(),
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            error_trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}

impl Config for ShimConfig {}
