// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sandbox settings.
//!
//! Settings are stored in RON. Every field has a default, so a settings file
//! only needs to name what it changes:
//!
//! ```ron
//! SandboxConfig(
//!     version: 1,
//!     frames: 10,
//!     color: ColorSettings(base_color: (0.2, 0.6, 1.0)),
//! )
//! ```

use crate::filters::Axis;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// How compiled shaders are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Annotated GLSL text
    #[default]
    Glsl,
    /// One JSON document with sources and per-frame uniforms
    Json,
}

impl OutputFormat {
    /// Parse a command line value
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "glsl" => Some(Self::Glsl),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A time-driven filter in the animation stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterSettings {
    /// Wave-shaped squeeze along x
    Squeeze { frequency: f32 },
    /// Pulsing scale
    Scale { axis: Axis, frequency: f32 },
    /// Swaying offset
    Move {
        axis: Axis,
        frequency: f32,
        amplitude: f32,
    },
}

/// Settings for the vertex animation stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Filters, applied in order
    pub filters: Vec<FilterSettings>,
    /// Drive every filter from one named clock instead of one clock each
    pub shared_clock: Option<String>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            filters: vec![
                FilterSettings::Squeeze { frequency: 0.8 },
                FilterSettings::Scale {
                    axis: Axis::X,
                    frequency: 0.2,
                },
                FilterSettings::Scale {
                    axis: Axis::Y,
                    frequency: 0.2,
                },
                FilterSettings::Scale {
                    axis: Axis::Z,
                    frequency: 0.1,
                },
                FilterSettings::Move {
                    axis: Axis::X,
                    frequency: 0.8,
                    amplitude: 0.8,
                },
                FilterSettings::Move {
                    axis: Axis::Y,
                    frequency: 0.6,
                    amplitude: 0.5,
                },
                FilterSettings::Move {
                    axis: Axis::Z,
                    frequency: 0.3,
                    amplitude: 0.8,
                },
            ],
            shared_clock: None,
        }
    }
}

/// Settings for the color stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Base color fed into the stack
    pub base_color: [f32; 3],
    /// Rim highlight color (values above 1.0 overdrive)
    pub highlight: [f32; 3],
    /// Blend between base and highlight
    pub mix_amount: f32,
    /// Exponent of the fresnel rim
    pub fresnel_power: f32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            // hotpink
            base_color: [1.0, 0.412, 0.706],
            highlight: [2.0, 2.0, 2.0],
            mix_amount: 0.5,
            fresnel_power: 2.0,
        }
    }
}

/// Complete sandbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Settings format version
    pub version: u32,
    /// Frames to simulate after compiling
    pub frames: u32,
    /// Seconds per simulated frame
    pub frame_delta: f64,
    /// Output format
    pub format: OutputFormat,
    /// Vertex animation
    pub animation: AnimationSettings,
    /// Fragment color
    pub color: ColorSettings,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            frames: 3,
            frame_delta: 1.0 / 60.0,
            format: OutputFormat::default(),
            animation: AnimationSettings::default(),
            color: ColorSettings::default(),
        }
    }
}

impl SandboxConfig {
    /// Parse settings from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: SandboxConfig = ron::from_str(content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        if !(config.frame_delta.is_finite() && config.frame_delta >= 0.0) {
            return Err(ConfigError::InvalidFrameDelta(config.frame_delta));
        }

        Ok(config)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Render settings as pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

/// Error when loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for these settings
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::de::SpannedError),

    /// Settings could not be serialized
    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// File was written by a newer sandbox
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// Frame delta must be a non-negative number of seconds
    #[error("Invalid frame delta: {0}")]
    InvalidFrameDelta(f64),
}
