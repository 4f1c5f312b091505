//! Export settings and the optional TOML config file
//!
//! ```toml
//! [export]
//! format = "gltf"            # or "dae"
//! frame_rate = 30.0
//! compatibility_mode = true
//! export_animations = true
//!
//! [input]
//! extension = "anmb"
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::formats::ExportFormat;

/// Default frame rate used to turn frame indices into seconds
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Extension searched for when the animation input is a directory
pub const DEFAULT_ANIMATION_EXTENSION: &str = "anmb";

/// Settings handed to an exporter alongside the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// Write the animation block (otherwise only the bone hierarchy)
    pub export_animations: bool,
    /// Frames per second; only used to convert frame indices to key times
    pub frame_rate: f32,
    /// Emit extra structure DCC importers expect (e.g. a glTF skin over the bones)
    pub compatibility_mode: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            export_animations: true,
            frame_rate: DEFAULT_FRAME_RATE,
            compatibility_mode: true,
        }
    }
}

/// Parsed config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub input: InputSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    pub format: Option<ExportFormat>,
    pub frame_rate: Option<f32>,
    pub compatibility_mode: Option<bool>,
    pub export_animations: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    /// Animation file extension, without the dot
    pub extension: Option<String>,
}

impl ConvertConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.export.frame_rate
            && (!rate.is_finite() || rate <= 0.0)
        {
            bail!("frame_rate must be a positive number, got {}", rate);
        }
        if let Some(ext) = &self.input.extension {
            let bare = trim_extension(ext);
            if bare.is_empty() || bare.contains(['/', '\\']) {
                bail!("invalid input extension {:?}", ext);
            }
        }
        Ok(())
    }

    /// Settings with config values applied over the defaults
    pub fn export_settings(&self) -> ExportSettings {
        let defaults = ExportSettings::default();
        ExportSettings {
            export_animations: self
                .export
                .export_animations
                .unwrap_or(defaults.export_animations),
            frame_rate: self.export.frame_rate.unwrap_or(defaults.frame_rate),
            compatibility_mode: self
                .export
                .compatibility_mode
                .unwrap_or(defaults.compatibility_mode),
        }
    }

    pub fn animation_extension(&self) -> &str {
        self.input
            .extension
            .as_deref()
            .map(trim_extension)
            .unwrap_or(DEFAULT_ANIMATION_EXTENSION)
    }
}

/// Extension as written in the config, minus any leading dots
fn trim_extension(ext: &str) -> &str {
    ext.trim_start_matches('.')
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<ConvertConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    ConvertConfig::parse(&text).with_context(|| format!("Invalid config: {:?}", path))
}
