//! Export formats for assembled scenes
//!
//! - glTF 2.0 (`.gltf`, quaternion rotation channels)
//! - COLLADA 1.4.1 (`.dae`, Euler rotation channels)

pub mod dae;
pub mod gltf;

use anim_common::{RotationMode, Scene};
use anyhow::Result;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::config::ExportSettings;

pub use self::dae::DaeExporter;
pub use self::gltf::GltfExporter;

/// Target interchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Gltf,
    Dae,
}

impl ExportFormat {
    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Dae => "dae",
        }
    }

    /// Rotation representation the format expects
    pub fn rotation_mode(self) -> RotationMode {
        match self {
            Self::Gltf => RotationMode::Quaternion,
            Self::Dae => RotationMode::Euler,
        }
    }

    pub fn exporter(self) -> Box<dyn SceneExporter> {
        match self {
            Self::Gltf => Box::new(GltfExporter),
            Self::Dae => Box::new(DaeExporter),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gltf => f.write_str("GLTF"),
            Self::Dae => f.write_str("DAE"),
        }
    }
}

/// Writes a scene to a file
pub trait SceneExporter {
    fn export(&self, scene: &Scene, output: &Path, settings: &ExportSettings) -> Result<()>;
}

/// Sanitize a name for use as an XML id / URI fragment
pub(crate) fn sanitize_id(name: &str) -> String {
    let out: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() { "id".to_string() } else { out }
}
