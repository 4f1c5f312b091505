//! anim-export library
//!
//! Batch conversion of decoded skeleton / animation object dumps into glTF or
//! COLLADA scenes. The binary in `main.rs` is a thin CLI over these modules.

pub mod batch;
pub mod config;
pub mod decode;
pub mod formats;
pub mod inspect;

pub use batch::{BatchOptions, BatchReport, ItemError};
pub use config::{ConvertConfig, ExportSettings};
pub use decode::{DecodeError, DecodedObject, JsonObjectDecoder, ObjectDecoder};
pub use formats::{DaeExporter, ExportFormat, GltfExporter, SceneExporter};
