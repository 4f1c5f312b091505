//! Decoded object sets (skeleton / animation / binding)
//!
//! A source file decodes to an ordered list of objects. Converters pick the
//! first object of each kind they need, in file order.
//!
//! The bundled [`JsonObjectDecoder`] reads object dumps of the form:
//!
//! ```json
//! { "objects": [
//!     { "type": "skeleton", "bones": [{ "name": "Root" }], "parent_indices": [-1],
//!       "reference_pose": [{ "translation": [0, 0, 0], "rotation": [0, 0, 0, 1] }] },
//!     { "type": "animation", "duration": 1.0, "samples": { "frame_major": [
//!       [{ "translation": [0, 0, 0], "rotation": [0, 0, 0, 1] }]
//!     ] } },
//!     { "type": "animation_binding", "transform_track_to_bone_indices": [0] }
//! ] }
//! ```

use std::path::{Path, PathBuf};

use anim_common::{
    AnimationBinding, ConvertError, FrameTransform, Skeleton, TrackSamples, TransformSampler,
};
use serde::Deserialize;

/// Failure to turn a source file into objects
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of decoded objects, passed explicitly to the batch driver
pub trait ObjectDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<DecodedObject>, DecodeError>;
}

/// One object found in a source file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedObject {
    Skeleton(SkeletonObject),
    Animation(AnimationObject),
    AnimationBinding(BindingObject),
}

/// Skeleton as decoded: names, parents and reference pose aligned by bone index
#[derive(Debug, Clone, Deserialize)]
pub struct SkeletonObject {
    #[serde(default)]
    pub name: Option<String>,
    pub bones: Vec<BoneEntry>,
    pub parent_indices: Vec<i16>,
    pub reference_pose: Vec<FrameTransform>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoneEntry {
    pub name: String,
}

impl SkeletonObject {
    pub fn to_skeleton(&self) -> Result<Skeleton, ConvertError> {
        let names: Vec<String> = self.bones.iter().map(|b| b.name.clone()).collect();
        Skeleton::build(&names, &self.reference_pose, &self.parent_indices)
    }
}

/// Animation as decoded: transform samples in either layout
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationObject {
    #[serde(default)]
    pub name: Option<String>,
    /// Duration in seconds, informational only
    #[serde(default)]
    pub duration: f32,
    pub samples: TrackSamples,
}

impl AnimationObject {
    pub fn sampler(&self) -> TransformSampler {
        TransformSampler::new(self.samples.clone())
    }

    pub fn layout(&self) -> &'static str {
        match self.samples {
            TrackSamples::FrameMajor(_) => "frame-major",
            TrackSamples::TrackMajor(_) => "track-major",
        }
    }
}

/// Track to bone mapping as decoded
#[derive(Debug, Clone, Deserialize)]
pub struct BindingObject {
    #[serde(default)]
    pub animation: Option<String>,
    pub transform_track_to_bone_indices: Vec<i16>,
}

impl BindingObject {
    pub fn to_binding(&self) -> AnimationBinding {
        AnimationBinding::new(self.transform_track_to_bone_indices.clone())
    }
}

pub fn first_skeleton(objects: &[DecodedObject]) -> Option<&SkeletonObject> {
    objects.iter().find_map(|o| match o {
        DecodedObject::Skeleton(s) => Some(s),
        _ => None,
    })
}

pub fn first_animation(objects: &[DecodedObject]) -> Option<&AnimationObject> {
    objects.iter().find_map(|o| match o {
        DecodedObject::Animation(a) => Some(a),
        _ => None,
    })
}

pub fn first_binding(objects: &[DecodedObject]) -> Option<&BindingObject> {
    objects.iter().find_map(|o| match o {
        DecodedObject::AnimationBinding(b) => Some(b),
        _ => None,
    })
}

#[derive(Deserialize)]
struct ObjectDump {
    objects: Vec<DecodedObject>,
}

/// Reads JSON object dumps
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectDecoder;

impl JsonObjectDecoder {
    pub fn decode_slice(
        &self,
        path: &Path,
        bytes: &[u8],
    ) -> Result<Vec<DecodedObject>, DecodeError> {
        let dump: ObjectDump =
            serde_json::from_slice(bytes).map_err(|source| DecodeError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(dump.objects)
    }
}

impl ObjectDecoder for JsonObjectDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<DecodedObject>, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_slice(path, &bytes)
    }
}
