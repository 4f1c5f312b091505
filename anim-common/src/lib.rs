//! anim-common - skeletal animation conversion core
//!
//! Turns a skeleton, an animation binding and per-track transform samples into
//! an interchange [`Scene`]: a bone hierarchy plus one animation block with
//! position, scale and rotation channels per animated bone.
//!
//! Everything here is pure and synchronous. Decoding source files and writing
//! export formats live in the `anim-export` tool.

pub mod binding;
pub mod error;
pub mod rotation;
pub mod sampler;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use binding::AnimationBinding;
pub use error::{ConvertError, Result};
pub use rotation::{EulerAngles, euler_channel_values, normalize_rotation, quat_to_euler_xyz};
pub use sampler::{TrackSamples, TransformSampler};
pub use scene::{
    Channel, ChannelGroup, ChannelKind, Keyframe, RotationMode, Scene, SceneAnimation, SceneBone,
    SceneSkeleton, assemble,
};
pub use skeleton::{Bone, NO_PARENT, Skeleton};
pub use transform::FrameTransform;
