//! Scene assembly (skeleton + binding + samples -> Scene)

use crate::binding::AnimationBinding;
use crate::error::{ConvertError, Result};
use crate::rotation::euler_channel_values;
use crate::sampler::TransformSampler;
use crate::skeleton::Skeleton;
use crate::transform::FrameTransform;

use super::{
    Channel, ChannelGroup, ChannelKind, RotationMode, Scene, SceneAnimation, SceneBone,
    SceneSkeleton,
};

/// Track whose length sets the animation's nominal frame count
const NOMINAL_TRACK: usize = 0;

/// Build a scene holding the skeleton hierarchy and one animation block.
///
/// One channel group is emitted per bound track that has samples; tracks with no
/// samples are skipped. The animation spans the frame count of track 0, and each
/// group is keyed for at most that many frames.
pub fn assemble(
    skeleton: &Skeleton,
    binding: &AnimationBinding,
    sampler: &TransformSampler,
    rotation_mode: RotationMode,
    animation_name: &str,
) -> Result<Scene> {
    let root_bone = build_bone(skeleton, skeleton.root_index());

    let track_bones = binding.resolve(skeleton.len())?;

    let frame_count = sampler.frames_for(NOMINAL_TRACK).len();
    if frame_count == 0 {
        return Err(ConvertError::IndexOutOfRange {
            track: NOMINAL_TRACK,
            what: "track data",
            index: NOMINAL_TRACK as i64,
            len: sampler.track_count(),
        });
    }

    let mut groups = Vec::with_capacity(track_bones.len());
    for (track, &bone_index) in track_bones.iter().enumerate() {
        let bone_name = &skeleton.bones()[bone_index].name;
        let frames = sampler.frames_for(track);

        if frames.is_empty() {
            tracing::debug!("Track {} ('{}') has no samples, skipping", track, bone_name);
            continue;
        }

        if frames.len() > frame_count {
            tracing::warn!(
                "Track {} ('{}') has {} frames, truncating to {}",
                track,
                bone_name,
                frames.len(),
                frame_count
            );
        }

        let keyed = &frames[..frames.len().min(frame_count)];
        groups.push(build_group(bone_index, bone_name, keyed, rotation_mode));
    }

    let animation = SceneAnimation {
        name: animation_name.to_string(),
        start_frame: 0,
        end_frame: (frame_count - 1) as u32,
        groups,
    };

    tracing::debug!(
        "Assembled '{}': {} bones, {} groups, {} frames",
        animation.name,
        skeleton.len(),
        animation.groups.len(),
        frame_count
    );

    Ok(Scene {
        name: "Scene".to_string(),
        model_name: "Model".to_string(),
        skeleton: SceneSkeleton {
            root_bones: vec![root_bone],
        },
        animation,
        rotation_mode,
    })
}

fn build_bone(skeleton: &Skeleton, index: usize) -> SceneBone {
    let bone = &skeleton.bones()[index];
    SceneBone {
        bone_index: index,
        name: bone.name.clone(),
        translation: bone.reference_translation,
        rotation: bone.reference_rotation,
        scale: bone.reference_scale,
        children: skeleton
            .children(index)
            .iter()
            .map(|&child| build_bone(skeleton, child))
            .collect(),
    }
}

fn build_group(
    bone_index: usize,
    bone_name: &str,
    frames: &[FrameTransform],
    rotation_mode: RotationMode,
) -> ChannelGroup {
    let mut position = ChannelKind::POSITION.map(Channel::new);
    let mut scale = ChannelKind::SCALE.map(Channel::new);

    for (f, transform) in frames.iter().enumerate() {
        let frame = f as u32;
        for (channel, value) in position.iter_mut().zip(transform.translation.to_array()) {
            channel.insert_keyframe(frame, value);
        }
        for (channel, value) in scale.iter_mut().zip(transform.scale.to_array()) {
            channel.insert_keyframe(frame, value);
        }
    }

    let mut channels: Vec<Channel> = position.into_iter().chain(scale).collect();

    match rotation_mode {
        RotationMode::Euler => {
            let mut euler = ChannelKind::EULER.map(Channel::new);
            for (f, transform) in frames.iter().enumerate() {
                let values = euler_channel_values(transform.rotation);
                for (channel, value) in euler.iter_mut().zip(values) {
                    channel.insert_keyframe(f as u32, value);
                }
            }
            // Z, Y, X order
            channels.extend(euler.into_iter().rev());
        }
        RotationMode::Quaternion => {
            let mut quat = ChannelKind::QUAT.map(Channel::new);
            for (f, transform) in frames.iter().enumerate() {
                for (channel, value) in quat.iter_mut().zip(transform.rotation.to_array()) {
                    channel.insert_keyframe(f as u32, value);
                }
            }
            channels.extend(quat);
        }
    }

    ChannelGroup {
        bone_index,
        bone_name: bone_name.to_string(),
        channels,
    }
}
