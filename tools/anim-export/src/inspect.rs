//! `inspect` command: list the objects a source file decodes to

use std::path::Path;

use anyhow::{Context, Result};

use crate::decode::{AnimationObject, BindingObject, DecodedObject, ObjectDecoder, SkeletonObject};

/// Object counts found in one file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InspectSummary {
    pub skeletons: usize,
    pub animations: usize,
    pub bindings: usize,
}

/// Decode `path` and log every skeleton, animation and binding in it
pub fn inspect_file(decoder: &dyn ObjectDecoder, path: &Path) -> Result<InspectSummary> {
    let objects = decoder
        .decode(path)
        .with_context(|| format!("Failed to inspect {:?}", path))?;

    tracing::info!("{:?}: {} objects", path, objects.len());
    let mut summary = InspectSummary::default();
    for (index, object) in objects.iter().enumerate() {
        match object {
            DecodedObject::Skeleton(skeleton) => {
                summary.skeletons += 1;
                log_skeleton(index, skeleton);
            }
            DecodedObject::Animation(animation) => {
                summary.animations += 1;
                log_animation(index, animation);
            }
            DecodedObject::AnimationBinding(binding) => {
                summary.bindings += 1;
                log_binding(index, binding);
            }
        }
    }

    if summary.animations == 0 && summary.skeletons == 0 {
        tracing::warn!("No skeleton or animation objects in {:?}", path);
    }
    Ok(summary)
}

fn log_skeleton(index: usize, object: &SkeletonObject) {
    tracing::info!(
        "  [{}] skeleton '{}': {} bones",
        index,
        object.name.as_deref().unwrap_or("unnamed"),
        object.bones.len()
    );
    match object.to_skeleton() {
        Ok(skeleton) => {
            tracing::info!("      root: '{}'", skeleton.root().name);
            for bone in skeleton.bones() {
                let parent = bone
                    .parent()
                    .and_then(|p| skeleton.bone(p))
                    .map(|p| p.name.as_str())
                    .unwrap_or("-");
                tracing::debug!("      '{}' <- '{}'", bone.name, parent);
            }
        }
        Err(err) => tracing::warn!("      invalid skeleton: {}", err),
    }
}

fn log_animation(index: usize, object: &AnimationObject) {
    let sampler = object.sampler();
    let frames = sampler.frames_for(0).len();
    tracing::info!(
        "  [{}] animation '{}': {}, {} tracks, {} frames, {:.3}s",
        index,
        object.name.as_deref().unwrap_or("unnamed"),
        object.layout(),
        sampler.track_count(),
        frames,
        object.duration
    );
}

fn log_binding(index: usize, object: &BindingObject) {
    tracing::info!(
        "  [{}] binding{}: {} tracks -> bones {:?}",
        index,
        object
            .animation
            .as_deref()
            .map(|a| format!(" for '{}'", a))
            .unwrap_or_default(),
        object.transform_track_to_bone_indices.len(),
        object.transform_track_to_bone_indices
    );
}
