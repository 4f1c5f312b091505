//! Animation binding: which skeleton bone each animation track drives

use crate::error::{ConvertError, Result};

/// Maps track index (position in the list) to skeleton bone index (value).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationBinding {
    track_to_bone: Vec<i16>,
}

impl AnimationBinding {
    pub fn new(track_to_bone: Vec<i16>) -> Self {
        Self { track_to_bone }
    }

    pub fn track_to_bone(&self) -> &[i16] {
        &self.track_to_bone
    }

    pub fn track_count(&self) -> usize {
        self.track_to_bone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_to_bone.is_empty()
    }

    /// Resolve every track to a bone index, checking range and uniqueness.
    pub fn resolve(&self, bone_count: usize) -> Result<Vec<usize>> {
        if self.track_to_bone.is_empty() {
            return Err(ConvertError::EmptyBinding);
        }

        let mut owner: Vec<Option<usize>> = vec![None; bone_count];
        let mut bones = Vec::with_capacity(self.track_to_bone.len());

        for (track, &raw) in self.track_to_bone.iter().enumerate() {
            let bone = usize::try_from(raw)
                .ok()
                .filter(|&b| b < bone_count)
                .ok_or(ConvertError::IndexOutOfRange {
                    track,
                    what: "bone",
                    index: i64::from(raw),
                    len: bone_count,
                })?;

            if let Some(first_track) = owner[bone] {
                return Err(ConvertError::DuplicateTrackBinding {
                    bone,
                    first_track,
                    track,
                });
            }
            owner[bone] = Some(track);
            bones.push(bone);
        }

        Ok(bones)
    }
}

impl From<Vec<i16>> for AnimationBinding {
    fn from(track_to_bone: Vec<i16>) -> Self {
        Self::new(track_to_bone)
    }
}
