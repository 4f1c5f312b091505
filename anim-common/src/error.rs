//! Structural errors raised while building a skeleton or assembling a scene

/// Error type for skeleton construction and scene assembly.
///
/// None of these are recovered inside the library: the caller decides whether
/// a failure aborts one batch item or the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// Skeleton structure is inconsistent (length mismatch, bad parent, cycle)
    #[error("malformed skeleton: {0}")]
    MalformedSkeleton(String),

    /// Reference pose rotation has a zero or non-finite norm
    #[error("bone '{bone}' has a degenerate reference rotation (norm {norm})")]
    DegenerateRotation { bone: String, norm: f32 },

    /// No bone has a parent index of -1
    #[error("skeleton has no root bone")]
    NoRootBone,

    /// Animation binding maps zero tracks
    #[error("animation binding has no tracks")]
    EmptyBinding,

    /// Binding or sampler references something that does not exist
    #[error("track {track} references {what} {index} (available: {len})")]
    IndexOutOfRange {
        track: usize,
        what: &'static str,
        index: i64,
        len: usize,
    },

    /// Two tracks animate the same bone
    #[error("bone {bone} is bound to both track {first_track} and track {track}")]
    DuplicateTrackBinding {
        bone: usize,
        first_track: usize,
        track: usize,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
