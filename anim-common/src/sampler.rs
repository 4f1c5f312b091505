//! Transform sampler
//!
//! Decoders hand over per-track frame data either frame-major (one snapshot of
//! every track per frame) or track-major (every frame of one track). The
//! sampler exposes a single track-major view of both.

use std::cell::OnceCell;

use serde::Deserialize;

use crate::transform::FrameTransform;

/// Layout of decoded transform samples
///
/// Deserializes from `{ "frame_major": [[...], ...] }` or `{ "track_major": [[...], ...] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSamples {
    /// `samples[frame][track]`
    FrameMajor(Vec<Vec<FrameTransform>>),
    /// `samples[track][frame]`
    TrackMajor(Vec<Vec<FrameTransform>>),
}

/// Track-major view over decoded animation samples
#[derive(Debug)]
pub struct TransformSampler {
    source: TrackSamples,
    transposed: OnceCell<Vec<Vec<FrameTransform>>>,
}

impl TransformSampler {
    pub fn new(source: TrackSamples) -> Self {
        Self {
            source,
            transposed: OnceCell::new(),
        }
    }

    pub fn frame_major(frames: Vec<Vec<FrameTransform>>) -> Self {
        Self::new(TrackSamples::FrameMajor(frames))
    }

    pub fn track_major(tracks: Vec<Vec<FrameTransform>>) -> Self {
        Self::new(TrackSamples::TrackMajor(tracks))
    }

    /// Frames of one track, in frame order. Empty if the track has no data.
    pub fn frames_for(&self, track_index: usize) -> &[FrameTransform] {
        self.tracks()
            .get(track_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tracks with at least one slot in the source data
    pub fn track_count(&self) -> usize {
        self.tracks().len()
    }

    fn tracks(&self) -> &[Vec<FrameTransform>] {
        match &self.source {
            TrackSamples::TrackMajor(tracks) => tracks,
            TrackSamples::FrameMajor(frames) => self.transposed.get_or_init(|| transpose(frames)),
        }
    }
}

/// Convert `frames[frame][track]` into `tracks[track][frame]`.
///
/// A track stops at the first snapshot that lacks an entry for it, so every
/// track stays a contiguous run starting at frame 0.
fn transpose(frames: &[Vec<FrameTransform>]) -> Vec<Vec<FrameTransform>> {
    let track_count = frames.iter().map(Vec::len).max().unwrap_or(0);
    (0..track_count)
        .map(|track| {
            frames
                .iter()
                .map_while(|snapshot| snapshot.get(track).copied())
                .collect()
        })
        .collect()
}
