//! Video time plan types.
//!
//! The plan is the re-timer's output contract with the muxing
//! collaborator: either a verbatim stream copy or an ordered list of
//! regions, each independently trimmed from the source video with its
//! presentation timestamps scaled by `pts_factor`.

use serde::{Deserialize, Serialize};

use crate::models::RegionKind;

/// One contiguous stretch of source video with a playback-speed ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Start in the source video (seconds).
    pub source_start: f64,
    /// End in the source video (seconds).
    pub source_end: f64,
    /// Ratio by which presentation timestamps are scaled; >1 slows down.
    pub pts_factor: f64,
    /// Region classification.
    pub kind: RegionKind,
}

impl Region {
    /// Create a region.
    pub fn new(source_start: f64, source_end: f64, pts_factor: f64, kind: RegionKind) -> Self {
        Self {
            source_start,
            source_end,
            pts_factor,
            kind,
        }
    }

    /// Duration of the region in the source video.
    pub fn source_duration(&self) -> f64 {
        self.source_end - self.source_start
    }

    /// Duration of the region after time remapping.
    pub fn output_duration(&self) -> f64 {
        self.source_duration() * self.pts_factor
    }
}

/// Output of the video re-timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum VideoTimePlan {
    /// Verbatim passthrough; the muxer may stream-copy without re-encoding.
    Copy,
    /// Ordered piecewise time remap.
    Remap { regions: Vec<Region> },
}

impl VideoTimePlan {
    /// Whether this plan is the stream-copy fast path.
    pub fn is_copy(&self) -> bool {
        matches!(self, VideoTimePlan::Copy)
    }

    /// The regions of a remap plan (empty for `Copy`).
    pub fn regions(&self) -> &[Region] {
        match self {
            VideoTimePlan::Copy => &[],
            VideoTimePlan::Remap { regions } => regions,
        }
    }

    /// Total output duration implied by the plan.
    ///
    /// For `Copy` this is the unchanged source duration. This value is
    /// the correctness contract with the mastered audio track.
    pub fn output_duration(&self, source_video_duration: f64) -> f64 {
        match self {
            VideoTimePlan::Copy => source_video_duration,
            VideoTimePlan::Remap { regions } => {
                regions.iter().map(Region::output_duration).sum()
            }
        }
    }
}
