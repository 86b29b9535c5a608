//! The adaptive timeline synchronization engine.
//!
//! The audio pacer places synthesized clips on a continuous output track,
//! stretching each within configured bounds against a global drift budget.
//! The video re-timer turns the resulting segment timing into a piecewise
//! time-remap plan for the muxing collaborator (or recognizes the
//! stream-copy fast path).

pub mod filtergraph;
pub mod pacer;
pub mod plan;
pub mod retime;

pub use pacer::{pace, ClipSource, PacedTrack, PacingReport, WavDirClips};
pub use plan::{Region, VideoTimePlan};
pub use retime::{build_time_plan, PlanError, PostProcessing, PTS_EPSILON};
