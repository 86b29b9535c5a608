//! Core types for the dubbing pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::mastering::MasterReport;
use crate::timeline::{PacingReport, VideoTimePlan};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Holds the job layout and shared resources steps can read but not
/// modify. Mutable results go in `JobState`.
pub struct Context {
    /// Application settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Job working directory (timeline, clips, intermediate tracks).
    pub job_dir: PathBuf,
    /// Source video the dub is being produced for.
    pub source_video: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        settings: Settings,
        job_name: impl Into<String>,
        job_dir: PathBuf,
        source_video: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            settings,
            job_name: job_name.into(),
            job_dir,
            source_video,
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Segment timeline persisted by the recognition/translation stages.
    pub fn timeline_path(&self) -> PathBuf {
        self.job_dir.join("timeline.json")
    }

    /// Directory of synthesized per-segment clips (`0000.wav`, ...).
    pub fn clips_dir(&self) -> PathBuf {
        self.job_dir.join("clips")
    }

    /// Optional instrumental bed extracted by the separation stage.
    pub fn instrumental_path(&self) -> PathBuf {
        self.job_dir.join("instrumental.wav")
    }

    /// Continuous paced vocal track.
    pub fn vocal_track_path(&self) -> PathBuf {
        self.job_dir.join("vocal_track.wav")
    }

    /// Video time plan handed to the muxing collaborator.
    pub fn video_plan_path(&self) -> PathBuf {
        self.job_dir.join("video_plan.json")
    }

    /// Final mastered audio deliverable.
    pub fn final_audio_path(&self) -> PathBuf {
        self.job_dir.join("audio_final.wav")
    }

    /// Persisted job state, written after each step.
    pub fn state_path(&self) -> PathBuf {
        self.job_dir.join("job_state.json")
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Persisted to the job directory after every step so an interrupted
/// job can resume without redoing finished work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Pacing results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing: Option<PacingOutput>,
    /// Re-timing results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retime: Option<RetimeOutput>,
    /// Mastering results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterOutput>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Load persisted state, or start fresh when none exists.
    pub fn load_or_new(path: &Path, job_id: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Discarding unreadable job state {}: {}", path.display(), e);
                    Self::new(job_id)
                }
            },
            Err(_) => Self::new(job_id),
        }
    }

    /// Persist the state next to the job's other artifacts.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(path, json)
    }

    pub fn has_pacing(&self) -> bool {
        self.pacing.is_some()
    }

    pub fn has_retime(&self) -> bool {
        self.retime.is_some()
    }
}

/// Output from the Pace step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingOutput {
    /// Path to the continuous vocal track.
    pub vocal_track: PathBuf,
    /// Track duration in seconds.
    pub track_secs: f64,
    /// Pacing run summary.
    pub report: PacingReport,
}

/// Output from the Retime step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetimeOutput {
    /// Path to the serialized video time plan.
    pub plan_path: PathBuf,
    /// Whether the stream-copy fast path applies.
    pub stream_copy: bool,
    /// Expected output video duration in seconds.
    pub output_duration: f64,
}

/// Output from the Master step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterOutput {
    /// Path to the final mastered audio.
    pub output_path: PathBuf,
    /// Mastering summary.
    pub report: MasterReport,
}

/// The video plan artifact written for the muxing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPlanFile {
    /// The time plan itself.
    pub plan: VideoTimePlan,
    /// Rendered ffmpeg filtergraph, absent for stream copy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtergraph: Option<String>,
    /// Expected output video duration in seconds.
    pub output_duration: f64,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (work already done, or nothing to do).
    Skipped(String),
}
