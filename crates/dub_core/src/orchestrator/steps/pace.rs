//! Pace step: places synthesized clips on the output timeline and
//! renders the continuous vocal track.

use crate::audio::{io, FfmpegStretcher};
use crate::models::SegmentStore;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, PacingOutput, StepOutcome};
use crate::timeline::{pace, WavDirClips};

/// Paces the segment timeline against the synthesized clips.
///
/// Writes the vocal track WAV and persists adjusted timings back into
/// the timeline file.
pub struct PaceStep;

impl PipelineStep for PaceStep {
    fn name(&self) -> &str {
        "Pace"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let timeline = ctx.timeline_path();
        if !timeline.exists() {
            return Err(StepError::file_not_found(timeline.display().to_string()));
        }
        if !ctx.clips_dir().is_dir() {
            // Not fatal: every segment degrades to silence substitution.
            ctx.logger.warn(&format!(
                "Clips directory {} missing, all segments will be silence",
                ctx.clips_dir().display()
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if state.has_pacing() && ctx.vocal_track_path().exists() {
            return Ok(StepOutcome::Skipped("vocal track already rendered".into()));
        }

        let mut store = SegmentStore::load(&ctx.timeline_path())?;
        let sample_rate = ctx.settings.audio.sample_rate;

        ctx.logger.info(&format!(
            "Pacing {} segments at {} Hz",
            store.segments().len(),
            sample_rate
        ));

        let clips = WavDirClips::new(ctx.clips_dir(), sample_rate);
        let stretcher = FfmpegStretcher::new();
        let paced = pace(
            store.segments_mut(),
            &clips,
            &stretcher,
            &ctx.settings.timeline,
            sample_rate,
        );

        let report = paced.report;
        if !report.silence_substituted.is_empty() {
            ctx.logger.warn(&format!(
                "{} segments had no usable clip and were replaced with silence: {:?}",
                report.silence_substituted.len(),
                report.silence_substituted
            ));
        }
        if !report.stretch_fallbacks.is_empty() {
            ctx.logger.warn(&format!(
                "Time-stretch fell back to truncate/pad for segments {:?}",
                report.stretch_fallbacks
            ));
        }
        ctx.logger.info(&format!(
            "Inserted {:.2}s of inter-segment silence, track is {:.2}s",
            report.inserted_silence_secs,
            paced.track.duration_secs()
        ));

        io::encode_wav(&paced.track, &ctx.vocal_track_path())?;
        store.save(&ctx.timeline_path())?;

        state.pacing = Some(PacingOutput {
            vocal_track: ctx.vocal_track_path(),
            track_secs: paced.track.duration_secs(),
            report,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        if !ctx.vocal_track_path().exists() {
            return Err(StepError::invalid_output("Vocal track was not written"));
        }
        let store = SegmentStore::load(&ctx.timeline_path())?;
        if !store.all_paced() {
            return Err(StepError::invalid_output(
                "Timeline still has segments without adjusted timing",
            ));
        }
        if state.pacing.is_none() {
            return Err(StepError::invalid_output("Pacing result not recorded"));
        }
        Ok(())
    }
}
