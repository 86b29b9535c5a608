//! Master step: loudness-normalizes the vocal track, mixes in the
//! instrumental bed, and writes the final audio deliverable.

use crate::audio::io;
use crate::mastering::master_track;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, MasterOutput, StepOutcome};

pub struct MasterStep;

impl PipelineStep for MasterStep {
    fn name(&self) -> &str {
        "Master"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let vocal = ctx.vocal_track_path();
        if !vocal.exists() {
            return Err(StepError::file_not_found(vocal.display().to_string()));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if state.master.is_some() && ctx.final_audio_path().exists() {
            return Ok(StepOutcome::Skipped("final audio already mastered".into()));
        }

        let sample_rate = ctx.settings.audio.sample_rate;
        let vocal = io::decode_audio(&ctx.vocal_track_path(), sample_rate)?;

        // The instrumental bed is optional; separation may not have run.
        let instrumental = if ctx.instrumental_path().exists() {
            Some(io::decode_audio(&ctx.instrumental_path(), sample_rate)?)
        } else {
            ctx.logger.info("No instrumental bed found, vocal only");
            None
        };

        // Pad out to the planned video length so audio never runs short.
        let plan_duration = state
            .retime
            .as_ref()
            .map(|r| r.output_duration)
            .unwrap_or(0.0);

        let (track, report) = master_track(
            vocal,
            instrumental,
            plan_duration,
            &ctx.settings.audio,
        );

        match report.measured_lufs {
            Some(lufs) => ctx.logger.info(&format!(
                "Measured {:.2} LUFS, normalized to {:.2} LUFS",
                lufs, ctx.settings.audio.target_lufs
            )),
            None => ctx
                .logger
                .warn("Loudness unmeasurable, normalization skipped"),
        }

        io::encode_wav(&track, &ctx.final_audio_path())?;

        state.master = Some(MasterOutput {
            output_path: ctx.final_audio_path(),
            report,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        if !ctx.final_audio_path().exists() {
            return Err(StepError::invalid_output("Final audio was not written"));
        }
        match &state.master {
            Some(out) if out.report.final_secs > 0.0 => Ok(()),
            Some(_) => Err(StepError::invalid_output("Mastered track is empty")),
            None => Err(StepError::invalid_output("Master result not recorded")),
        }
    }
}
