//! Retime step: derives the video time plan from the paced timeline.

use std::fs;

use crate::audio::io;
use crate::models::SegmentStore;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, RetimeOutput, StepOutcome, VideoPlanFile};
use crate::timeline::filtergraph::render_filtergraph;
use crate::timeline::{build_time_plan, PostProcessing};

/// Builds the video time plan and writes it for the muxing collaborator.
pub struct RetimeStep;

impl PipelineStep for RetimeStep {
    fn name(&self) -> &str {
        "Retime"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.source_video.exists() {
            return Err(StepError::file_not_found(
                ctx.source_video.display().to_string(),
            ));
        }
        let store = SegmentStore::load(&ctx.timeline_path())?;
        if !store.all_paced() {
            return Err(StepError::invalid_input(
                "Timeline has unpaced segments, run the pace step first",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if state.has_retime() && ctx.video_plan_path().exists() {
            return Ok(StepOutcome::Skipped("video plan already written".into()));
        }

        let mut store = SegmentStore::load(&ctx.timeline_path())?;
        let source_duration = io::probe_duration(&ctx.source_video)?;
        let post = PostProcessing::from_video_settings(&ctx.settings.video);

        let plan = build_time_plan(
            store.segments_mut(),
            source_duration,
            &ctx.settings.timeline,
            &post,
        )?;
        let output_duration = plan.output_duration(source_duration);

        if plan.is_copy() {
            ctx.logger.info("Video unchanged, plan is a stream copy");
        } else {
            ctx.logger.info(&format!(
                "Video plan has {} regions, output {:.2}s (source {:.2}s)",
                plan.regions().len(),
                output_duration,
                source_duration
            ));
        }

        let artifact = VideoPlanFile {
            filtergraph: render_filtergraph(&plan),
            plan,
            output_duration,
        };
        let json = serde_json::to_string_pretty(&artifact)
            .map_err(|e| StepError::invalid_output(format!("Failed to serialize plan: {}", e)))?;
        fs::write(ctx.video_plan_path(), json)
            .map_err(|e| StepError::io("writing video plan", e))?;

        // pts factors recorded during planning go back into the timeline.
        store.save(&ctx.timeline_path())?;

        state.retime = Some(RetimeOutput {
            plan_path: ctx.video_plan_path(),
            stream_copy: artifact.plan.is_copy(),
            output_duration,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        if !ctx.video_plan_path().exists() {
            return Err(StepError::invalid_output("Video plan was not written"));
        }
        match &state.retime {
            Some(out) if out.output_duration > 0.0 => Ok(()),
            Some(_) => Err(StepError::invalid_output(
                "Planned output duration is not positive",
            )),
            None => Err(StepError::invalid_output("Retime result not recorded")),
        }
    }
}
