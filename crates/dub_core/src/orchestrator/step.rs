//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// Steps are responsible for their own resume behavior: when the
/// artifacts a step produces already exist in the job directory,
/// `execute` should return `StepOutcome::Skipped` instead of redoing
/// the work.
pub trait PipelineStep: Send + Sync {
    /// Step name, used for logging and error context.
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Execute the step's main work, recording results in `state`.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Validate outputs after `execute` returned `Success`.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopStep;

    impl PipelineStep for NoopStep {
        fn name(&self) -> &str {
            "Noop"
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(NoopStep);
        assert_eq!(step.name(), "Noop");
    }
}
