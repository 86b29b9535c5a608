//! Job orchestration: the step pipeline that turns a recognized,
//! translated, synthesized timeline into the dubbed deliverables.

pub mod errors;
pub mod pipeline;
pub mod step;
pub mod steps;
pub mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{MasterStep, PaceStep, RetimeStep};
pub use types::{
    Context, JobState, MasterOutput, PacingOutput, ProgressCallback, RetimeOutput, StepOutcome,
    VideoPlanFile,
};

/// The standard dubbing pipeline: pace, retime, master.
pub fn standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(PaceStep)
        .with_step(RetimeStep)
        .with_step(MasterStep)
}
