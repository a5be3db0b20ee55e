//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{StepContext, StepOutcome};

/// Trait for pipeline steps.
///
/// Steps run on a blocking worker, never on the controller. The runner
/// calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
///
/// An error from either is reported as a failed step and the run moves on
/// to the next one.
///
/// # Example
///
/// ```ignore
/// struct ExtractSlideTextStep { services: Arc<StepServices> }
///
/// impl PipelineStep for ExtractSlideTextStep {
///     fn name(&self) -> &str { "Extract Slide Text (.txt)" }
///
///     fn validate_input(&self, ctx: &StepContext) -> StepResult<()> {
///         let deck = ctx.workspace().deck();
///         if !deck.is_file() {
///             return Err(StepError::file_not_found(deck));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
///         let files = self.services.deck.extract_slide_text(..., ctx)?;
///         ctx.log(&format!("Extracted {} text files to: ..", files.len()));
///         Ok(StepOutcome::Success)
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging, selection and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Default passes.
    fn validate_input(&self, _ctx: &StepContext) -> StepResult<()> {
        Ok(())
    }

    /// Execute the step's main work.
    ///
    /// Log through `ctx` (it implements `LogSink`). Returns
    /// `StepOutcome::Skipped` when there was nothing to do.
    fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome>;

    /// Get a description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}

/// Validate then execute.
pub(crate) fn run_step(step: &dyn PipelineStep, ctx: &StepContext) -> StepResult<StepOutcome> {
    step.validate_input(ctx)?;
    step.execute(ctx)
}
