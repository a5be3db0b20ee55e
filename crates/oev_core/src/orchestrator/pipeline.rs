//! Catalog of the steps a run can choose from.

use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;

/// Ordered set of available steps.
///
/// A run executes a selection out of the catalog; the catalog order is the
/// canonical order used when everything is selected.
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// All steps in canonical order.
    pub fn steps(&self) -> Vec<Arc<dyn PipelineStep>> {
        self.steps.clone()
    }

    /// Look up steps by name, keeping the caller's order.
    ///
    /// Matching ignores ASCII case. Duplicates are left for the runner to
    /// reject.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> PipelineResult<Vec<Arc<dyn PipelineStep>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                self.steps
                    .iter()
                    .find(|s| s.name().eq_ignore_ascii_case(name))
                    .cloned()
                    .ok_or_else(|| PipelineError::unknown_step(name))
            })
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::StepResult;
    use crate::orchestrator::types::{StepContext, StepOutcome};

    struct NamedStep(&'static str);

    impl PipelineStep for NamedStep {
        fn name(&self) -> &str {
            self.0
        }

        fn execute(&self, _ctx: &StepContext) -> StepResult<StepOutcome> {
            Ok(StepOutcome::Success)
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new()
            .with_step(NamedStep("Transcribe"))
            .with_step(NamedStep("Generate TTS Audio"))
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = pipeline();
        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Transcribe", "Generate TTS Audio"]);
    }

    #[test]
    fn select_keeps_caller_order() {
        let selected = pipeline()
            .select(&["generate tts audio", "Transcribe"])
            .unwrap();
        let names: Vec<_> = selected.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["Generate TTS Audio", "Transcribe"]);
    }

    #[test]
    fn select_rejects_unknown_names() {
        let err = pipeline().select(&["Mux"]).err().unwrap();
        assert!(matches!(err, PipelineError::UnknownStep { .. }));
    }
}
