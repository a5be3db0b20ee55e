//! Sequential step runner with an acknowledgement gate.
//!
//! The runner is the controlling context: it owns the run logger and the
//! progress callback. Each step runs on a blocking worker and talks back
//! through a channel, so only the controller ever touches observer state.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::{run_step, PipelineStep};
use super::types::{
    ProgressCallback, RunEvent, RunReport, RunSession, StepContext, StepOutcome, StepReporter,
};
use crate::config::Settings;
use crate::logging::{LogSink, MessagePrefix, RunLogger};
use crate::workspace::DeckJob;

/// Warning shown when a run is requested before the acknowledgement.
pub const ACKNOWLEDGEMENT_REQUIRED: &str =
    "Please confirm the acknowledgement checkbox before running any steps.";

/// Final line of every run that passed the gate.
pub const RUN_COMPLETE: &str = "All selected steps completed.";

/// Runs selected steps one after another for one deck.
pub struct Orchestrator {
    logger: RunLogger,
    settings: Arc<Settings>,
    job: Arc<DeckJob>,
    progress_callback: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new(logger: RunLogger, settings: Arc<Settings>, job: Arc<DeckJob>) -> Self {
        Self {
            logger,
            settings,
            job,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    pub fn job(&self) -> &DeckJob {
        &self.job
    }

    /// Report progress to callback (if set).
    fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent.min(100), message);
        }
    }

    /// Run `steps` in order.
    ///
    /// Without `acknowledged` nothing runs: a warning is logged and
    /// `PreconditionNotMet` is returned. A failing or panicking step is
    /// logged as `[ERROR]` and the next step still runs. Progress reaches
    /// 100% exactly once, when the run is done.
    pub async fn run(
        &self,
        steps: &[Arc<dyn PipelineStep>],
        acknowledged: bool,
    ) -> PipelineResult<RunReport> {
        if !acknowledged {
            self.logger.warn(ACKNOWLEDGEMENT_REQUIRED);
            return Err(PipelineError::precondition_not_met(ACKNOWLEDGEMENT_REQUIRED));
        }

        let mut seen = HashSet::new();
        if let Some(step) = steps.iter().find(|s| !seen.insert(s.name().to_string())) {
            self.logger
                .error(&format!("Step '{}' was selected more than once", step.name()));
            return Err(PipelineError::duplicate_step(step.name()));
        }

        let mut session = RunSession::new(steps.len());
        let mut report = RunReport::new(&session);
        tracing::info!(
            run_id = %session.run_id,
            steps = steps.len(),
            "Run '{}' started",
            self.logger.run_name()
        );
        self.report_progress("", 0, "Starting");

        for step in steps {
            let name = step.name().to_string();
            self.logger.log(&MessagePrefix::Starting.format(&name));

            match self.dispatch(Arc::clone(step)).await {
                Ok(StepOutcome::Success) => {
                    report.completed.push(name.clone());
                    session.advance();
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    self.logger.info(&format!("{} skipped: {}", name, reason));
                    report.skipped.push(name.clone());
                    session.advance();
                }
                Err(e) => {
                    self.logger.error(&format!("{}: {}", name, e));
                    report.failed.push((name.clone(), e.to_string()));
                    report.error_tail = self.logger.get_tail();
                    continue;
                }
            }

            // The tick that reaches the total is folded into the done event.
            if !session.is_complete() {
                self.report_progress(&name, session.percent(), &format!("{} finished", name));
            }
        }

        session.progress = session.total;
        self.report_progress("Complete", 100, RUN_COMPLETE);
        self.logger.log(&MessagePrefix::Done.format(RUN_COMPLETE));
        self.logger.flush();
        tracing::info!(
            run_id = %session.run_id,
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Run '{}' finished",
            self.logger.run_name()
        );

        Ok(report)
    }

    /// Run one step on a blocking worker and relay its log lines until it
    /// finishes.
    async fn dispatch(&self, step: Arc<dyn PipelineStep>) -> Result<StepOutcome, StepError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = StepContext::new(
            step.name(),
            Arc::clone(&self.settings),
            Arc::clone(&self.job),
            StepReporter::new(tx),
        );

        let worker = tokio::task::spawn_blocking(move || {
            let result = run_step(step.as_ref(), &ctx);
            ctx.reporter().finish(result);
        });

        // The channel closes once the worker drops its context, whether it
        // finished or panicked.
        let mut finished = None;
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Log { line } => self.logger.log(&line),
                RunEvent::Finished { result } => finished = Some(result),
            }
        }

        match worker.await {
            Ok(()) => finished
                .unwrap_or_else(|| Err(StepError::other("step ended without reporting a result"))),
            Err(e) if e.is_panic() => Err(StepError::panicked(panic_message(e.into_panic()))),
            Err(e) => Err(StepError::other(e.to_string())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{init_test_tracing, LogConfig};
    use crate::orchestrator::errors::StepResult;
    use crate::workspace::TranslationDirection;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Skip,
        Fail,
        Panic,
    }

    struct ScriptedStep {
        name: &'static str,
        behaviour: Behaviour,
        execute_count: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl PipelineStep for ScriptedStep {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(&self, ctx: &StepContext) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            self.order.lock().push(self.name);
            ctx.info(&format!("working in {}", ctx.step_name));
            match self.behaviour {
                Behaviour::Succeed => Ok(StepOutcome::Success),
                Behaviour::Skip => Ok(StepOutcome::Skipped("nothing to do".to_string())),
                Behaviour::Fail => Err(StepError::other("model exploded")),
                Behaviour::Panic => panic!("worker blew up"),
            }
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        lines: Arc<Mutex<Vec<String>>>,
        progress: Arc<Mutex<Vec<u32>>>,
        execute_count: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Harness {
        fn new() -> Self {
            init_test_tracing();
            let lines = Arc::new(Mutex::new(Vec::new()));
            let progress = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&lines);
            let logger = RunLogger::new(
                "lecture",
                None,
                LogConfig {
                    show_timestamps: false,
                    ..LogConfig::default()
                },
                Some(Box::new(move |line: &str| sink.lock().push(line.to_string()))),
                None,
            );
            let ticks = Arc::clone(&progress);
            let job = DeckJob::new("/tmp/lecture.pptx", TranslationDirection::default(), "English");
            let orchestrator =
                Orchestrator::new(logger, Arc::new(Settings::default()), Arc::new(job))
                    .with_progress_callback(Box::new(move |_, pct, _| ticks.lock().push(pct)));
            Self {
                orchestrator,
                lines,
                progress,
                execute_count: Arc::new(AtomicUsize::new(0)),
                order: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn step(&self, name: &'static str, behaviour: Behaviour) -> Arc<dyn PipelineStep> {
            Arc::new(ScriptedStep {
                name,
                behaviour,
                execute_count: Arc::clone(&self.execute_count),
                order: Arc::clone(&self.order),
            })
        }

        fn hundred_count(&self) -> usize {
            self.progress.lock().iter().filter(|&&p| p == 100).count()
        }
    }

    #[tokio::test]
    async fn closed_gate_runs_nothing() {
        let h = Harness::new();
        let steps = vec![h.step("A", Behaviour::Succeed), h.step("B", Behaviour::Succeed)];

        let err = h.orchestrator.run(&steps, false).await.unwrap_err();

        assert!(matches!(err, PipelineError::PreconditionNotMet { .. }));
        assert_eq!(h.execute_count.load(Ordering::SeqCst), 0);
        assert!(h.progress.lock().is_empty());
        assert_eq!(
            *h.lines.lock(),
            vec![format!("[WARN] {}", ACKNOWLEDGEMENT_REQUIRED)]
        );
    }

    #[tokio::test]
    async fn steps_run_in_order_and_finish_at_100_once() {
        let h = Harness::new();
        let steps = vec![
            h.step("A", Behaviour::Succeed),
            h.step("B", Behaviour::Succeed),
            h.step("C", Behaviour::Succeed),
            h.step("D", Behaviour::Succeed),
        ];

        let report = h.orchestrator.run(&steps, true).await.unwrap();

        assert_eq!(*h.order.lock(), vec!["A", "B", "C", "D"]);
        assert_eq!(report.completed, vec!["A", "B", "C", "D"]);
        assert_eq!(*h.progress.lock(), vec![0, 25, 50, 75, 100]);
        assert_eq!(h.hundred_count(), 1);
        assert_eq!(
            h.lines.lock().last().map(String::as_str),
            Some("[DONE] All selected steps completed.")
        );
    }

    #[tokio::test]
    async fn step_logs_arrive_between_start_and_next_start() {
        let h = Harness::new();
        let steps = vec![h.step("A", Behaviour::Succeed), h.step("B", Behaviour::Succeed)];

        h.orchestrator.run(&steps, true).await.unwrap();

        let lines = h.lines.lock().clone();
        assert_eq!(
            lines,
            vec![
                "Starting: A",
                "[INFO] working in A",
                "Starting: B",
                "[INFO] working in B",
                "[DONE] All selected steps completed.",
            ]
        );
    }

    #[tokio::test]
    async fn failures_and_panics_do_not_stall_the_chain() {
        let h = Harness::new();
        let steps = vec![
            h.step("A", Behaviour::Fail),
            h.step("B", Behaviour::Panic),
            h.step("C", Behaviour::Skip),
        ];

        let report = h.orchestrator.run(&steps, true).await.unwrap();

        assert_eq!(h.execute_count.load(Ordering::SeqCst), 3);
        assert_eq!(report.skipped, vec!["C"]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[1].1.contains("worker blew up"));

        let lines = h.lines.lock().clone();
        assert!(lines.contains(&"[ERROR] A: model exploded".to_string()));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("[ERROR] B: Step panicked")));
        assert!(lines.contains(&"[INFO] C skipped: nothing to do".to_string()));

        // The tail is taken at the last failure, before C ran.
        assert!(report.error_tail.contains(&"[INFO] working in B".to_string()));
        assert!(report
            .error_tail
            .last()
            .is_some_and(|l| l.starts_with("[ERROR] B: Step panicked")));
        assert!(!report.error_tail.iter().any(|l| l.contains("working in C")));

        // Failed steps do not advance; the done event still reports 100.
        assert_eq!(*h.progress.lock(), vec![0, 33, 100]);
        assert_eq!(h.hundred_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_before_running() {
        let h = Harness::new();
        let steps = vec![h.step("A", Behaviour::Succeed), h.step("A", Behaviour::Succeed)];

        let err = h.orchestrator.run(&steps, true).await.unwrap_err();

        assert!(matches!(err, PipelineError::DuplicateStep { .. }));
        assert_eq!(h.execute_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_selection_completes() {
        let h = Harness::new();
        let report = h.orchestrator.run(&[], true).await.unwrap();
        assert!(report.completed.is_empty());
        assert_eq!(*h.progress.lock(), vec![0, 100]);
    }
}
