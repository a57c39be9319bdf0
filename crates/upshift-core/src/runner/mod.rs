//! Queue runner: drains a `TaskQueue` one item at a time, with operator
//! confirmation, verbosity-tiered progress and dry-run.
//!
//! Per item:
//! 1. steal the head item
//! 2. report progress (dot / title / title + rendered callback)
//! 3. decide run / skip / abort (prompt only in step mode)
//! 4. run the handler unless skipping or dry-running
//! 5. delete the item
//!
//! Abort and failure return before step 5, so the item stays claimed and the
//! next run over the reloaded queue picks it up again.

mod render;

pub use render::render_callback;

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::domain::{RunId, Verbosity};
use crate::error::{FailureCause, RunnerError};
use crate::impls::TracingLogSink;
use crate::observability::RunSummary;
use crate::ports::{Choice, Console, LogSink};
use crate::queue::{ClaimedItem, TaskQueue};
use crate::runtime::{HandlerRegistry, Outcome, TaskContext};

pub const STEP_QUESTION: &str = "Execute this step?";

pub const STEP_CHOICES: [Choice<'static>; 3] = [
    Choice::new("y", "yes"),
    Choice::new("s", "skip"),
    Choice::new("a", "abort"),
];

const STEP_DEFAULT: &str = "y";

/// What to do with the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Run,
    Skip,
    Abort,
}

impl StepAction {
    /// Only `y` runs and only `a` aborts; any other answer skips.
    pub fn from_key(key: &str) -> Self {
        match key {
            "y" => StepAction::Run,
            "a" => StepAction::Abort,
            _ => StepAction::Skip,
        }
    }
}

pub struct QueueRunner<'a> {
    console: &'a dyn Console,
    queue: &'a dyn TaskQueue,
    registry: &'a HandlerRegistry,
    config: RunnerConfig,
    log: Option<&'a dyn LogSink>,
    run_id: RunId,
}

impl<'a> QueueRunner<'a> {
    pub fn new(
        console: &'a dyn Console,
        queue: &'a dyn TaskQueue,
        registry: &'a HandlerRegistry,
        config: RunnerConfig,
    ) -> Self {
        Self {
            console,
            queue,
            registry,
            config,
            log: None,
            run_id: RunId::generate(),
        }
    }

    /// Sink handed to handlers. Defaults to `TracingLogSink` for this run.
    pub fn with_log_sink(mut self, sink: &'a dyn LogSink) -> Self {
        self.log = Some(sink);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Drain the queue until it is empty, the operator aborts, or a task
    /// fails. Items deleted before an error stay deleted.
    pub async fn run_all(&self) -> Result<RunSummary, RunnerError> {
        let verbosity = self.console.verbosity();
        let default_sink = TracingLogSink::for_run(self.run_id);
        let log: &dyn LogSink = match self.log {
            Some(sink) => sink,
            None => &default_sink,
        };

        info!(
            run = %self.run_id,
            dry_run = self.config.dry_run,
            step = self.config.step,
            ?verbosity,
            "queue run started"
        );

        let mut summary = RunSummary::default();
        while self.queue.count().await? > 0 {
            let Some(item) = self.queue.steal_next(self.run_id).await? else {
                warn!(run = %self.run_id, "queue reports items but none could be stolen");
                break;
            };
            if item.is_reclaim() {
                info!(
                    run = %self.run_id,
                    item = %item.id,
                    claims = item.claims,
                    title = item.title(),
                    "resuming item left claimed by an earlier run"
                );
            }

            self.report_progress(verbosity, &item)?;

            match self.choose_action()? {
                StepAction::Abort => {
                    warn!(run = %self.run_id, item = %item.id, title = item.title(), "aborted by operator");
                    return Err(RunnerError::AbortedByOperator);
                }
                StepAction::Skip => {
                    debug!(run = %self.run_id, item = %item.id, "skipped");
                    summary.skipped += 1;
                }
                StepAction::Run if self.config.dry_run => {
                    debug!(run = %self.run_id, item = %item.id, "dry run, not executed");
                    summary.simulated += 1;
                }
                StepAction::Run => {
                    self.execute(&item, log).await?;
                    summary.executed += 1;
                }
            }

            self.queue.delete(&item).await?;
        }

        if verbosity == Verbosity::Normal {
            self.console.new_line()?;
        }

        info!(
            run = %self.run_id,
            executed = summary.executed,
            skipped = summary.skipped,
            simulated = summary.simulated,
            "queue run finished"
        );
        Ok(summary)
    }

    fn report_progress(&self, verbosity: Verbosity, item: &ClaimedItem) -> Result<(), RunnerError> {
        match verbosity {
            // No progress bar: the queue may grow while it drains.
            Verbosity::Quiet | Verbosity::Normal => self.console.write(".")?,
            Verbosity::Verbose => self.console.write_line(item.title())?,
            Verbosity::Debug => self.console.write_line(&format!(
                "{} ({})",
                item.title(),
                render_callback(&item.task)
            ))?,
        }
        Ok(())
    }

    fn choose_action(&self) -> Result<StepAction, RunnerError> {
        if !self.config.step {
            return Ok(StepAction::Run);
        }
        let key = self
            .console
            .choice(STEP_QUESTION, &STEP_CHOICES, STEP_DEFAULT)?;
        Ok(StepAction::from_key(&key))
    }

    async fn execute(&self, item: &ClaimedItem, log: &dyn LogSink) -> Result<(), RunnerError> {
        let ctx = TaskContext::new(self.queue, log, self.run_id, item.id);

        let dispatched = AssertUnwindSafe(self.registry.dispatch(&ctx, &item.task))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(FailureCause::Panicked(panic_message(payload.as_ref()))));

        let cause = match dispatched {
            Ok(Outcome::Done) => {
                debug!(run = %self.run_id, item = %item.id, "executed");
                return Ok(());
            }
            Ok(Outcome::Declined) => FailureCause::Declined,
            Err(cause) => cause,
        };

        self.console
            .write_line(&format!("Error executing task \"{}\"", item.title()))?;
        error!(
            run = %self.run_id,
            item = %item.id,
            title = item.title(),
            callback = %item.task.callback(),
            error = %cause,
            "task failed"
        );
        Err(RunnerError::TaskExecutionFailed {
            title: item.title().to_string(),
            cause,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
