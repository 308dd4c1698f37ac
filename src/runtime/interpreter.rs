//! Callback-driven runtime.
//!
//! [`Runtime::run`] evaluates an effect slice by slice. Whenever a slice ends
//! with the step budget exhausted, the pending state is moved into a task and
//! handed to the host [`Scheduler`]; the task runs the next slice. The
//! completion callback fires exactly once, from whichever turn finishes the tree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::RuntimeConfig;
use crate::effect::node::{downcast, Value};
use crate::effect::Effect;
use crate::scheduler::Scheduler;

use super::errors::{RunError, RunResult};
use super::trampoline::{Progress, Trampoline, TrampolineStats};

/// Receives runs that end without a result
pub type ErrorHandler = Arc<dyn Fn(RunError) + Send + Sync>;

type Completion = Box<dyn FnOnce(Value, TrampolineStats) -> RunResult<()> + Send>;

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Binds the trampoline to a host scheduler, a configuration and an error channel.
///
/// Cloning is cheap; clones share the scheduler and the error handler.
#[derive(Clone)]
pub struct Runtime {
    scheduler: Arc<dyn Scheduler>,
    config: RuntimeConfig,
    on_error: ErrorHandler,
}

impl Runtime {
    /// Create a runtime on top of `scheduler`.
    ///
    /// A zero `step_budget` is raised to 1 so runs always make progress;
    /// use [`RuntimeConfig::validate`] to reject it instead.
    pub fn new<S: Scheduler>(scheduler: S, config: RuntimeConfig) -> Self {
        let mut config = config;
        if config.step_budget == 0 {
            warn!(target: "effectron::runtime", "step_budget of 0 would never progress, using 1");
            config.step_budget = 1;
        }
        Self {
            scheduler: Arc::new(scheduler),
            config,
            on_error: Arc::new(log_run_error),
        }
    }

    /// Replace the default error handler, which logs at `error` level
    pub fn with_error_handler<F>(mut self, on_error: F) -> Self
    where
        F: Fn(RunError) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(on_error);
        self
    }

    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Evaluate `effect` and pass its result to `on_done`.
    ///
    /// Shallow trees complete before this returns; deeper ones complete in a
    /// later host turn. `on_done` is called exactly once if the run succeeds and
    /// never if it fails; failures go to the error handler.
    pub fn run<A, F>(&self, effect: Effect<A>, on_done: F)
    where
        A: Send + 'static,
        F: FnOnce(A) + Send + 'static,
    {
        self.run_with_stats(effect, move |value, _| on_done(value));
    }

    /// Like [`run`](Self::run), also reporting step and suspension counts
    pub fn run_with_stats<A, F>(&self, effect: Effect<A>, on_done: F)
    where
        A: Send + 'static,
        F: FnOnce(A, TrampolineStats) + Send + 'static,
    {
        let id = NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed);
        debug!(target: "effectron::runtime", run = id, root = %effect.kind(), "starting run");

        let completion: Completion = Box::new(move |value, stats| {
            let result = downcast::<A>(value)?;
            on_done(result, stats);
            Ok(())
        });

        Fiber {
            id,
            trampoline: Trampoline::new(effect.into_node(), self.config.catch_panics),
            on_done: Some(completion),
            runtime: self.clone(),
        }
        .resume();
    }
}

/// Evaluate `effect` on `scheduler` with the default configuration
pub fn run<S, A, F>(scheduler: S, effect: Effect<A>, on_done: F)
where
    S: Scheduler,
    A: Send + 'static,
    F: FnOnce(A) + Send + 'static,
{
    Runtime::new(scheduler, RuntimeConfig::default()).run(effect, on_done);
}

fn log_run_error(err: RunError) {
    error!(target: "effectron::runtime", %err, "effect run failed");
}

/// One run in flight: the trampoline plus what to do when it finishes
struct Fiber {
    id: u64,
    trampoline: Trampoline,
    /// Taken exactly once, on completion or failure
    on_done: Option<Completion>,
    runtime: Runtime,
}

impl Fiber {
    fn resume(mut self) {
        match self.trampoline.run_slice(self.runtime.config.step_budget) {
            Ok(Progress::Complete(value)) => {
                let stats = self.trampoline.stats();
                debug!(
                    target: "effectron::runtime",
                    run = self.id,
                    steps = stats.steps,
                    suspensions = stats.suspensions,
                    "run completed"
                );
                if let Some(on_done) = self.on_done.take() {
                    if let Err(err) = on_done(value, stats) {
                        (self.runtime.on_error)(err);
                    }
                }
            }
            Ok(Progress::Suspended) => {
                let scheduler = Arc::clone(&self.runtime.scheduler);
                let delay = self.runtime.config.resume_delay;
                scheduler.defer(delay, Box::new(move || self.resume()));
            }
            Err(err) => {
                self.on_done = None;
                debug!(target: "effectron::runtime", run = self.id, %err, "run failed");
                (self.runtime.on_error)(err);
            }
        }
    }
}

impl Drop for Fiber {
    fn drop(&mut self) {
        // Still holding the callback means the host discarded a pending resumption.
        // During an uncaught panic the fiber is only being unwound through.
        if self.on_done.take().is_some() && !std::thread::panicking() {
            debug!(target: "effectron::runtime", run = self.id, "run dropped before completion");
            (self.runtime.on_error)(RunError::Abandoned);
        }
    }
}
