//! Explicit event loop host.
//!
//! The loop owns a deadline-ordered queue of deferred tasks and is pumped by
//! its owner with [`EventLoop::turn`] or [`EventLoop::run_until_idle`]. Every
//! task runs on the pumping thread, one per turn.
//!
//! Runs are started on an [`EventLoopHandle`], which does not keep the loop
//! alive. Queued tasks own their runs, so dropping the last [`EventLoop`]
//! drops every pending run and each one reports
//! [`RunError::Abandoned`](crate::RunError::Abandoned).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{trace, warn};

use crate::config::RuntimeConfig;
use crate::effect::Effect;
use crate::runtime::{RunError, RunResult, Runtime};

use super::timer::TimerQueue;
use super::{Scheduler, Task};

/// Owner of a single-threaded event loop. Clones share the same loop.
#[derive(Clone, Default)]
pub struct EventLoop {
    inner: Arc<Shared>,
}

/// Non-owning [`Scheduler`] for an [`EventLoop`]
#[derive(Clone)]
pub struct EventLoopHandle {
    inner: Weak<Shared>,
}

#[derive(Default)]
struct Shared {
    timers: Mutex<TimerQueue>,
    turns: AtomicU64,
}

impl Shared {
    fn defer(&self, delay: Duration, task: Task) {
        let mut timers = self.timers.lock();
        timers.push(delay, task);
        trace!(
            target: "effectron::scheduler::event_loop",
            ?delay,
            pending = timers.len(),
            "task deferred"
        );
    }
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler for starting runs on this loop
    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.timers().len()
    }

    /// Number of tasks executed so far
    pub fn turns(&self) -> u64 {
        self.inner.turns.load(Ordering::Relaxed)
    }

    /// Run the earliest task whose deadline has passed.
    ///
    /// Returns `false` without blocking when nothing is ready.
    pub fn turn(&self) -> bool {
        let task = self.timers().pop_due(Instant::now());
        match task {
            Some(task) => {
                self.execute(task);
                true
            }
            None => false,
        }
    }

    /// Pump the loop until no tasks remain, sleeping until the next deadline
    /// whenever nothing is ready. Returns the number of tasks executed.
    pub fn run_until_idle(&self) -> u64 {
        let mut executed = 0;
        loop {
            let next = {
                let mut timers = self.timers();
                match timers.pop_due(Instant::now()) {
                    Some(task) => Ok(task),
                    None => Err(timers.next_due()),
                }
            };
            match next {
                Ok(task) => {
                    self.execute(task);
                    executed += 1;
                }
                Err(Some(due)) => {
                    let wait = due.saturating_duration_since(Instant::now());
                    trace!(target: "effectron::scheduler::event_loop", ?wait, "idle until next timer");
                    std::thread::sleep(wait);
                }
                Err(None) => return executed,
            }
        }
    }

    /// Run `effect` on this loop and pump until it settles.
    ///
    /// Must not be called from a task running on this same loop.
    pub fn block_on<A: Send + 'static>(&self, config: RuntimeConfig, effect: Effect<A>) -> RunResult<A> {
        let outcome: Arc<Mutex<Option<RunResult<A>>>> = Arc::new(Mutex::new(None));

        let failure = Arc::clone(&outcome);
        let runtime = Runtime::new(self.handle(), config)
            .with_error_handler(move |err| *failure.lock() = Some(Err(err)));

        let success = Arc::clone(&outcome);
        runtime.run(effect, move |value| *success.lock() = Some(Ok(value)));
        self.run_until_idle();

        let result = outcome.lock().take();
        result.unwrap_or(Err(RunError::Abandoned))
    }

    fn timers(&self) -> MutexGuard<'_, TimerQueue> {
        self.inner.timers.lock()
    }

    fn execute(&self, task: Task) {
        let turn = self.inner.turns.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(target: "effectron::scheduler::event_loop", turn, "running task");
        task();
    }
}

impl Scheduler for EventLoopHandle {
    fn defer(&self, delay: Duration, task: Task) {
        match self.inner.upgrade() {
            Some(shared) => shared.defer(delay, task),
            None => warn!(target: "effectron::scheduler::event_loop", "event loop is gone, dropping task"),
        }
    }
}
