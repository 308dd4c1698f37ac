//! Shared helpers for the integration tests
//!
//! Each helper drives a run on an explicit [`EventLoop`] and records everything
//! the runtime reports, so tests can assert on values, errors and turn counts.
#![allow(dead_code)]

use std::sync::Arc;

use effectron::{sync, Effect, EventLoop, RunError, Runtime, RuntimeConfig, TrampolineStats};
use parking_lot::Mutex;

/// Everything a single run reported
#[derive(Debug)]
pub struct Outcome<A> {
    /// Values passed to the completion callback, in call order
    pub values: Vec<A>,
    /// Stats passed alongside each value
    pub stats: Vec<TrampolineStats>,
    /// Errors passed to the error handler
    pub errors: Vec<RunError>,
    /// Host turns consumed by the run
    pub turns: u64,
}

impl<A: std::fmt::Debug> Outcome<A> {
    /// The single value of a successful run
    pub fn value(mut self) -> A {
        assert_eq!(self.values.len(), 1, "expected exactly one completion");
        assert!(self.errors.is_empty(), "unexpected errors: {:?}", self.errors);
        self.values.remove(0)
    }

    pub fn only_stats(&self) -> TrampolineStats {
        assert_eq!(self.stats.len(), 1, "expected exactly one completion");
        self.stats[0]
    }
}

/// Run `effect` on a fresh event loop and pump it until idle
pub fn run_recorded<A: Send + 'static>(config: RuntimeConfig, effect: Effect<A>) -> Outcome<A> {
    let event_loop = EventLoop::new();
    let completions: Arc<Mutex<Vec<(A, TrampolineStats)>>> = Arc::new(Mutex::new(Vec::new()));
    let errors: Arc<Mutex<Vec<RunError>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&errors);
    let runtime = Runtime::new(event_loop.handle(), config).with_error_handler(move |err| sink.lock().push(err));

    let slot = Arc::clone(&completions);
    runtime.run_with_stats(effect, move |value, stats| slot.lock().push((value, stats)));
    drop(runtime);
    event_loop.run_until_idle();

    let (values, stats): (Vec<A>, Vec<TrampolineStats>) = std::mem::take(&mut *completions.lock()).into_iter().unzip();
    let errors = std::mem::take(&mut *errors.lock());
    Outcome {
        values,
        stats,
        errors,
        turns: event_loop.turns(),
    }
}

/// Shared append-only log for observing the order side effects happen in
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// `depth` flat_map stages, each producing a fresh leaf that adds one
pub fn counting_chain(depth: usize) -> Effect<u64> {
    let mut effect = sync(|| 0_u64);
    for _ in 0..depth {
        effect = effect.flat_map(|n| sync(move || n + 1));
    }
    effect
}

/// `depth` map stages over one leaf, each adding one
pub fn map_chain(depth: usize) -> Effect<u64> {
    let mut effect = sync(|| 0_u64);
    for _ in 0..depth {
        effect = effect.map(|n| n + 1);
    }
    effect
}

/// Budgets worth sweeping when checking that suspensions are transparent
pub fn budgets() -> Vec<RuntimeConfig> {
    [1, 2, 3, 5, 8, 64, usize::MAX]
        .into_iter()
        .map(|budget| RuntimeConfig::default().with_step_budget(budget))
        .collect()
}
