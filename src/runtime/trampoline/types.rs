//! Trampoline Types for Iterative Interpretation
//!
//! These types let the interpreter keep pending `Map`/`FlatMap` work on the heap
//! instead of the native call stack, so a run can be suspended and resumed at
//! any node boundary.

use crate::effect::node::{Continuation, Transform, Value};

/// Nodes processed per host turn before the interpreter yields.
/// Small on purpose: it bounds synchronous work, not total work.
pub const DEFAULT_STEP_BUDGET: usize = 2;

/// A pending composition step, waiting for its source's result
pub(crate) enum Frame {
    /// Apply the transform and keep unwinding
    Map(Transform),
    /// Build a new subtree from the result and descend into it
    FlatMap(Continuation),
}

/// Outcome of one slice of interpretation
pub(crate) enum Progress {
    /// The tree is fully evaluated
    Complete(Value),
    /// The step budget ran out; state is intact for resumption
    Suspended,
}

/// Counters accumulated over the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrampolineStats {
    /// Nodes processed while descending
    pub steps: u64,
    /// Times the run handed itself back to the host
    pub suspensions: u64,
    /// Deepest continuation stack observed
    pub max_stack: usize,
}
