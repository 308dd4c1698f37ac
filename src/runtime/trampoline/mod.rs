//! Trampoline-based Iterative Interpretation
//!
//! This module provides the continuation stack and the engine that evaluates
//! effect trees without native recursion. Interpretation proceeds in slices;
//! a slice ends when the tree completes or the step budget is spent.

mod engine;
mod types;

pub(crate) use engine::Trampoline;
pub(crate) use types::Progress;
pub use types::{TrampolineStats, DEFAULT_STEP_BUDGET};
