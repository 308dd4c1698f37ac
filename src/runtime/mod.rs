//! Effect interpretation
//!
//! - `trampoline`: the explicit-stack engine, run in bounded slices
//! - [`Runtime`]: drives slices through a host [`Scheduler`](crate::Scheduler)
//!   and reports the result to a completion callback
//! - `run_async`: drives slices from a tokio task (feature `async`)

#[cfg(feature = "async")]
mod async_driver;
pub mod errors;
mod interpreter;
pub(crate) mod trampoline;

#[cfg(feature = "async")]
pub use async_driver::run_async;
pub use errors::{RunError, RunResult, Stage};
pub use interpreter::{run, ErrorHandler, Runtime};
pub use trampoline::{TrampolineStats, DEFAULT_STEP_BUDGET};
