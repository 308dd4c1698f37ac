//! Effectron - Lazy Effect Runtime
//!
//! This library describes sequences of deferred computations as immutable
//! effect trees and evaluates them without growing the native call stack,
//! yielding back to the host scheduler after a bounded number of steps.
//!
//! # Architecture
//!
//! 1. **Effect algebra** (`effect` module)
//!    - `Sync` leaves wrap deferred thunks
//!    - `Map` applies a pure transform to its source's result
//!    - `FlatMap` builds a new effect from its source's result
//!    - Curried composers plus [`pipe!`] compose trees left to right
//!
//! 2. **Trampoline interpreter** (`runtime` module)
//!    - Explicit, heap-allocated continuation stack instead of recursion
//!    - Step budget per host turn; the pending state is handed to the host
//!      and resumed later with identical semantics
//!    - Completion callback invoked exactly once
//!
//! 3. **Hosts** (`scheduler` module)
//!    - [`EventLoop`]: explicit loop pumped by the caller
//!    - [`WorkerHost`]: dedicated host thread
//!    - [`run_async`]: tokio tasks (feature `async`)
//!
//! # Example
//!
//! ```rust
//! use effectron::{flat_map, map, pipe, sync, EventLoop, RuntimeConfig};
//!
//! let program = pipe!(
//!     sync(|| 1),
//!     flat_map(|n: i32| sync(move || n + 1)),
//!     map(|n: i32| n * 10),
//! );
//!
//! let event_loop = EventLoop::new();
//! let result = event_loop.block_on(RuntimeConfig::default(), program);
//! assert_eq!(result, Ok(20));
//! ```
//!
//! # Evaluation Strategy
//!
//! - **Lazy**: building an effect never runs user code
//! - **Ordered**: innermost-first, left-to-right, regardless of suspensions
//! - **Success-only**: a panicking stage aborts the run and is reported to the
//!   runtime's error handler; the completion callback is not called

pub mod config;
pub mod effect;
pub mod runtime;
pub mod scheduler;

pub use config::{ConfigError, RuntimeConfig};
pub use effect::{flat_map, map, sync, Effect, NodeKind, Pipe};
#[cfg(feature = "async")]
pub use runtime::run_async;
pub use runtime::{run, RunError, RunResult, Runtime, Stage, TrampolineStats, DEFAULT_STEP_BUDGET};
pub use scheduler::{EventLoop, EventLoopHandle, FnScheduler, Scheduler, Task, WorkerHandle, WorkerHost};
