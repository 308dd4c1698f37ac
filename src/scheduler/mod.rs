//! Host scheduling
//!
//! The runtime needs one thing from its host: "run this callback later".
//! [`Scheduler::defer`] is that primitive. Implementations must
//!
//! - never run the task inline (the caller is mid-turn),
//! - run tasks with a zero delay as soon as the host is idle,
//! - keep FIFO order among tasks with the same delay.
//!
//! Two hosts are provided: [`EventLoop`], an explicit loop pumped by the
//! caller and scheduled through its [`EventLoopHandle`], and [`WorkerHost`],
//! a dedicated thread scheduled through its [`WorkerHandle`]. Tokio users can skip the
//! scheduler entirely with [`run_async`](crate::run_async).

mod event_loop;
mod timer;
mod worker;

use std::sync::Arc;
use std::time::Duration;

pub use event_loop::{EventLoop, EventLoopHandle};
pub use worker::{WorkerHandle, WorkerHost};

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The host's deferred-callback primitive
pub trait Scheduler: Send + Sync + 'static {
    /// Run `task` in a later turn, no sooner than `delay` from now
    fn defer(&self, delay: Duration, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn defer(&self, delay: Duration, task: Task) {
        (**self).defer(delay, task)
    }
}

/// Adapts a closure into a [`Scheduler`], for embedding in foreign event loops
pub struct FnScheduler<F>(pub F);

impl<F> Scheduler for FnScheduler<F>
where
    F: Fn(Duration, Task) + Send + Sync + 'static,
{
    fn defer(&self, delay: Duration, task: Task) {
        (self.0)(delay, task)
    }
}
