//! Tokio host for the trampoline.
//!
//! Instead of a deferred callback, each suspension is an `.await` point: the
//! task yields to the tokio scheduler (or sleeps for `resume_delay`) and then
//! runs the next slice from the same state.

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::effect::node::downcast;
use crate::effect::Effect;

use super::errors::RunResult;
use super::trampoline::{Progress, Trampoline};

/// Evaluate `effect` inside the current tokio runtime.
///
/// Failures that the callback runtime would hand to its error handler are
/// returned as `Err` instead.
pub async fn run_async<A: Send + 'static>(config: RuntimeConfig, effect: Effect<A>) -> RunResult<A> {
    let budget = config.step_budget.max(1);
    let mut trampoline = Trampoline::new(effect.into_node(), config.catch_panics);

    loop {
        match trampoline.run_slice(budget)? {
            Progress::Complete(value) => {
                let stats = trampoline.stats();
                debug!(
                    target: "effectron::runtime::async",
                    steps = stats.steps,
                    suspensions = stats.suspensions,
                    "async run completed"
                );
                return downcast::<A>(value);
            }
            Progress::Suspended => {
                if config.resume_delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(config.resume_delay).await;
                }
            }
        }
    }
}
