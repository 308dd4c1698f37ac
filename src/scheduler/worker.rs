//! Dedicated host thread.
//!
//! A single worker thread owns a [`TimerQueue`] and is fed deferred tasks
//! over a crossbeam channel. With exactly one worker, tasks never run
//! concurrently, so a run resumed here keeps the single-threaded model.
//!
//! ```text
//! WorkerHandle ──defer──> unbounded channel ──> worker thread
//!                                                 ├─ TimerQueue (due, seq)
//!                                                 └─ runs due tasks in order
//! ```

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::effect::Effect;
use crate::runtime::{RunError, RunResult, Runtime};

use super::timer::TimerQueue;
use super::{Scheduler, Task};

enum Message {
    Defer { due: Instant, task: Task },
    Shutdown,
}

/// Owner of the worker thread. Dropping it shuts the worker down.
pub struct WorkerHost {
    sender: Sender<Message>,
    worker: Option<JoinHandle<()>>,
    turns: Arc<AtomicU64>,
}

/// Cloneable [`Scheduler`] that submits tasks to a [`WorkerHost`]
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Message>,
}

impl WorkerHost {
    /// Start the worker thread
    pub fn spawn() -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Message>();
        let turns = Arc::new(AtomicU64::new(0));
        let worker_turns = Arc::clone(&turns);

        let worker = thread::Builder::new()
            .name("effectron-host".to_string())
            .spawn(move || worker_loop(receiver, worker_turns))?;

        Ok(Self {
            sender,
            worker: Some(worker),
            turns,
        })
    }

    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            sender: self.sender.clone(),
        }
    }

    /// Number of tasks the worker has executed
    pub fn turns(&self) -> u64 {
        self.turns.load(Ordering::Relaxed)
    }

    /// Run `effect` on the worker and block the calling thread until it settles.
    ///
    /// Must not be called from the worker thread itself.
    pub fn block_on<A: Send + 'static>(&self, config: RuntimeConfig, effect: Effect<A>) -> RunResult<A> {
        let (result_sender, result_receiver) = crossbeam_channel::bounded::<RunResult<A>>(1);

        let error_sender = result_sender.clone();
        let runtime = Runtime::new(self.handle(), config).with_error_handler(move |err| {
            let _ = error_sender.try_send(Err(err));
        });
        runtime.run(effect, move |value| {
            let _ = result_sender.try_send(Ok(value));
        });
        drop(runtime);

        result_receiver.recv().unwrap_or(Err(RunError::Abandoned))
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Tasks still queued are dropped; their runs report [`RunError::Abandoned`].
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.sender.send(Message::Shutdown);
            if worker.join().is_err() {
                warn!(target: "effectron::scheduler::worker", "worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHost {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Scheduler for WorkerHandle {
    fn defer(&self, delay: Duration, task: Task) {
        let message = Message::Defer {
            due: Instant::now() + delay,
            task,
        };
        if self.sender.send(message).is_err() {
            warn!(target: "effectron::scheduler::worker", "worker host is gone, dropping task");
        }
    }
}

/// Worker thread main loop
fn worker_loop(receiver: Receiver<Message>, turns: Arc<AtomicU64>) {
    let mut timers = TimerQueue::new();

    loop {
        while let Some(task) = timers.pop_due(Instant::now()) {
            let turn = turns.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(target: "effectron::scheduler::worker", turn, "running task");
            task();
        }

        let message = match timers.next_due() {
            Some(due) => match receiver.recv_deadline(due) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            Message::Defer { due, task } => timers.push_at(due, task),
            Message::Shutdown => break,
        }
    }

    if !timers.is_empty() {
        debug!(
            target: "effectron::scheduler::worker",
            dropped = timers.len(),
            "worker stopping with pending tasks"
        );
    }
}
