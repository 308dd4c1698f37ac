//! Integration tests for the hosts that resume suspended runs
//!
//! Every host must give the same result for the same effect; only the
//! number of turns and the thread the completion runs on may differ.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{counting_chain, run_recorded, Journal};
use effectron::{
    flat_map, map, pipe, run, sync, Effect, EventLoop, EventLoopHandle, FnScheduler, RunError, Runtime, RuntimeConfig, Scheduler,
    Task, WorkerHost,
};
use parking_lot::Mutex;

fn sequencing_program() -> Effect<i32> {
    pipe!(
        sync(|| 1),
        flat_map(|n: i32| sync(move || n + 1)),
        map(|n: i32| n * 10),
    )
}

#[test]
fn test_every_host_agrees() {
    let expected = run_recorded(RuntimeConfig::default(), counting_chain(300)).value();

    let event_loop = EventLoop::new();
    assert_eq!(event_loop.block_on(RuntimeConfig::default(), counting_chain(300)), Ok(expected));

    let worker = WorkerHost::spawn().unwrap();
    assert_eq!(worker.block_on(RuntimeConfig::default(), counting_chain(300)), Ok(expected));
    worker.shutdown();

    #[cfg(feature = "async")]
    {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let result = runtime.block_on(effectron::run_async(RuntimeConfig::default(), counting_chain(300)));
        assert_eq!(result, Ok(expected));
    }
}

#[test]
fn test_run_returns_before_suspended_work_finishes() {
    let event_loop = EventLoop::new();
    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);

    run(event_loop.handle(), sequencing_program(), move |value| *slot.lock() = Some(value));

    // The first slice ran inline and then handed the rest to the host
    assert_eq!(*result.lock(), None);
    assert_eq!(event_loop.pending(), 1);

    assert!(event_loop.turn());
    assert_eq!(*result.lock(), Some(20));
    assert_eq!(event_loop.pending(), 0);
}

#[test]
fn test_shallow_tree_completes_inline() {
    let event_loop = EventLoop::new();
    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);

    run(event_loop.handle(), sync(|| 7).map(|n: i32| n * 6), move |value| *slot.lock() = Some(value));

    assert_eq!(*result.lock(), Some(42));
    assert_eq!(event_loop.pending(), 0);
    assert_eq!(event_loop.turns(), 0);
}

#[test]
fn test_concurrent_runs_interleave_fifo() {
    let event_loop = EventLoop::new();
    let runtime = Runtime::new(event_loop.handle(), RuntimeConfig::default().with_step_budget(1));
    let journal = Journal::new();

    for name in ["a", "b"] {
        let mut effect = sync(|| ());
        for i in 0..3 {
            let journal = journal.clone();
            effect = effect.flat_map(move |_| sync(move || journal.record(format!("{}{}", name, i))));
        }
        runtime.run(effect, |_| {});
    }

    event_loop.run_until_idle();
    // Each run yields after every node, so the two runs alternate turns
    assert_eq!(journal.entries(), vec!["a0", "b0", "a1", "b1", "a2", "b2"]);
}

#[test]
fn test_worker_completes_on_host_thread() {
    let worker = WorkerHost::spawn().unwrap();
    let runtime = Runtime::new(worker.handle(), RuntimeConfig::default());
    let (sender, receiver) = crossbeam_channel::bounded(1);

    runtime.run(counting_chain(50), move |value| {
        let name = thread::current().name().map(str::to_string);
        sender.send((value, name)).unwrap();
    });

    let (value, name) = receiver.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(value, 50);
    assert_eq!(name.as_deref(), Some("effectron-host"));
    assert!(worker.turns() > 0);
    worker.shutdown();
}

#[test]
fn test_resume_delay_is_passed_to_the_host() {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let queue: Arc<Mutex<Vec<Task>>> = Arc::new(Mutex::new(Vec::new()));
    let (seen, pending) = (Arc::clone(&delays), Arc::clone(&queue));
    let host = FnScheduler(move |delay: Duration, task: Task| {
        seen.lock().push(delay);
        pending.lock().push(task);
    });

    let config = RuntimeConfig::default().with_resume_delay(Duration::from_millis(5));
    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);
    Runtime::new(host, config).run(counting_chain(3), move |value| *slot.lock() = Some(value));

    loop {
        let next = queue.lock().pop();
        match next {
            Some(task) => task(),
            None => break,
        }
    }

    assert_eq!(*result.lock(), Some(3));
    assert!(!delays.lock().is_empty());
    assert!(delays.lock().iter().all(|delay| *delay == Duration::from_millis(5)));
}

#[test]
fn test_event_loop_honours_resume_delay() {
    let event_loop = EventLoop::new();
    let config = RuntimeConfig::default().with_resume_delay(Duration::from_millis(10));
    let start = Instant::now();
    // Four nodes at budget 2 suspend exactly once
    assert_eq!(event_loop.block_on(config, sequencing_program()), Ok(20));
    assert!(start.elapsed() >= Duration::from_millis(10));
}

#[test]
fn test_shared_scheduler_through_arc() {
    struct Counting {
        inner: EventLoopHandle,
        deferred: AtomicUsize,
    }

    impl Scheduler for Counting {
        fn defer(&self, delay: Duration, task: Task) {
            self.deferred.fetch_add(1, Ordering::SeqCst);
            self.inner.defer(delay, task);
        }
    }

    let event_loop = EventLoop::new();
    let host = Arc::new(Counting {
        inner: event_loop.handle(),
        deferred: AtomicUsize::new(0),
    });

    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);
    run(Arc::clone(&host), counting_chain(10), move |value| *slot.lock() = Some(value));
    event_loop.run_until_idle();

    assert_eq!(*result.lock(), Some(10));
    assert_eq!(host.deferred.load(Ordering::SeqCst) as u64, event_loop.turns());
}

#[test]
fn test_dropped_host_reports_abandoned() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    // A host that silently discards every task
    let runtime = Runtime::new(FnScheduler(|_: Duration, _: Task| {}), RuntimeConfig::default())
        .with_error_handler(move |err| sink.lock().push(err));

    runtime.run(counting_chain(10), |_| panic!("must not complete"));
    assert_eq!(*errors.lock(), vec![RunError::Abandoned]);
}

#[test]
fn test_dropped_event_loop_reports_abandoned() {
    let event_loop = EventLoop::new();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let runtime = Runtime::new(event_loop.handle(), RuntimeConfig::default())
        .with_error_handler(move |err| sink.lock().push(err));

    runtime.run(counting_chain(10), |_| panic!("must not complete"));
    assert_eq!(event_loop.pending(), 1);
    assert!(errors.lock().is_empty());

    drop(runtime);
    drop(event_loop);

    // The queued resumption went down with the loop, taking the run with it
    assert_eq!(*errors.lock(), vec![RunError::Abandoned]);
    assert_eq!(Arc::strong_count(&errors), 1);
}

#[test]
fn test_config_file_drives_the_runtime() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/effectron.toml");
    let config = RuntimeConfig::load(path).unwrap();
    assert_eq!(config.step_budget, 4);
    assert_eq!(config.resume_delay, Duration::ZERO);
    assert!(config.catch_panics);

    // 21 nodes visited at budget 4: ceil(21 / 4) - 1 suspensions
    let outcome = run_recorded(config, counting_chain(10));
    assert_eq!(outcome.turns, 5);
    assert_eq!(outcome.value(), 10);
}

#[cfg(feature = "async")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_async_tasks_in_parallel() {
    let handles: Vec<_> = (0..4_u64)
        .map(|i| {
            let effect = counting_chain(1_000).map(move |n| n + i);
            tokio::spawn(effectron::run_async(RuntimeConfig::default(), effect))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), Ok(1_000 + i as u64));
    }
}
