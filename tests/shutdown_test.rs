//! Stop semantics: queued work per shutdown mode, and how running attempts
//! observe the pool's lifetime context

mod common;

use common::{wait_until, RecordingObserver};
use rust_worker_pool::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

/// One running 50ms job plus three queued ones, then stop
fn stop_with_backlog(mode: ShutdownMode) -> (Arc<RecordingObserver>, usize, WorkerPool) {
    let observer = Arc::new(RecordingObserver::default());
    let config = WorkerPoolConfig::new(1).with_shutdown_mode(mode);
    let pool = WorkerPool::with_observer(config, observer.clone()).expect("Failed to create pool");
    let executed = Arc::new(AtomicUsize::new(0));
    let (started_tx, started_rx) = mpsc::channel();

    let executed_clone = Arc::clone(&executed);
    pool.execute(move |_| {
        let _ = started_tx.send(Instant::now());
        thread::sleep(Duration::from_millis(50));
        executed_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit");
    let started_at = started_rx.recv_timeout(WAIT).expect("Job never started");

    for _ in 0..3 {
        let executed = Arc::clone(&executed);
        pool.execute(move |_| {
            executed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .expect("Failed to submit");
    }

    pool.stop().expect("Failed to stop pool");
    assert!(started_at.elapsed() >= Duration::from_millis(50));

    let count = executed.load(Ordering::SeqCst);
    (observer, count, pool)
}

#[test]
fn test_discard_mode_drops_queued_jobs() {
    let (observer, executed, pool) = stop_with_backlog(ShutdownMode::Discard);

    assert_eq!(executed, 1);
    assert_eq!(pool.stats().discarded(), 3);
    assert_eq!(pool.queue_len(), 0);
    assert_eq!(
        observer.count(|e| matches!(e, PoolEvent::JobsDiscarded { count: 3 })),
        1
    );
    assert!(matches!(observer.events().last(), Some(PoolEvent::PoolStopped)));
}

#[test]
fn test_drain_mode_runs_queued_jobs() {
    let (observer, executed, pool) = stop_with_backlog(ShutdownMode::Drain);

    assert_eq!(executed, 4);
    assert_eq!(pool.stats().discarded(), 0);
    assert_eq!(observer.count(|e| matches!(e, PoolEvent::JobsDiscarded { .. })), 0);
    assert_eq!(
        observer.count(|e| matches!(
            e,
            PoolEvent::WorkerStopped {
                reason: rust_worker_pool::WorkerExit::Drained,
                ..
            }
        )),
        1
    );
}

#[test]
fn test_discard_stop_cancels_running_attempt() {
    let pool = WorkerPool::new(1).expect("Failed to create pool");
    let reason = Arc::new(Mutex::new(None));
    let (started_tx, started_rx) = mpsc::channel();

    let reason_clone = Arc::clone(&reason);
    pool.execute(move |ctx| {
        let _ = started_tx.send(());
        let result = ctx.sleep(Duration::from_secs(10));
        *reason_clone.lock().expect("Reason lock poisoned") = ctx.reason();
        result
    })
    .expect("Failed to submit");
    started_rx.recv_timeout(WAIT).expect("Job never started");

    let start = Instant::now();
    pool.stop().expect("Failed to stop pool");
    assert!(start.elapsed() < Duration::from_secs(5));

    assert_eq!(
        *reason.lock().expect("Reason lock poisoned"),
        Some(CancellationReason::ParentCancelled)
    );
    assert_eq!(pool.stats().permanent_failures(), 1);
}

#[test]
fn test_drain_stop_leaves_contexts_live_until_workers_exit() {
    let config = WorkerPoolConfig::new(1).with_shutdown_mode(ShutdownMode::Drain);
    let pool = WorkerPool::with_config(config).expect("Failed to create pool");
    let saw_cancel = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = mpsc::channel();

    let saw_cancel_clone = Arc::clone(&saw_cancel);
    pool.execute(move |ctx| {
        let _ = started_tx.send(());
        thread::sleep(Duration::from_millis(30));
        saw_cancel_clone.store(ctx.is_cancelled(), Ordering::SeqCst);
        Ok(())
    })
    .expect("Failed to submit");
    started_rx.recv_timeout(WAIT).expect("Job never started");

    pool.stop().expect("Failed to stop pool");
    assert!(!saw_cancel.load(Ordering::SeqCst));
    assert_eq!(pool.stats().succeeded(), 1);
}

#[test]
fn test_attempts_after_stop_get_cancelled_context() {
    let pool = WorkerPool::new(1).expect("Failed to create pool");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (started_tx, started_rx) = mpsc::channel();

    let seen_clone = Arc::clone(&seen);
    pool.submit(
        Job::new(move |ctx| {
            let mut seen = seen_clone.lock().expect("Seen lock poisoned");
            seen.push(ctx.is_cancelled());
            if seen.len() == 1 {
                drop(seen);
                let _ = started_tx.send(());
                thread::sleep(Duration::from_millis(30));
            }
            Err(PoolError::task("still failing"))
        })
        .with_retry(2)
        .with_retry_delay(Duration::from_millis(5)),
    )
    .expect("Failed to submit");
    started_rx.recv_timeout(WAIT).expect("Job never started");

    pool.stop().expect("Failed to stop pool");

    // The attempt budget is honored even though the pool stopped
    assert_eq!(
        *seen.lock().expect("Seen lock poisoned"),
        vec![false, true, true]
    );
    assert_eq!(pool.stats().permanent_failures(), 1);
}

#[test]
fn test_blocked_submitter_is_released_by_stop() {
    let config = WorkerPoolConfig::new(1).with_max_queue_size(1);
    let pool = Arc::new(WorkerPool::with_config(config).expect("Failed to create pool"));
    let (started_tx, started_rx) = mpsc::channel();

    pool.execute(move |_| {
        let _ = started_tx.send(());
        thread::sleep(Duration::from_millis(50));
        Ok(())
    })
    .expect("Failed to submit");
    started_rx.recv_timeout(WAIT).expect("Job never started");
    pool.execute(|_| Ok(())).expect("Failed to fill queue");

    let submitter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.execute(|_| Ok(())))
    };
    thread::sleep(Duration::from_millis(10));

    pool.stop().expect("Failed to stop pool");
    let result = submitter.join().expect("Submitter panicked");

    // Either the worker freed a slot before stop, or stop rejected it
    match result {
        Ok(_) => assert!(pool.stats().submitted() == 3),
        Err(e) => assert!(matches!(e, PoolError::SubmissionRejected { .. })),
    }
    assert!(wait_until(WAIT, || pool.state() == PoolState::Stopped));
}
