//! Helpers shared by the integration tests

#![allow(dead_code)]

use rust_worker_pool::{PoolEvent, PoolObserver};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Observer that keeps every event for later inspection
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PoolEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().expect("Observer lock poisoned").clone()
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&PoolEvent) -> bool,
    {
        self.events
            .lock()
            .expect("Observer lock poisoned")
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl PoolObserver for RecordingObserver {
    fn on_event(&self, event: &PoolEvent) {
        self.events
            .lock()
            .expect("Observer lock poisoned")
            .push(event.clone());
    }
}

/// Poll `condition` every millisecond until it holds or `timeout` passes
pub fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
