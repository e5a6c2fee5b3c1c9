//! Refresh coordination for the dashboard.
//!
//! Two small primitives: a debouncer that collapses rapid repeated
//! triggers into one execution, and a generation counter that lets a
//! superseded fetch recognize itself as stale instead of racing the
//! newer one for the last write.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Cancellable delayed-task scheduler. A single pending timer handle is
/// replaced (aborted) on each new trigger, so only the last request
/// within the window actually runs.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after the debounce window, aborting any
    /// previously scheduled task that has not started yet.
    pub async fn trigger<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            debug!("Replacing pending debounced task");
            handle.abort();
        }
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        }));
    }

    /// Waits for the currently scheduled task, if any, to finish.
    pub async fn flush(&self) {
        let handle = self.pending.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Monotonically increasing fetch generation. A refresh claims a number
/// up front; by the time it completes a newer claim may exist, in which
/// case its results must be discarded rather than written over the
/// newer ones.
#[derive(Debug, Default)]
pub struct FetchGeneration(AtomicU64);

impl FetchGeneration {
    pub fn new() -> Self {
        FetchGeneration(AtomicU64::new(0))
    }

    /// Claims the next generation number.
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while no newer generation has been claimed.
    pub fn is_current(&self, generation: u64) -> bool {
        self.0.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_rapid_triggers_collapse_to_one_run() {
        let debouncer = Debouncer::new(Duration::from_millis(30));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let runs = Arc::clone(&runs);
            debouncer
                .trigger(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        debouncer.flush().await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_separated_triggers_each_run() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let runs = Arc::clone(&runs);
            debouncer
                .trigger(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .await;
            debouncer.flush().await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_generation_staleness() {
        let generation = FetchGeneration::new();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
