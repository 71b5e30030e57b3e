//! RestSync: the serialized work queue for upstream REST calls.
//!
//! The exchange rate-limits its REST endpoint, so every REST call in the
//! process is funneled through one single-consumer FIFO. Each thunk runs to
//! completion before the next begins; completion order equals enqueue order,
//! regardless of which connection enqueued.
//!
//! One instance is created at process start and shared by all connections;
//! tests construct their own.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use tokio::sync::Notify;
use tracing::{debug, error};

/// A deferred REST call.
pub type Thunk = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Default queue capacity before `push` backpressures.
const DEFAULT_CAPACITY: usize = 256;

/// Single-consumer FIFO of deferred REST calls with a start/stop gate.
pub struct RestSync {
    queue: Mutex<VecDeque<Thunk>>,
    capacity: usize,
    running: AtomicBool,
    /// Signalled when a thunk is enqueued.
    not_empty: Notify,
    /// Signalled when a thunk is dequeued (wakes backpressured pushers).
    not_full: Notify,
    /// Signalled by `start` to wake a parked consumer.
    resume: Notify,
}

impl RestSync {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
            running: AtomicBool::new(true),
            not_empty: Notify::new(),
            not_full: Notify::new(),
            resume: Notify::new(),
        }
    }

    /// Enqueue a thunk, waiting while the queue is full.
    pub async fn push(&self, thunk: Thunk) {
        loop {
            {
                let mut q = self.queue.lock().unwrap();
                if q.len() < self.capacity {
                    q.push_back(thunk);
                    drop(q);
                    self.not_empty.notify_one();
                    return;
                }
            }
            self.not_full.notified().await;
        }
    }

    /// Enqueue a thunk without waiting, even past the capacity mark.
    pub fn push_nowait(&self, thunk: Thunk) {
        self.queue.lock().unwrap().push_back(thunk);
        self.not_empty.notify_one();
    }

    /// Allow the consumer to proceed.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.resume.notify_one();
    }

    /// Park the consumer after the in-flight thunk finishes. Pending thunks
    /// stay enqueued.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Consumer loop. Runs forever; spawn it once per instance.
    ///
    /// A panicking thunk is logged and the loop continues; a failing REST
    /// call must never take the queue down with it.
    pub async fn run(&self) {
        loop {
            let thunk = loop {
                if self.is_running() {
                    if let Some(t) = self.queue.lock().unwrap().pop_front() {
                        self.not_full.notify_one();
                        break t;
                    }
                }
                // Woken by a push or by start(); re-check both conditions.
                tokio::select! {
                    _ = self.not_empty.notified() => {}
                    _ = self.resume.notified() => {}
                }
            };

            if std::panic::AssertUnwindSafe(thunk).catch_unwind().await.is_err() {
                error!("rest-sync thunk panicked; consumer continues");
            }
            debug!("rest-sync thunk complete, {} queued", self.len());
        }
    }
}

impl Default for RestSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    fn record_thunk(log: Arc<Mutex<Vec<usize>>>, in_flight: Arc<AtomicBool>, n: usize) -> Thunk {
        Box::pin(async move {
            assert!(
                !in_flight.swap(true, Ordering::SeqCst),
                "two thunks in flight at once"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
            log.lock().unwrap().push(n);
            in_flight.store(false, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn executes_in_enqueue_order_single_flight() {
        let sync = Arc::new(RestSync::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicBool::new(false));

        let consumer = Arc::clone(&sync);
        tokio::spawn(async move { consumer.run().await });

        for n in 0..5 {
            sync.push(record_thunk(Arc::clone(&log), Arc::clone(&in_flight), n))
                .await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn stop_parks_and_start_resumes() {
        let sync = Arc::new(RestSync::new());
        let ran = Arc::new(AtomicUsize::new(0));

        sync.stop();
        let consumer = Arc::clone(&sync);
        tokio::spawn(async move { consumer.run().await });

        let counter = Arc::clone(&ran);
        sync.push_nowait(Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0, "consumer ran while stopped");
        assert_eq!(sync.len(), 1, "stop must not drain");

        sync.start();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(sync.is_empty());
    }

    #[tokio::test]
    async fn panicking_thunk_does_not_kill_consumer() {
        let sync = Arc::new(RestSync::new());
        let ran = Arc::new(AtomicUsize::new(0));

        let consumer = Arc::clone(&sync);
        tokio::spawn(async move { consumer.run().await });

        sync.push_nowait(Box::pin(async { panic!("boom") }));
        let counter = Arc::clone(&ran);
        sync.push_nowait(Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn push_backpressures_at_capacity() {
        let sync = Arc::new(RestSync::with_capacity(1));
        sync.stop(); // keep the consumer parked so the queue stays full

        let consumer = Arc::clone(&sync);
        tokio::spawn(async move { consumer.run().await });

        sync.push(Box::pin(async {})).await;
        let blocked = tokio::time::timeout(
            Duration::from_millis(30),
            sync.push(Box::pin(async {})),
        )
        .await;
        assert!(blocked.is_err(), "push should wait while the queue is full");

        // push_nowait ignores the capacity mark.
        sync.push_nowait(Box::pin(async {}));
        assert_eq!(sync.len(), 2);
    }
}
