//! Background task dispatcher for capture side effects.
//!
//! Side effects (connection detection, reorganization triggers) must never
//! delay or fail a capture, but silent `tokio::spawn` makes them invisible.
//! The dispatcher is the middle ground: a bounded submission queue feeding a
//! spawner loop, with every outcome published on a broadcast channel and
//! failures counted. Failures are logged, never propagated, never retried.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use paramind_core::defaults::{DISPATCH_EVENT_CAPACITY, DISPATCH_QUEUE_CAPACITY};
use paramind_core::Result;

type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

struct Task {
    name: &'static str,
    future: TaskFuture,
}

/// Outcome of a dispatched task, published to subscribers.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Completed { task: &'static str, duration_ms: u64 },
    Failed { task: &'static str, error: String },
}

/// Bounded background task dispatcher.
pub struct TaskDispatcher {
    tx: mpsc::Sender<Task>,
    events: broadcast::Sender<TaskEvent>,
    failures: Arc<AtomicU64>,
    loop_handle: JoinHandle<()>,
}

impl TaskDispatcher {
    /// Create a dispatcher with default capacities and start its loop.
    pub fn new() -> Self {
        Self::with_capacity(DISPATCH_QUEUE_CAPACITY, DISPATCH_EVENT_CAPACITY)
    }

    /// Create a dispatcher with explicit queue and event channel capacities.
    pub fn with_capacity(queue_capacity: usize, event_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Task>(queue_capacity);
        let (events, _) = broadcast::channel::<TaskEvent>(event_capacity);
        let failures = Arc::new(AtomicU64::new(0));

        let loop_events = events.clone();
        let loop_failures = failures.clone();
        let loop_handle = tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                let events = loop_events.clone();
                let failures = loop_failures.clone();
                tokio::spawn(async move {
                    let start = Instant::now();
                    match task.future.await {
                        Ok(()) => {
                            let duration_ms = start.elapsed().as_millis() as u64;
                            debug!(
                                subsystem = "dispatch",
                                task = task.name,
                                duration_ms,
                                "Background task completed"
                            );
                            let _ = events.send(TaskEvent::Completed {
                                task: task.name,
                                duration_ms,
                            });
                        }
                        Err(e) => {
                            failures.fetch_add(1, Ordering::SeqCst);
                            error!(
                                subsystem = "dispatch",
                                task = task.name,
                                error = %e,
                                "Background task failed"
                            );
                            let _ = events.send(TaskEvent::Failed {
                                task: task.name,
                                error: e.to_string(),
                            });
                        }
                    }
                });
            }
            info!(subsystem = "dispatch", "Dispatcher loop stopped");
        });

        Self {
            tx,
            events,
            failures,
            loop_handle,
        }
    }

    /// Submit a named task. Returns false (and warns) when the queue is
    /// full or the dispatcher has shut down; the task is dropped, matching
    /// the fire-and-forget contract.
    pub fn submit<F>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let task = Task {
            name,
            future: Box::pin(future),
        };
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    subsystem = "dispatch",
                    task = name,
                    error = %e,
                    "Dropping background task, queue unavailable"
                );
                false
            }
        }
    }

    /// Subscribe to task outcome events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Total failed tasks since startup.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Stop accepting tasks and wait for the loop to drain its queue.
    /// Tasks already spawned keep running detached.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.loop_handle.await {
            warn!(subsystem = "dispatch", error = %e, "Dispatcher loop join failed");
        }
    }
}

impl Default for TaskDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramind_core::Error;

    #[tokio::test]
    async fn test_completed_task_emits_event() {
        let dispatcher = TaskDispatcher::with_capacity(4, 4);
        let mut events = dispatcher.subscribe();

        assert!(dispatcher.submit("noop", async { Ok(()) }));

        match events.recv().await.unwrap() {
            TaskEvent::Completed { task, .. } => assert_eq!(task, "noop"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(dispatcher.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_task_counts_and_emits() {
        let dispatcher = TaskDispatcher::with_capacity(4, 4);
        let mut events = dispatcher.subscribe();

        dispatcher.submit("boom", async {
            Err(Error::Internal("synthetic".to_string()))
        });

        match events.recv().await.unwrap() {
            TaskEvent::Failed { task, error } => {
                assert_eq!(task, "boom");
                assert!(error.contains("synthetic"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(dispatcher.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_never_reaches_submitter() {
        let dispatcher = TaskDispatcher::with_capacity(4, 4);
        let mut events = dispatcher.subscribe();

        // submit returns immediately regardless of what the task will do
        assert!(dispatcher.submit("boom", async {
            Err(Error::Internal("isolated".to_string()))
        }));
        assert!(dispatcher.submit("fine", async { Ok(()) }));

        let mut saw_failed = false;
        let mut saw_completed = false;
        for _ in 0..2 {
            match events.recv().await.unwrap() {
                TaskEvent::Failed { .. } => saw_failed = true,
                TaskEvent::Completed { .. } => saw_completed = true,
            }
        }
        assert!(saw_failed && saw_completed);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_tasks() {
        let dispatcher = TaskDispatcher::with_capacity(4, 4);
        let mut events = dispatcher.subscribe();

        assert!(dispatcher.submit("last", async { Ok(()) }));
        dispatcher.shutdown().await;

        match events.recv().await.unwrap() {
            TaskEvent::Completed { task, .. } => assert_eq!(task, "last"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
