//! Glue between a [`WorkQueue`] and the watch streams that feed it (§4.3,
//! §4.4, §4.5 "Watches that enqueue this controller"), plus the generic
//! drive loop every controller and aggregator runs on.

use std::future::Future;
use std::hash::Hash;

use maas_store::watch::WatchStream;
use maas_store::WatchEvent;

use crate::queue::WorkQueue;

/// A reconcile error that can tell the drive loop whether to retry.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::error::ControllerError {
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Spawn a task draining a watch stream, enqueueing every key `map`
/// produces for each event. Both `Applied` and `Deleted` events enqueue —
/// a deletion still needs a reconcile to run the finalizer/cascade path.
pub fn feed_watch<T, K>(
    queue: WorkQueue<K>,
    mut stream: WatchStream<T>,
    map: impl Fn(&T) -> Vec<K> + Send + 'static,
) where
    T: Send + 'static,
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            let obj = match &event {
                WatchEvent::Applied(o) | WatchEvent::Deleted(o) => o,
            };
            for key in map(obj) {
                queue.enqueue(key);
            }
        }
    });
}

/// Pull keys from `queue` forever, reconciling each with `reconcile`.
/// A retryable error goes back onto the queue with backoff (§5); a
/// terminal one is logged and dropped, matching §7's "non-retryable
/// failures require operator intervention, not an infinite backoff loop".
pub async fn run_loop<K, F, Fut, E>(queue: WorkQueue<K>, reconcile: F)
where
    K: Clone + Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Retryable + std::fmt::Display,
{
    while let Some(key) = queue.recv().await {
        match reconcile(key.clone()).await {
            Ok(()) => queue.ack_success(&key),
            Err(err) if err.is_retryable() => {
                tracing::warn!(key = ?key, error = %err, "reconcile failed, requeueing with backoff");
                queue.requeue_after_failure(key);
            }
            Err(err) => {
                tracing::error!(key = ?key, error = %err, "reconcile failed terminally, dropping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NeverRetry(String);
    impl std::fmt::Display for NeverRetry {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }
    impl Retryable for NeverRetry {
        fn is_retryable(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn run_loop_processes_enqueued_keys() {
        let queue: WorkQueue<String> = WorkQueue::new();
        let seen = Arc::new(AtomicUsize::new(0));
        queue.enqueue("a".to_owned());
        queue.enqueue("b".to_owned());

        let seen_clone = seen.clone();
        let queue_clone = queue.clone();
        let handle = tokio::spawn(async move {
            run_loop(queue_clone, move |_key: String| {
                let seen = seen_clone.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), NeverRetry>(())
                }
            })
            .await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.abort();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
