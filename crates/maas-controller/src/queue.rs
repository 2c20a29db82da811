//! Per-key work queue with exponential backoff (§5: "at most one in-flight
//! reconcile per (controller, object key)... re-enqueued with exponential
//! backoff, base ~5ms, cap ~16min"), modeled on the background-worker
//! tick-loop idiom: a channel feeding a pool of reconcile loops, with
//! per-key backoff tracked in a concurrent map rather than a delay-heap,
//! since `K` here never needs to carry an `Ord` impl.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BASE_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_secs(16 * 60);

/// A FIFO queue of keys with delayed re-enqueue on failure. Cloning shares
/// the underlying channel and backoff table, so many reconcile loops can
/// pull from the same queue.
pub struct WorkQueue<K> {
    tx: mpsc::UnboundedSender<K>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<K>>>,
    backoff: Arc<Mutex<HashMap<K, Duration>>>,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            backoff: self.backoff.clone(),
        }
    }
}

impl<K> WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
            backoff: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Enqueue a key for immediate processing. Does not reset backoff
    /// state — a key that is retrying stays on its backoff schedule even
    /// if a fresh watch event arrives for it (the next successful
    /// reconcile will clear it via [`WorkQueue::ack_success`]).
    pub fn enqueue(&self, key: K) {
        let _ = self.tx.send(key);
    }

    /// Re-enqueue after a transient failure, doubling this key's backoff
    /// delay up to the cap.
    pub fn requeue_after_failure(&self, key: K) {
        let delay = {
            let mut backoff = self.backoff.lock();
            let next = backoff
                .get(&key)
                .map_or(BASE_BACKOFF, |d| (*d * 2).min(MAX_BACKOFF));
            backoff.insert(key.clone(), next);
            next
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(key);
        });
    }

    /// Clear a key's backoff state after a successful reconcile.
    pub fn ack_success(&self, key: &K) {
        self.backoff.lock().remove(key);
    }

    /// Pull the next key, waiting if the queue is empty. `None` once every
    /// sender has been dropped.
    pub async fn recv(&self) -> Option<K> {
        self.rx.lock().await.recv().await
    }
}

impl<K> Default for WorkQueue<K>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_recv_roundtrips() {
        let queue: WorkQueue<String> = WorkQueue::new();
        queue.enqueue("m1".to_owned());
        assert_eq!(queue.recv().await, Some("m1".to_owned()));
    }

    #[tokio::test]
    async fn requeue_after_failure_doubles_backoff() {
        let queue: WorkQueue<String> = WorkQueue::new();
        queue.requeue_after_failure("m1".to_owned());
        assert_eq!(queue.backoff.lock().get("m1"), Some(&BASE_BACKOFF));
        queue.requeue_after_failure("m1".to_owned());
        assert_eq!(queue.backoff.lock().get("m1"), Some(&(BASE_BACKOFF * 2)));
    }

    #[tokio::test]
    async fn ack_success_clears_backoff() {
        let queue: WorkQueue<String> = WorkQueue::new();
        queue.requeue_after_failure("m1".to_owned());
        queue.ack_success(&"m1".to_owned());
        assert!(queue.backoff.lock().get("m1").is_none());
    }
}
