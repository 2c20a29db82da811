use tokio::sync::mpsc;

/// A single watch notification: the object was applied (created or
/// updated, including a tombstone with `deletion_timestamp` set) or
/// finally removed from the API.
#[derive(Debug, Clone)]
pub enum WatchEvent<T> {
    Applied(T),
    Deleted(T),
}

/// A live stream of [`WatchEvent`]s, backed by an mpsc channel so multiple
/// controllers can each hold their own receiver fed from one underlying
/// broadcast.
pub type WatchStream<T> = mpsc::Receiver<WatchEvent<T>>;
