//! The cluster API is an external collaborator (§1: "the cluster API
//! server and its watch/list/patch semantics" is out of scope, specified
//! only through its contract). This crate is that contract: a generic
//! `ObjectStore<T>` trait every controller reconciles against, plus a
//! watch-event stream shape. `maas-store-memory` is the in-process
//! reference implementation used by tests and by the example binary.

pub mod error;
pub mod watch;

pub use error::StoreError;
pub use watch::WatchEvent;

use async_trait::async_trait;
use maas_core::{ObjectRef, Resource};

/// CRUD + watch over one kind of object, keyed by `(namespace, name)`.
///
/// Implementations must be `Send + Sync` and safe under concurrent access;
/// every write enforces optimistic concurrency via
/// `ObjectMeta::resource_version` (§5).
#[async_trait]
pub trait ObjectStore<T>: Send + Sync
where
    T: Resource + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &ObjectRef) -> Result<Option<T>, StoreError>;

    /// List objects, optionally scoped to one namespace.
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<T>, StoreError>;

    /// Create a new object. Fails with `StoreError::AlreadyExists` if the
    /// key is taken.
    async fn create(&self, obj: T) -> Result<T, StoreError>;

    /// Update spec + metadata. Fails with `StoreError::Conflict` if
    /// `resource_version` is stale.
    async fn update(&self, obj: T) -> Result<T, StoreError>;

    /// Patch only the `.status` subresource. Does not bump `generation`,
    /// mirroring the Kubernetes status-subresource convention the spec's
    /// "controllers mutate only their `status` plus a finalizer" rule
    /// assumes.
    async fn update_status(&self, obj: T) -> Result<T, StoreError>;

    /// Request deletion. If the object carries finalizers, this sets
    /// `deletion_timestamp` and returns the tombstoned object rather than
    /// removing it; the caller's finalizer logic must then call
    /// [`ObjectStore::update`] with an empty finalizer list to complete
    /// the deletion. Returns `Ok(None)` if the key did not exist.
    async fn delete(&self, key: &ObjectRef) -> Result<Option<T>, StoreError>;

    /// Subscribe to a stream of [`WatchEvent`]s for this kind. Implementors
    /// that cannot offer a live watch (e.g. a remote REST backend) may
    /// return `StoreError::Unsupported`; callers fall back to polling
    /// `list`.
    async fn watch(&self) -> Result<watch::WatchStream<T>, StoreError>;
}
