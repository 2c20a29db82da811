//! In-memory [`ObjectStore`] implementation backed by a [`DashMap`] keyed
//! by `(namespace, name)`, plus a broadcast-style fan-out to watchers.
//!
//! This is the reference backend: the workspace's tests and its example
//! binary run entirely against it, since the real cluster API server is an
//! external collaborator out of this repository's scope (§1).

use std::marker::PhantomData;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use maas_core::{ObjectRef, Resource};
use maas_store::{ObjectStore, StoreError, WatchEvent, watch::WatchStream};

/// In-memory store for one kind `T`.
pub struct MemoryStore<T> {
    objects: DashMap<(String, String), T>,
    watchers: Mutex<Vec<mpsc::Sender<WatchEvent<T>>>>,
    _marker: PhantomData<T>,
}

impl<T> Default for MemoryStore<T>
where
    T: Resource + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStore<T>
where
    T: Resource + Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            watchers: Mutex::new(Vec::new()),
            _marker: PhantomData,
        }
    }

    fn key(obj_ref: &ObjectRef) -> (String, String) {
        (obj_ref.namespace.clone(), obj_ref.name.clone())
    }

    fn notify(&self, event: WatchEvent<T>) {
        let mut watchers = self.watchers.lock().expect("watcher lock poisoned");
        watchers.retain(|tx| tx.try_send(event.clone()).is_ok() || !tx.is_closed());
    }
}

#[async_trait]
impl<T> ObjectStore<T> for MemoryStore<T>
where
    T: Resource + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &ObjectRef) -> Result<Option<T>, StoreError> {
        Ok(self.objects.get(&Self::key(key)).map(|r| r.clone()))
    }

    async fn list(&self, namespace: Option<&str>) -> Result<Vec<T>, StoreError> {
        Ok(self
            .objects
            .iter()
            .filter(|entry| namespace.is_none_or(|ns| entry.key().0 == ns))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn create(&self, mut obj: T) -> Result<T, StoreError> {
        let key = obj.meta().object_ref();
        let map_key = Self::key(&key);
        if self.objects.contains_key(&map_key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        obj.meta_mut().resource_version = 1;
        self.objects.insert(map_key, obj.clone());
        self.notify(WatchEvent::Applied(obj.clone()));
        Ok(obj)
    }

    async fn update(&self, mut obj: T) -> Result<T, StoreError> {
        let key = obj.meta().object_ref();
        let map_key = Self::key(&key);
        let mut entry = self
            .objects
            .get_mut(&map_key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if obj.meta().resource_version != entry.meta().resource_version {
            return Err(StoreError::Conflict(key.to_string()));
        }
        obj.meta_mut().resource_version += 1;
        *entry = obj.clone();
        drop(entry);
        self.notify(WatchEvent::Applied(obj.clone()));
        Ok(obj)
    }

    async fn update_status(&self, obj: T) -> Result<T, StoreError> {
        // Status writes don't carry the generation-bumping semantics of a
        // full spec update, but still go through optimistic concurrency.
        self.update(obj).await
    }

    async fn delete(&self, key: &ObjectRef) -> Result<Option<T>, StoreError> {
        let map_key = Self::key(key);
        let Some(mut entry) = self.objects.get_mut(&map_key) else {
            return Ok(None);
        };
        if entry.meta().finalizers.is_empty() {
            let obj = entry.clone();
            drop(entry);
            self.objects.remove(&map_key);
            self.notify(WatchEvent::Deleted(obj.clone()));
            Ok(Some(obj))
        } else {
            entry.meta_mut().deletion_timestamp = Some(chrono::Utc::now());
            entry.meta_mut().resource_version += 1;
            let obj = entry.clone();
            drop(entry);
            self.notify(WatchEvent::Applied(obj.clone()));
            Ok(Some(obj))
        }
    }

    async fn watch(&self) -> Result<WatchStream<T>, StoreError> {
        let (tx, rx) = mpsc::channel(256);
        self.watchers.lock().expect("watcher lock poisoned").push(tx);
        Ok(rx)
    }
}
