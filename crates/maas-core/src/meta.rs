//! Object metadata, labels, annotations, and finalizer identifiers shared by
//! every kind this control plane reconciles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label identifying objects managed by this system.
pub const LABEL_MANAGED_BY: &str = "maas.io/managed-by";
/// Label value for [`LABEL_MANAGED_BY`].
pub const MANAGED_BY_VALUE: &str = "maas-control-plane";
/// Label grouping an emitted policy into the `auth` or `rate-limit` family.
pub const LABEL_PART_OF: &str = "maas.io/part-of";
/// Label identifying the finer-grained component of an emitted policy.
pub const LABEL_COMPONENT: &str = "maas.io/component";
/// Label carrying the Model name an emitted policy targets.
pub const LABEL_MODEL: &str = "maas.io/model";

/// Annotation carrying the sorted, comma-joined names of the AuthIntents
/// contributing to an emitted AuthPolicy.
pub const ANNOTATION_AUTH_POLICIES: &str = "maas.io/auth-policies";
/// Annotation carrying the sorted, comma-joined names of the Subscriptions
/// contributing to an emitted RateLimitPolicy.
pub const ANNOTATION_SUBSCRIPTIONS: &str = "maas.io/subscriptions";
/// Annotation opt-out: `managed=false` means reconciliation must never
/// touch this object again (invariant 4, "Opt-out").
pub const ANNOTATION_MANAGED: &str = "maas.io/managed";

/// Finalizer guaranteeing Model cleanup runs before removal.
pub const FINALIZER_MODEL: &str = "model.maas.io/finalizer";
/// Finalizer guaranteeing AuthIntent cleanup-and-rebuild runs before removal.
pub const FINALIZER_AUTH_INTENT: &str = "authintent.maas.io/finalizer";
/// Finalizer guaranteeing Subscription cleanup-and-rebuild runs before removal.
pub const FINALIZER_SUBSCRIPTION: &str = "subscription.maas.io/finalizer";

/// A reference to a named, namespaced object, used both as a cluster-API
/// lookup key and as a `targetRef` inside emitted policy specs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Metadata carried by every reconciled object: identity, optimistic
/// concurrency token, finalizers, labels, and annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,

    /// Opaque optimistic-concurrency token. Bumped on every successful
    /// write by the store; a write with a stale version is rejected with
    /// `StoreError::Conflict` so the caller can retry (§5, "server-side
    /// optimistic concurrency on each write").
    #[serde(default)]
    pub resource_version: u64,

    /// Set by the store when a delete has been requested but finalizers
    /// are still present. A reconciler must run its finalizer logic, then
    /// remove its finalizer; the store deletes the object once the
    /// finalizer list is empty.
    #[serde(default)]
    pub deletion_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub finalizers: Vec<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_version: 0,
            deletion_timestamp: None,
            finalizers: Vec::new(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.name.clone(), self.namespace.clone())
    }

    pub fn has_finalizer(&self, name: &str) -> bool {
        self.finalizers.iter().any(|f| f == name)
    }

    /// Add a finalizer if absent. Returns `true` if the set changed.
    pub fn add_finalizer(&mut self, name: &str) -> bool {
        if self.has_finalizer(name) {
            false
        } else {
            self.finalizers.push(name.to_owned());
            true
        }
    }

    /// Remove a finalizer if present. Returns `true` if the set changed.
    pub fn remove_finalizer(&mut self, name: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != name);
        self.finalizers.len() != before
    }

    /// Invariant 4 ("Opt-out"): an emitted object annotated `managed=false`
    /// is never updated or deleted by reconciliation.
    #[must_use]
    pub fn is_unmanaged(&self) -> bool {
        self.annotations
            .get(ANNOTATION_MANAGED)
            .is_some_and(|v| v == "false")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalizer_add_is_idempotent() {
        let mut meta = ObjectMeta::new("m1", "ns");
        assert!(meta.add_finalizer(FINALIZER_MODEL));
        assert!(!meta.add_finalizer(FINALIZER_MODEL));
        assert_eq!(meta.finalizers.len(), 1);
    }

    #[test]
    fn unmanaged_opt_out() {
        let mut meta = ObjectMeta::new("p1", "ns");
        assert!(!meta.is_unmanaged());
        meta.annotations
            .insert(ANNOTATION_MANAGED.to_owned(), "false".to_owned());
        assert!(meta.is_unmanaged());
    }
}
