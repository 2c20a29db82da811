//! The `AuthIntent` custom resource (§3): who may call which models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::ObjectMeta;
use crate::Resource;

/// `subjects`: at least one of `groups`/`users` must be non-empty (§3
/// invariant on AuthIntent attributes). Validated by the aggregator, not
/// at this layer, since validity also depends on CEL-safety of the values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subjects {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl Subjects {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIntentSpec {
    /// List of Model names this intent grants access to, at least one.
    pub model_refs: Vec<String>,
    pub subjects: Subjects,
    #[serde(default)]
    pub metering_metadata: BTreeMap<String, String>,
}

/// Per-emitted-policy status projection written back onto every
/// contributing intent (§4.4, "Contributing-intent status projection").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedPolicyRef {
    pub name: String,
    pub namespace: String,
    pub model: String,
    pub accepted: crate::condition::ConditionStatus,
    pub enforced: crate::condition::ConditionStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthIntentStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub auth_policies: Vec<EmittedPolicyRef>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIntent {
    pub meta: ObjectMeta,
    pub spec: AuthIntentSpec,
    #[serde(default)]
    pub status: AuthIntentStatus,
}

impl AuthIntent {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        spec: AuthIntentSpec,
    ) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            spec,
            status: AuthIntentStatus::default(),
        }
    }
}

impl Resource for AuthIntent {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}
