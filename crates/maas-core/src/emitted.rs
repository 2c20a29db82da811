//! `EmittedAuthPolicy` / `EmittedRateLimitPolicy` (§3): the low-level
//! policy-engine objects exclusively owned by the Auth and RateLimit
//! aggregators. Both kinds share this one shape — a generic spec tree
//! (§9, "best represented as a generic tree... rather than a typed
//! schema") plus the `Accepted`/`Enforced` condition pair the aggregator
//! reads back onto contributing intents' status (§4.4).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::meta::ObjectMeta;
use crate::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmittedPolicyStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedPolicy {
    pub meta: ObjectMeta,
    pub spec: Value,
    #[serde(default)]
    pub status: EmittedPolicyStatus,
}

impl EmittedPolicy {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: Value) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            spec,
            status: EmittedPolicyStatus::default(),
        }
    }
}

impl Resource for EmittedPolicy {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}
