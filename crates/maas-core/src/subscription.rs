//! The `Subscription` custom resource (§3): token-rate quotas with
//! priority.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::ObjectMeta;
use crate::Resource;

/// A single token-rate limit: `{limit, window}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRateLimit {
    pub limit: i64,
    pub window: String,
}

impl Default for TokenRateLimit {
    /// §4.5: "default `{limit:100, window:"1m"}` if none".
    fn default() -> Self {
        Self {
            limit: 100,
            window: "1m".to_owned(),
        }
    }
}

/// One Model a Subscription grants a rate allowance against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionModelRef {
    pub name: String,
    #[serde(default)]
    pub token_rate_limits: Vec<TokenRateLimit>,
}

impl SubscriptionModelRef {
    /// §4.5: `maxLimit = max(limit over all rates)`, defaulting the rate
    /// list itself when empty.
    #[must_use]
    pub fn effective_rates(&self) -> Vec<TokenRateLimit> {
        if self.token_rate_limits.is_empty() {
            vec![TokenRateLimit::default()]
        } else {
            self.token_rate_limits.clone()
        }
    }

    #[must_use]
    pub fn max_limit(&self) -> i64 {
        self.effective_rates()
            .iter()
            .map(|r| r.limit)
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Metering passthrough metadata returned by the selector (§4.6, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    pub owner: Owner,
    pub model_refs: Vec<SubscriptionModelRef>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub token_metadata: Option<TokenMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub meta: ObjectMeta,
    pub spec: SubscriptionSpec,
    #[serde(default)]
    pub status: SubscriptionStatus,
}

impl Subscription {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        spec: SubscriptionSpec,
    ) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            spec,
            status: SubscriptionStatus::default(),
        }
    }

    /// Rate limits this Subscription grants against the named Model, or
    /// `None` if it does not reference that Model at all.
    #[must_use]
    pub fn model_ref(&self, model: &str) -> Option<&SubscriptionModelRef> {
        self.spec.model_refs.iter().find(|m| m.name == model)
    }
}

impl Resource for Subscription {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_limit_is_100_per_minute() {
        let m = SubscriptionModelRef {
            name: "m1".into(),
            token_rate_limits: Vec::new(),
        };
        assert_eq!(m.max_limit(), 100);
        assert_eq!(m.effective_rates()[0].window, "1m");
    }

    #[test]
    fn max_limit_picks_largest_rate() {
        let m = SubscriptionModelRef {
            name: "m1".into(),
            token_rate_limits: vec![
                TokenRateLimit {
                    limit: 10,
                    window: "1s".into(),
                },
                TokenRateLimit {
                    limit: 1000,
                    window: "1m".into(),
                },
            ],
        };
        assert_eq!(m.max_limit(), 1000);
    }
}
