//! `HTTPRoute` and `Gateway`: external Gateway-API dataplane objects (§3).
//! Read-only to most of this system; the `ExternalModel` backend handler
//! is the sole writer of routes it owns (§4.2).

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionStatus};
use crate::meta::{ObjectMeta, ObjectRef};
use crate::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRouteRule {
    pub path_prefix: String,
    pub backend_refs: Vec<ObjectRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpRouteSpec {
    pub parent_refs: Vec<ObjectRef>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub rules: Vec<HttpRouteRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpRouteStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Addresses the backend advertises for this route, in no particular
    /// order; the handler's endpoint derivation prefers the first
    /// `https://` entry (§4.2).
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl HttpRouteStatus {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        Condition::find(&self.conditions, "Ready")
            .is_some_and(|c| c.status == ConditionStatus::True)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRoute {
    pub meta: ObjectMeta,
    pub spec: HttpRouteSpec,
    #[serde(default)]
    pub status: HttpRouteStatus,
}

impl HttpRoute {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: HttpRouteSpec) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            spec,
            status: HttpRouteStatus::default(),
        }
    }
}

impl Resource for HttpRoute {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayListener {
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub listeners: Vec<GatewayListener>,
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub meta: ObjectMeta,
    #[serde(default)]
    pub status: GatewayStatus,
}

impl Gateway {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            status: GatewayStatus::default(),
        }
    }
}

impl Resource for Gateway {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}
