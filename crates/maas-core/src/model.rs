//! The `Model` custom resource (§3): binds a MaaS identifier to an
//! inference backend.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::{ObjectMeta, ObjectRef};
use crate::Resource;

/// The kind of inference backend a Model binds to. Dispatches to a
/// different [`RouteResolver`](../../maas_backend/trait.RouteResolver.html)
/// / `BackendHandler` pair per §4.1/§4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BackendKind {
    InternalInference,
    ExternalModel,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InternalInference => f.write_str("InternalInference"),
            Self::ExternalModel => f.write_str("ExternalModel"),
        }
    }
}

/// Reference to the backend object a Model binds to. `namespace` is
/// optional on the wire; resolvers default it to the Model's own
/// namespace (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendRef {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub backend_kind: BackendKind,
    pub backend_ref: BackendRef,
}

/// The Model state machine (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ModelPhase {
    Pending,
    Ready,
    Unhealthy,
    Failed,
}

impl Default for ModelPhase {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub phase: ModelPhase,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub http_route_ref: Option<ObjectRef>,
    #[serde(default)]
    pub gateway_ref: Option<ObjectRef>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub meta: ObjectMeta,
    pub spec: ModelSpec,
    #[serde(default)]
    pub status: ModelStatus,
}

impl Model {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: ModelSpec) -> Self {
        Self {
            meta: ObjectMeta::new(name, namespace),
            spec,
            status: ModelStatus::default(),
        }
    }
}

impl Resource for Model {
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
    fn default_phase_is_pending() {
        let status = ModelStatus::default();
        assert_eq!(status.phase, ModelPhase::Pending);
    }
}
