//! Route Resolver (C1, §4.1): given a Model, find the HTTPRoute that
//! fronts it. Pluggable per [`BackendKind`].

use std::sync::Arc;

use async_trait::async_trait;

use maas_core::{BackendKind, HttpRoute, Model, ObjectRef};
use maas_store::ObjectStore;

use crate::error::BackendError;

/// Label selector tags HTTPRoutes front-ending Models must carry so
/// `InternalInferenceResolver` can find them (§4.1). These describe
/// routes deployed by the inference platform, not objects this crate
/// writes, so they are distinct from the `maas.io/part-of` / `component`
/// labels `maas-policy` stamps on *emitted* policies.
pub const ROUTE_COMPONENT_TAG: &str = "inference-router";
pub const ROUTE_PART_OF_TAG: &str = "maas-inference";

#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve(&self, model: &Model) -> Result<ObjectRef, BackendError>;
}

/// `ExternalModel`'s deterministic route-name pattern (§4.1: "route name
/// defaults to a deterministic pattern derived from model.name").
#[must_use]
pub fn external_route_name(model_name: &str) -> String {
    format!("{model_name}-external-route")
}

/// Resolves a Model's route by label selection within the backend's
/// namespace, falling back to the Model's own namespace.
pub struct InternalInferenceResolver {
    routes: Arc<dyn ObjectStore<HttpRoute>>,
}

impl InternalInferenceResolver {
    #[must_use]
    pub fn new(routes: Arc<dyn ObjectStore<HttpRoute>>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl RouteResolver for InternalInferenceResolver {
    async fn resolve(&self, model: &Model) -> Result<ObjectRef, BackendError> {
        let namespace = model
            .spec
            .backend_ref
            .namespace
            .clone()
            .unwrap_or_else(|| model.meta.namespace.clone());

        let candidates = self.routes.list(Some(&namespace)).await?;
        let mut matching: Vec<&HttpRoute> = candidates
            .iter()
            .filter(|route| {
                route.meta.name == model.spec.backend_ref.name
                    && route.meta.labels.get("component").map(String::as_str)
                        == Some(ROUTE_COMPONENT_TAG)
                    && route.meta.labels.get("part-of").map(String::as_str)
                        == Some(ROUTE_PART_OF_TAG)
            })
            .collect();

        if matching.is_empty() {
            return Err(BackendError::RouteNotFound {
                model: model.meta.name.clone(),
                backend: model.spec.backend_ref.name.clone(),
            });
        }

        // Stable tie-break: lexicographically first name.
        matching.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        let chosen = matching[0];
        Ok(ObjectRef::new(chosen.meta.name.clone(), chosen.meta.namespace.clone()))
    }
}

/// `ExternalModel` never searches by label; the route name is derived.
pub struct ExternalModelResolver;

#[async_trait]
impl RouteResolver for ExternalModelResolver {
    async fn resolve(&self, model: &Model) -> Result<ObjectRef, BackendError> {
        Ok(ObjectRef::new(
            external_route_name(&model.meta.name),
            model.meta.namespace.clone(),
        ))
    }
}

/// Picks the resolver for a [`BackendKind`], or `UnknownKind` (§4.1).
pub fn resolver_for(
    kind: BackendKind,
    routes: Arc<dyn ObjectStore<HttpRoute>>,
) -> Result<Arc<dyn RouteResolver>, BackendError> {
    match kind {
        BackendKind::InternalInference => Ok(Arc::new(InternalInferenceResolver::new(routes))),
        BackendKind::ExternalModel => Ok(Arc::new(ExternalModelResolver)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::{BackendRef, ModelSpec};
    use maas_store_memory::MemoryStore;

    fn model() -> Model {
        Model::new(
            "m1",
            "ns",
            ModelSpec {
                backend_kind: BackendKind::InternalInference,
                backend_ref: BackendRef {
                    name: "m1-backend".into(),
                    namespace: None,
                },
            },
        )
    }

    fn tagged_route(name: &str, namespace: &str) -> HttpRoute {
        let mut route = HttpRoute::new(name, namespace, Default::default());
        route
            .meta
            .labels
            .insert("component".into(), ROUTE_COMPONENT_TAG.into());
        route
            .meta
            .labels
            .insert("part-of".into(), ROUTE_PART_OF_TAG.into());
        route
    }

    #[tokio::test]
    async fn internal_inference_picks_lexicographically_first_on_tie() {
        let store: Arc<MemoryStore<HttpRoute>> = Arc::new(MemoryStore::new());
        let mut r1 = tagged_route("m1-backend", "ns");
        r1.meta.name = "m1-backend".into();
        store.create(r1).await.unwrap();

        let resolver = InternalInferenceResolver::new(store.clone());
        let resolved = resolver.resolve(&model()).await.unwrap();
        assert_eq!(resolved.name, "m1-backend");
        assert_eq!(resolved.namespace, "ns");
    }

    #[tokio::test]
    async fn internal_inference_fails_when_no_route_matches() {
        let store: Arc<MemoryStore<HttpRoute>> = Arc::new(MemoryStore::new());
        let resolver = InternalInferenceResolver::new(store);
        let err = resolver.resolve(&model()).await.unwrap_err();
        assert!(matches!(err, BackendError::RouteNotFound { .. }));
    }

    #[tokio::test]
    async fn external_model_uses_deterministic_name_without_searching() {
        let mut m = model();
        m.spec.backend_kind = BackendKind::ExternalModel;
        let resolved = ExternalModelResolver.resolve(&m).await.unwrap();
        assert_eq!(resolved.name, "m1-external-route");
    }
}
