//! Backend Handler (C2, §4.2): per backend-kind reconciliation of the
//! HTTPRoute fronting a Model, readiness derivation, and delete cleanup.

use std::sync::Arc;

use async_trait::async_trait;

use maas_core::{BackendKind, Gateway, HttpRoute, HttpRouteRule, HttpRouteSpec, Model, ObjectRef};
use maas_store::ObjectStore;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::resolver::{ExternalModelResolver, InternalInferenceResolver, RouteResolver, external_route_name};

#[async_trait]
pub trait BackendHandler: Send + Sync {
    /// Populate or create the Model's route, writing route/gateway
    /// identity into `status` in place. Must be idempotent.
    async fn reconcile_route(&self, model: &mut Model) -> Result<(), BackendError>;

    /// `(endpoint_url, ready)`. Never mutates anything.
    async fn status(&self, model: &Model) -> Result<(String, bool), BackendError>;

    /// Clean up any route this handler owns. No-op if it owns nothing.
    async fn cleanup_on_delete(&self, model: &Model) -> Result<(), BackendError>;
}

pub struct InternalInferenceHandler {
    routes: Arc<dyn ObjectStore<HttpRoute>>,
    gateways: Arc<dyn ObjectStore<Gateway>>,
    resolver: InternalInferenceResolver,
    config: BackendConfig,
}

impl InternalInferenceHandler {
    #[must_use]
    pub fn new(
        routes: Arc<dyn ObjectStore<HttpRoute>>,
        gateways: Arc<dyn ObjectStore<Gateway>>,
        config: BackendConfig,
    ) -> Self {
        let resolver = InternalInferenceResolver::new(routes.clone());
        Self {
            routes,
            gateways,
            resolver,
            config,
        }
    }

    async fn resolved_route(&self, model: &Model) -> Result<HttpRoute, BackendError> {
        let route_ref = self.resolver.resolve(model).await?;
        self.routes
            .get(&route_ref)
            .await?
            .ok_or(BackendError::RouteNotFound {
                model: model.meta.name.clone(),
                backend: model.spec.backend_ref.name.clone(),
            })
    }
}

#[async_trait]
impl BackendHandler for InternalInferenceHandler {
    async fn reconcile_route(&self, model: &mut Model) -> Result<(), BackendError> {
        let route = self.resolved_route(model).await?;

        let targets_configured_gateway = route.spec.parent_refs.iter().any(|g| {
            g.name == self.config.gateway_name && g.namespace == self.config.gateway_namespace
        });
        if !targets_configured_gateway {
            return Err(BackendError::RouteNotFound {
                model: model.meta.name.clone(),
                backend: model.spec.backend_ref.name.clone(),
            });
        }

        model.status.http_route_ref = Some(route.meta.object_ref());
        model.status.gateway_ref = Some(ObjectRef::new(
            self.config.gateway_name.clone(),
            self.config.gateway_namespace.clone(),
        ));
        model.status.hostnames = route.spec.hostnames.clone();
        Ok(())
    }

    async fn status(&self, model: &Model) -> Result<(String, bool), BackendError> {
        let route = self.resolved_route(model).await?;
        if !route.status.is_ready() {
            return Ok((String::new(), false));
        }

        if let Some(https) = route.status.addresses.iter().find(|a| a.starts_with("https://")) {
            return Ok((https.clone(), true));
        }
        if let Some(addr) = route.status.addresses.first() {
            return Ok((addr.clone(), true));
        }
        if let Some(hostname) = route.spec.hostnames.first() {
            return Ok((format!("{hostname}/{}", model.meta.name), true));
        }

        let gateway_ref = ObjectRef::new(
            self.config.gateway_name.clone(),
            self.config.gateway_namespace.clone(),
        );
        if let Some(gateway) = self.gateways.get(&gateway_ref).await? {
            if let Some(listener_host) = gateway
                .status
                .listeners
                .iter()
                .find_map(|l| l.hostname.clone())
            {
                return Ok((listener_host, true));
            }
            if let Some(addr) = gateway.status.addresses.first() {
                return Ok((addr.clone(), true));
            }
        }

        Ok((String::new(), true))
    }

    async fn cleanup_on_delete(&self, _model: &Model) -> Result<(), BackendError> {
        // The route is owned by the inference platform, not by this
        // controller (§4.2).
        Ok(())
    }
}

pub struct ExternalModelHandler {
    routes: Arc<dyn ObjectStore<HttpRoute>>,
    config: BackendConfig,
}

impl ExternalModelHandler {
    #[must_use]
    pub fn new(routes: Arc<dyn ObjectStore<HttpRoute>>, config: BackendConfig) -> Self {
        Self { routes, config }
    }
}

#[async_trait]
impl BackendHandler for ExternalModelHandler {
    async fn reconcile_route(&self, model: &mut Model) -> Result<(), BackendError> {
        let route_ref = ExternalModelResolver.resolve(model).await?;
        let spec = HttpRouteSpec {
            parent_refs: vec![ObjectRef::new(
                self.config.gateway_name.clone(),
                self.config.gateway_namespace.clone(),
            )],
            hostnames: Vec::new(),
            rules: vec![HttpRouteRule {
                path_prefix: format!("/{}", model.meta.name),
                backend_refs: vec![ObjectRef::new(
                    model.spec.backend_ref.name.clone(),
                    model
                        .spec
                        .backend_ref
                        .namespace
                        .clone()
                        .unwrap_or_else(|| model.meta.namespace.clone()),
                )],
            }],
        };

        match self.routes.get(&route_ref).await? {
            Some(mut existing) => {
                existing.spec = spec;
                self.routes.update(existing).await?;
            }
            None => {
                self.routes
                    .create(HttpRoute::new(route_ref.name.clone(), route_ref.namespace.clone(), spec))
                    .await?;
            }
        }

        model.status.http_route_ref = Some(route_ref);
        model.status.gateway_ref = Some(ObjectRef::new(
            self.config.gateway_name.clone(),
            self.config.gateway_namespace.clone(),
        ));
        Ok(())
    }

    async fn status(&self, _model: &Model) -> Result<(String, bool), BackendError> {
        Err(BackendError::Unsupported(
            "ExternalModel status derivation is not implemented".to_owned(),
        ))
    }

    async fn cleanup_on_delete(&self, model: &Model) -> Result<(), BackendError> {
        let route_ref = ObjectRef::new(external_route_name(&model.meta.name), model.meta.namespace.clone());
        self.routes.delete(&route_ref).await?;
        Ok(())
    }
}

/// Picks the handler for a [`BackendKind`], or `UnknownKind` (§4.1, §4.3
/// step 3: "Look up `BackendHandler[kind]`. If nil -> phase=Failed").
pub fn handler_for(
    kind: BackendKind,
    routes: Arc<dyn ObjectStore<HttpRoute>>,
    gateways: Arc<dyn ObjectStore<Gateway>>,
    config: BackendConfig,
) -> Result<Arc<dyn BackendHandler>, BackendError> {
    match kind {
        BackendKind::InternalInference => {
            Ok(Arc::new(InternalInferenceHandler::new(routes, gateways, config)))
        }
        BackendKind::ExternalModel => Ok(Arc::new(ExternalModelHandler::new(routes, config))),
    }
}
