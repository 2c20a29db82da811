//! Model Controller (C3, §4.3): single-object reconciliation loop keyed
//! by (name, namespace), owning the Model state machine and cascading
//! cleanup of emitted policies on delete.

use std::collections::HashMap;
use std::sync::Arc;

use maas_backend::{BackendError, BackendHandler};
use maas_core::{BackendKind, EmittedPolicy, FINALIZER_MODEL, Model, ModelPhase, ObjectRef};
use maas_store::ObjectStore;

use crate::error::ControllerError;
use crate::policy_ops::delete_emitted_for_model;

/// Backend handlers registered by kind — the counterpart to
/// `maas_backend::handler_for`, kept here so the controller can be built
/// once with every kind wired up rather than constructing handlers per
/// reconcile.
pub struct BackendRegistry {
    handlers: HashMap<BackendKind, Arc<dyn BackendHandler>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: BackendKind, handler: Arc<dyn BackendHandler>) {
        self.handlers.insert(kind, handler);
    }

    #[must_use]
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendHandler>> {
        self.handlers.get(&kind).cloned()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ModelController {
    models: Arc<dyn ObjectStore<Model>>,
    auth_policies: Arc<dyn ObjectStore<EmittedPolicy>>,
    rate_limit_policies: Arc<dyn ObjectStore<EmittedPolicy>>,
    backends: BackendRegistry,
}

impl ModelController {
    #[must_use]
    pub fn new(
        models: Arc<dyn ObjectStore<Model>>,
        auth_policies: Arc<dyn ObjectStore<EmittedPolicy>>,
        rate_limit_policies: Arc<dyn ObjectStore<EmittedPolicy>>,
        backends: BackendRegistry,
    ) -> Self {
        Self {
            models,
            auth_policies,
            rate_limit_policies,
            backends,
        }
    }

    /// Step 1 of reconcile: tombstoned Models delete their cascaded
    /// emitted policies, dispatch cleanup, then drop the finalizer.
    async fn reconcile_deletion(&self, mut model: Model) -> Result<(), ControllerError> {
        delete_emitted_for_model(&*self.auth_policies, &model.meta.name).await?;
        delete_emitted_for_model(&*self.rate_limit_policies, &model.meta.name).await?;

        if let Some(handler) = self.backends.get(model.spec.backend_kind) {
            // Cleanup failures are logged by the caller; a Model stuck
            // mid-delete must not block forever, so we still drop the
            // finalizer once cascaded policies are gone.
            let _ = handler.cleanup_on_delete(&model).await;
        }

        model.meta.remove_finalizer(FINALIZER_MODEL);
        let key = model.meta.object_ref();
        self.models.update(model).await?;
        // Finalizers are now empty, so this actually removes the object
        // per `ObjectStore::delete`'s documented contract.
        self.models.delete(&key).await?;
        Ok(())
    }

    /// The non-deletion reconcile path: steps 2-6 of §4.3.
    async fn reconcile_live(&self, mut model: Model) -> Result<(), ControllerError> {
        if model.meta.add_finalizer(FINALIZER_MODEL) {
            model = self.models.update(model).await?;
        }

        let Some(handler) = self.backends.get(model.spec.backend_kind) else {
            model.status.phase = ModelPhase::Failed;
            model.status.reason = Some(format!("no backend handler for kind {}", model.spec.backend_kind));
            let _ = self.models.update_status(model).await;
            return Ok(());
        };

        if let Err(err) = handler.reconcile_route(&mut model).await {
            match err {
                BackendError::Unsupported(reason) => {
                    model.status.phase = ModelPhase::Failed;
                    model.status.reason = Some(reason);
                    let _ = self.models.update_status(model).await;
                    return Ok(());
                }
                other => {
                    model.status.phase = ModelPhase::Failed;
                    model.status.reason = Some(other.to_string());
                    let _ = self.models.update_status(model).await;
                    return Err(other.into());
                }
            }
        }

        match handler.status(&model).await {
            Ok((endpoint, ready)) => {
                model.status.endpoint_url = if endpoint.is_empty() { None } else { Some(endpoint) };
                model.status.phase = if ready { ModelPhase::Ready } else { ModelPhase::Pending };
                model.status.reason = None;
            }
            Err(BackendError::Unsupported(reason)) => {
                model.status.phase = ModelPhase::Failed;
                model.status.reason = Some(reason);
            }
            Err(other) => {
                model.status.phase = ModelPhase::Failed;
                model.status.reason = Some(other.to_string());
                let _ = self.models.update_status(model).await;
                return Err(other.into());
            }
        }

        // Step 6: status-write failures are logged, not requeued.
        if let Err(err) = self.models.update_status(model).await {
            tracing::warn!(error = %err, "model status write failed, will eventually reconverge");
        }
        Ok(())
    }

    /// Full §4.3 reconcile for one Model key.
    pub async fn reconcile(&self, key: &ObjectRef) -> Result<(), ControllerError> {
        let Some(model) = self.models.get(key).await? else {
            return Ok(());
        };

        if model.meta.deletion_timestamp.is_some() {
            self.reconcile_deletion(model).await
        } else {
            self.reconcile_live(model).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_backend::{BackendConfig, ExternalModelHandler};
    use maas_core::{
        BackendRef, Gateway, HttpRoute, LABEL_MANAGED_BY, LABEL_MODEL, MANAGED_BY_VALUE, ModelSpec,
    };
    use maas_store_memory::MemoryStore;

    fn model() -> Model {
        Model::new(
            "m1",
            "ns",
            ModelSpec {
                backend_kind: BackendKind::ExternalModel,
                backend_ref: BackendRef {
                    name: "m1-backend".into(),
                    namespace: None,
                },
            },
        )
    }

    #[tokio::test]
    async fn unknown_kind_fails_without_requeue() {
        let models: Arc<MemoryStore<Model>> = Arc::new(MemoryStore::new());
        let auth: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let rate: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        models.create(model()).await.unwrap();

        let controller = ModelController::new(models.clone(), auth, rate, BackendRegistry::new());
        controller
            .reconcile(&ObjectRef::new("m1", "ns"))
            .await
            .unwrap();

        let updated = models.get(&ObjectRef::new("m1", "ns")).await.unwrap().unwrap();
        assert_eq!(updated.status.phase, ModelPhase::Failed);
    }

    #[tokio::test]
    async fn external_model_status_unsupported_terminates_without_error() {
        let models: Arc<MemoryStore<Model>> = Arc::new(MemoryStore::new());
        let auth: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let rate: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let routes: Arc<MemoryStore<HttpRoute>> = Arc::new(MemoryStore::new());
        models.create(model()).await.unwrap();

        let mut backends = BackendRegistry::new();
        backends.register(
            BackendKind::ExternalModel,
            Arc::new(ExternalModelHandler::new(routes, BackendConfig::default())),
        );

        let controller = ModelController::new(models.clone(), auth, rate, backends);
        controller.reconcile(&ObjectRef::new("m1", "ns")).await.unwrap();

        let updated = models.get(&ObjectRef::new("m1", "ns")).await.unwrap().unwrap();
        assert_eq!(updated.status.phase, ModelPhase::Failed);
        assert_eq!(
            updated.status.reason.as_deref(),
            Some("ExternalModel status derivation is not implemented")
        );
    }

    #[tokio::test]
    async fn deletion_cascades_cleanup_of_labeled_emitted_policies() {
        let models: Arc<MemoryStore<Model>> = Arc::new(MemoryStore::new());
        let auth: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let rate: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let mut m = model();
        m.meta.add_finalizer(FINALIZER_MODEL);
        m.meta.deletion_timestamp = Some(chrono::Utc::now());
        models.create(m).await.unwrap();

        let mut policy = EmittedPolicy::new("m1-auth", "ns", serde_json::json!({}));
        policy.meta.labels.insert(LABEL_MODEL.into(), "m1".into());
        policy.meta.labels.insert(LABEL_MANAGED_BY.into(), MANAGED_BY_VALUE.into());
        auth.create(policy).await.unwrap();

        let controller = ModelController::new(models.clone(), auth.clone(), rate, BackendRegistry::new());
        controller.reconcile(&ObjectRef::new("m1", "ns")).await.unwrap();

        assert!(auth.list(None).await.unwrap().is_empty());
        assert!(models.get(&ObjectRef::new("m1", "ns")).await.unwrap().is_none());
    }
}
