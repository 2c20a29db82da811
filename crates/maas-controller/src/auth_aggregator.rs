//! Auth Aggregator (C4, §4.4): keyed by Model name, rebuilds the single
//! emitted AuthPolicy for a Model from every live AuthIntent referencing
//! it.

use std::sync::Arc;

use maas_core::{
    AuthIntent, ConditionStatus, EmittedPolicy, EmittedPolicyRef, HttpRoute, LABEL_COMPONENT,
    LABEL_MANAGED_BY, LABEL_MODEL, LABEL_PART_OF, MANAGED_BY_VALUE, Model,
};
use maas_policy::{AuthConfig, ContributingAuthIntent, build_auth_policy_spec};
use maas_store::ObjectStore;

use crate::error::ControllerError;
use crate::policy_ops::{delete_emitted_for_model, upsert_emitted};

const ANNOTATION_AUTH_POLICIES: &str = maas_core::ANNOTATION_AUTH_POLICIES;

pub struct AuthAggregator {
    models: Arc<dyn ObjectStore<Model>>,
    intents: Arc<dyn ObjectStore<AuthIntent>>,
    policies: Arc<dyn ObjectStore<EmittedPolicy>>,
    routes: Arc<dyn ObjectStore<HttpRoute>>,
    config: AuthConfig,
}

impl AuthAggregator {
    #[must_use]
    pub fn new(
        models: Arc<dyn ObjectStore<Model>>,
        intents: Arc<dyn ObjectStore<AuthIntent>>,
        policies: Arc<dyn ObjectStore<EmittedPolicy>>,
        routes: Arc<dyn ObjectStore<HttpRoute>>,
        config: AuthConfig,
    ) -> Self {
        Self {
            models,
            intents,
            policies,
            routes,
            config,
        }
    }

    async fn live_intents_for(&self, model_name: &str) -> Result<Vec<AuthIntent>, ControllerError> {
        Ok(self
            .intents
            .list(None)
            .await?
            .into_iter()
            .filter(|i| i.meta.deletion_timestamp.is_none())
            .filter(|i| i.spec.model_refs.iter().any(|m| m == model_name))
            .collect())
    }

    async fn find_model(&self, model_name: &str) -> Result<Option<Model>, ControllerError> {
        Ok(self
            .models
            .list(None)
            .await?
            .into_iter()
            .find(|m| m.meta.name == model_name))
    }

    /// §4.4 algorithm, run for one Model name. A single Model's failure
    /// does not poison others — the caller attempts each Model in turn
    /// (§4.4 "Failure semantics").
    pub async fn reconcile_model(&self, model_name: &str) -> Result<(), ControllerError> {
        let live_intents = self.live_intents_for(model_name).await?;

        let Some(model) = self.find_model(model_name).await? else {
            delete_emitted_for_model(&*self.policies, model_name).await?;
            return Ok(());
        };

        let resolver = maas_backend::resolver_for(model.spec.backend_kind, self.routes.clone())?;
        let route = match resolver.resolve(&model).await {
            Ok(route) => route,
            Err(_) => {
                delete_emitted_for_model(&*self.policies, model_name).await?;
                return Ok(());
            }
        };

        let contributing: Vec<ContributingAuthIntent> = live_intents
            .iter()
            .map(|i| ContributingAuthIntent {
                name: i.meta.name.clone(),
                groups: i.spec.subjects.groups.clone(),
                users: i.spec.subjects.users.clone(),
            })
            .collect();

        // Validation failures abort before any upsert (invariant 7).
        let built = build_auth_policy_spec(&route, &contributing, &self.config)?;

        let emitted_name = format!("{model_name}-auth-policy");
        upsert_emitted(
            &*self.policies,
            &emitted_name,
            &model.meta.namespace,
            built.spec,
            vec![
                (LABEL_MODEL, model_name.to_owned()),
                (LABEL_MANAGED_BY, MANAGED_BY_VALUE.to_owned()),
                (LABEL_PART_OF, "auth".to_owned()),
                (LABEL_COMPONENT, "auth-policy".to_owned()),
            ],
            ANNOTATION_AUTH_POLICIES,
            &built.contributing_names,
        )
        .await?;

        self.project_status(&live_intents, model_name, &emitted_name, &model.meta.namespace)
            .await?;

        Ok(())
    }

    /// Contributing-intent status projection (§4.4): append
    /// `(emittedName, namespace, model, accepted, enforced)` to every
    /// contributing intent, reading the emitted object's own conditions.
    async fn project_status(
        &self,
        live_intents: &[AuthIntent],
        model_name: &str,
        emitted_name: &str,
        emitted_namespace: &str,
    ) -> Result<(), ControllerError> {
        let key = maas_core::ObjectRef::new(emitted_name, emitted_namespace);
        let emitted = self.policies.get(&key).await?;

        let (accepted, enforced) = emitted.as_ref().map_or(
            (ConditionStatus::Unknown, ConditionStatus::Unknown),
            |policy| {
                (
                    maas_core::Condition::find(&policy.status.conditions, "Accepted")
                        .map_or(ConditionStatus::Unknown, |c| c.status),
                    maas_core::Condition::find(&policy.status.conditions, "Enforced")
                        .map_or(ConditionStatus::Unknown, |c| c.status),
                )
            },
        );

        for intent in live_intents {
            let mut intent = intent.clone();
            let entry = EmittedPolicyRef {
                name: emitted_name.to_owned(),
                namespace: emitted_namespace.to_owned(),
                model: model_name.to_owned(),
                accepted,
                enforced,
            };
            intent
                .status
                .auth_policies
                .retain(|r| r.model != model_name);
            intent.status.auth_policies.push(entry);
            self.intents.update_status(intent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::{AuthIntentSpec, BackendKind, BackendRef, ModelSpec, ObjectRef, Subjects};
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

    fn aggregator() -> (
        AuthAggregator,
        Arc<MemoryStore<Model>>,
        Arc<MemoryStore<AuthIntent>>,
        Arc<MemoryStore<EmittedPolicy>>,
    ) {
        let models: Arc<MemoryStore<Model>> = Arc::new(MemoryStore::new());
        let intents: Arc<MemoryStore<AuthIntent>> = Arc::new(MemoryStore::new());
        let policies: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
        let routes: Arc<MemoryStore<HttpRoute>> = Arc::new(MemoryStore::new());
        let aggregator = AuthAggregator::new(
            models.clone(),
            intents.clone(),
            policies.clone(),
            routes,
            AuthConfig::default(),
        );
        (aggregator, models, intents, policies)
    }

    #[tokio::test]
    async fn missing_model_deletes_emitted_policy() {
        let (aggregator, models, _intents, policies) = aggregator();
        let _ = models;
        let mut policy = EmittedPolicy::new("m1-auth-policy", "ns", serde_json::json!({}));
        policy.meta.labels.insert(LABEL_MODEL.into(), "m1".into());
        policy.meta.labels.insert(LABEL_MANAGED_BY.into(), MANAGED_BY_VALUE.into());
        policies.create(policy).await.unwrap();

        aggregator.reconcile_model("m1").await.unwrap();
        assert!(policies.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn builds_union_and_projects_status_onto_every_contributing_intent() {
        let (aggregator, models, intents, policies) = aggregator();
        models.create(model()).await.unwrap();
        let intent = AuthIntent::new(
            "intent-a",
            "ns",
            AuthIntentSpec {
                model_refs: vec!["m1".into()],
                subjects: Subjects {
                    groups: vec!["team-a".into()],
                    users: vec![],
                },
                metering_metadata: Default::default(),
            },
        );
        intents.create(intent).await.unwrap();

        aggregator.reconcile_model("m1").await.unwrap();

        let emitted = policies
            .get(&ObjectRef::new("m1-auth-policy", "ns"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(emitted.meta.annotations.get("maas.io/auth-policies").unwrap(), "intent-a");

        let updated_intent = intents
            .get(&ObjectRef::new("intent-a", "ns"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated_intent.status.auth_policies.len(), 1);
        assert_eq!(updated_intent.status.auth_policies[0].model, "m1");
    }

    #[tokio::test]
    async fn unsafe_subject_aborts_without_upsert() {
        let (aggregator, models, intents, policies) = aggregator();
        models.create(model()).await.unwrap();
        let intent = AuthIntent::new(
            "intent-a",
            "ns",
            AuthIntentSpec {
                model_refs: vec!["m1".into()],
                subjects: Subjects {
                    groups: vec!["foo\"bar".into()],
                    users: vec![],
                },
                metering_metadata: Default::default(),
            },
        );
        intents.create(intent).await.unwrap();

        let err = aggregator.reconcile_model("m1").await.unwrap_err();
        assert!(matches!(err, ControllerError::Policy(_)));
        assert!(policies.list(None).await.unwrap().is_empty());
    }
}
