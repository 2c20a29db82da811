//! Rate-Limit Aggregator (C4, §4.5): keyed by Model name, rebuilds the
//! single emitted RateLimitPolicy for a Model from every live
//! Subscription referencing it.

use std::sync::Arc;

use maas_core::{
    EmittedPolicy, HttpRoute, LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MODEL, LABEL_PART_OF,
    MANAGED_BY_VALUE, Model, Subscription,
};
use maas_policy::{ContributingSubscription, build_rate_limit_policy_spec};
use maas_store::ObjectStore;

use crate::error::ControllerError;
use crate::policy_ops::{delete_emitted_for_model, upsert_emitted};

const ANNOTATION_SUBSCRIPTIONS: &str = maas_core::ANNOTATION_SUBSCRIPTIONS;

pub struct RateLimitAggregator {
    models: Arc<dyn ObjectStore<Model>>,
    subscriptions: Arc<dyn ObjectStore<Subscription>>,
    policies: Arc<dyn ObjectStore<EmittedPolicy>>,
    routes: Arc<dyn ObjectStore<HttpRoute>>,
}

impl RateLimitAggregator {
    #[must_use]
    pub fn new(
        models: Arc<dyn ObjectStore<Model>>,
        subscriptions: Arc<dyn ObjectStore<Subscription>>,
        policies: Arc<dyn ObjectStore<EmittedPolicy>>,
        routes: Arc<dyn ObjectStore<HttpRoute>>,
    ) -> Self {
        Self {
            models,
            subscriptions,
            policies,
            routes,
        }
    }

    async fn live_subscriptions_for(
        &self,
        model_name: &str,
    ) -> Result<Vec<Subscription>, ControllerError> {
        Ok(self
            .subscriptions
            .list(None)
            .await?
            .into_iter()
            .filter(|s| s.meta.deletion_timestamp.is_none())
            .filter(|s| s.model_ref(model_name).is_some())
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

    /// §4.5 algorithm, run for one Model name. Mirrors the auth
    /// aggregator's shape; the only reconciler-side difference is that
    /// RateLimitPolicy has no contributing-subscription status to project
    /// back (§4.5 carries no analogue to §4.4's status projection step).
    pub async fn reconcile_model(&self, model_name: &str) -> Result<(), ControllerError> {
        let live_subscriptions = self.live_subscriptions_for(model_name).await?;

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

        let contributing: Vec<ContributingSubscription> = live_subscriptions
            .iter()
            .map(|s| {
                let rates = s
                    .model_ref(model_name)
                    .map(|m| m.effective_rates())
                    .unwrap_or_default();
                ContributingSubscription {
                    name: s.meta.name.clone(),
                    groups: s.spec.owner.groups.clone(),
                    users: s.spec.owner.users.clone(),
                    priority: s.spec.priority,
                    rates,
                }
            })
            .collect();

        // Validation failures abort before any upsert (invariant 7).
        let built = build_rate_limit_policy_spec(&route, &contributing)?;

        let emitted_name = format!("{model_name}-rate-limit-policy");
        upsert_emitted(
            &*self.policies,
            &emitted_name,
            &model.meta.namespace,
            built.spec,
            vec![
                (LABEL_MODEL, model_name.to_owned()),
                (LABEL_MANAGED_BY, MANAGED_BY_VALUE.to_owned()),
                (LABEL_PART_OF, "rate-limit".to_owned()),
                (LABEL_COMPONENT, "token-rate-limit-policy".to_owned()),
            ],
            ANNOTATION_SUBSCRIPTIONS,
            &built.contributing_names,
        )
        .await?;

        Ok(())
    }
}
