//! End-to-end coverage of both Policy Aggregators sharing one Model,
//! including the "always rebuild the whole spec" discipline (§9) and the
//! tombstone/cascade-delete interaction between reconciles.

use std::sync::Arc;

use maas_core::{
    AuthIntent, AuthIntentSpec, BackendKind, BackendRef, EmittedPolicy, HttpRoute, Model,
    ModelSpec, ObjectRef, Owner, Subjects, Subscription, SubscriptionModelRef, SubscriptionSpec,
    TokenRateLimit,
};
use maas_controller::{AuthAggregator, RateLimitAggregator};
use maas_policy::AuthConfig;
use maas_store::ObjectStore;
use maas_store_memory::MemoryStore;

fn model() -> Model {
    Model::new(
        "chat",
        "ns",
        ModelSpec {
            backend_kind: BackendKind::ExternalModel,
            backend_ref: BackendRef {
                name: "chat-backend".into(),
                namespace: None,
            },
        },
    )
}

struct Harness {
    auth: AuthAggregator,
    rate_limit: RateLimitAggregator,
    models: Arc<MemoryStore<Model>>,
    intents: Arc<MemoryStore<AuthIntent>>,
    subscriptions: Arc<MemoryStore<Subscription>>,
    policies: Arc<MemoryStore<EmittedPolicy>>,
}

fn harness() -> Harness {
    let models: Arc<MemoryStore<Model>> = Arc::new(MemoryStore::new());
    let intents: Arc<MemoryStore<AuthIntent>> = Arc::new(MemoryStore::new());
    let subscriptions: Arc<MemoryStore<Subscription>> = Arc::new(MemoryStore::new());
    let policies: Arc<MemoryStore<EmittedPolicy>> = Arc::new(MemoryStore::new());
    let routes: Arc<MemoryStore<HttpRoute>> = Arc::new(MemoryStore::new());

    let auth = AuthAggregator::new(
        models.clone(),
        intents.clone(),
        policies.clone(),
        routes.clone(),
        AuthConfig::default(),
    );
    let rate_limit =
        RateLimitAggregator::new(models.clone(), subscriptions.clone(), policies.clone(), routes);

    Harness {
        auth,
        rate_limit,
        models,
        intents,
        subscriptions,
        policies,
    }
}

#[tokio::test]
async fn both_aggregators_emit_independent_policies_for_one_model() {
    let h = harness();
    h.models.create(model()).await.unwrap();

    h.intents
        .create(AuthIntent::new(
            "chat-readers",
            "ns",
            AuthIntentSpec {
                model_refs: vec!["chat".into()],
                subjects: Subjects {
                    groups: vec!["readers".into()],
                    users: vec![],
                },
                metering_metadata: Default::default(),
            },
        ))
        .await
        .unwrap();

    h.subscriptions
        .create(Subscription::new(
            "free-tier",
            "ns",
            SubscriptionSpec {
                owner: Owner {
                    groups: vec!["readers".into()],
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: "chat".into(),
                    token_rate_limits: vec![TokenRateLimit {
                        limit: 1000,
                        window: "1m".into(),
                    }],
                }],
                priority: 5,
                token_metadata: None,
            },
        ))
        .await
        .unwrap();

    h.auth.reconcile_model("chat").await.unwrap();
    h.rate_limit.reconcile_model("chat").await.unwrap();

    let policies = h.policies.list(None).await.unwrap();
    assert_eq!(policies.len(), 2);

    let auth_policy = h
        .policies
        .get(&ObjectRef::new("chat-auth-policy", "ns"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        auth_policy.meta.annotations.get("maas.io/auth-policies").unwrap(),
        "chat-readers"
    );

    let rate_limit_policy = h
        .policies
        .get(&ObjectRef::new("chat-rate-limit-policy", "ns"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        rate_limit_policy
            .meta
            .annotations
            .get("maas.io/subscriptions")
            .unwrap(),
        "free-tier"
    );
}

#[tokio::test]
async fn rebuild_drops_a_retracted_intent_on_next_reconcile() {
    let h = harness();
    h.models.create(model()).await.unwrap();

    h.intents
        .create(AuthIntent::new(
            "chat-readers",
            "ns",
            AuthIntentSpec {
                model_refs: vec!["chat".into()],
                subjects: Subjects {
                    groups: vec!["readers".into()],
                    users: vec![],
                },
                metering_metadata: Default::default(),
            },
        ))
        .await
        .unwrap();
    h.auth.reconcile_model("chat").await.unwrap();

    let first = h
        .policies
        .get(&ObjectRef::new("chat-auth-policy", "ns"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.meta.annotations.get("maas.io/auth-policies").unwrap(), "chat-readers");

    // Retract the intent by tombstoning it (deletion_timestamp set, no
    // finalizer removal yet) — it must stop contributing on the next pass.
    let mut intent = h
        .intents
        .get(&ObjectRef::new("chat-readers", "ns"))
        .await
        .unwrap()
        .unwrap();
    intent.meta.deletion_timestamp = Some(chrono::Utc::now());
    h.intents.update(intent).await.unwrap();

    h.auth.reconcile_model("chat").await.unwrap();

    let rebuilt = h
        .policies
        .get(&ObjectRef::new("chat-auth-policy", "ns"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rebuilt.meta.annotations.get("maas.io/auth-policies").unwrap(), "");
}

#[tokio::test]
async fn deleting_the_model_cascades_both_emitted_policies() {
    let h = harness();
    h.models.create(model()).await.unwrap();
    h.intents
        .create(AuthIntent::new(
            "chat-readers",
            "ns",
            AuthIntentSpec {
                model_refs: vec!["chat".into()],
                subjects: Subjects {
                    groups: vec!["readers".into()],
                    users: vec![],
                },
                metering_metadata: Default::default(),
            },
        ))
        .await
        .unwrap();
    h.subscriptions
        .create(Subscription::new(
            "free-tier",
            "ns",
            SubscriptionSpec {
                owner: Owner {
                    groups: vec!["readers".into()],
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: "chat".into(),
                    token_rate_limits: vec![],
                }],
                priority: 0,
                token_metadata: None,
            },
        ))
        .await
        .unwrap();

    h.auth.reconcile_model("chat").await.unwrap();
    h.rate_limit.reconcile_model("chat").await.unwrap();
    assert_eq!(h.policies.list(None).await.unwrap().len(), 2);

    h.models
        .delete(&ObjectRef::new("chat", "ns"))
        .await
        .unwrap();

    h.auth.reconcile_model("chat").await.unwrap();
    h.rate_limit.reconcile_model("chat").await.unwrap();

    assert!(h.policies.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn rate_limit_tiers_are_ordered_by_priority_then_max_limit() {
    let h = harness();
    h.models.create(model()).await.unwrap();

    h.subscriptions
        .create(Subscription::new(
            "low",
            "ns",
            SubscriptionSpec {
                owner: Owner {
                    groups: vec!["low-team".into()],
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: "chat".into(),
                    token_rate_limits: vec![TokenRateLimit {
                        limit: 100,
                        window: "1m".into(),
                    }],
                }],
                priority: 1,
                token_metadata: None,
            },
        ))
        .await
        .unwrap();
    h.subscriptions
        .create(Subscription::new(
            "high",
            "ns",
            SubscriptionSpec {
                owner: Owner {
                    groups: vec!["high-team".into()],
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: "chat".into(),
                    token_rate_limits: vec![TokenRateLimit {
                        limit: 10_000,
                        window: "1m".into(),
                    }],
                }],
                priority: 10,
                token_metadata: None,
            },
        ))
        .await
        .unwrap();

    h.rate_limit.reconcile_model("chat").await.unwrap();

    let emitted = h
        .policies
        .get(&ObjectRef::new("chat-rate-limit-policy", "ns"))
        .await
        .unwrap()
        .unwrap();
    let annotation = emitted.meta.annotations.get("maas.io/subscriptions").unwrap();
    // Both contributed, named in `build_rate_limit_policy_spec`'s own
    // stable-sort order (priority DESC, then maxLimit DESC).
    assert_eq!(annotation, "high,low");
}
