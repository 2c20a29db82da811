pub mod auth_intent;
pub mod condition;
pub mod emitted;
pub mod error;
pub mod http_route;
pub mod meta;
pub mod model;
pub mod subscription;

pub use auth_intent::{AuthIntent, AuthIntentSpec, AuthIntentStatus, EmittedPolicyRef, Subjects};
pub use condition::{Condition, ConditionStatus};
pub use emitted::{EmittedPolicy, EmittedPolicyStatus};
pub use error::{ErrorKind, MaasError};
pub use http_route::{
    Gateway, GatewayListener, GatewayStatus, HttpRoute, HttpRouteRule, HttpRouteSpec,
    HttpRouteStatus,
};
pub use meta::{
    ANNOTATION_AUTH_POLICIES, ANNOTATION_MANAGED, ANNOTATION_SUBSCRIPTIONS, FINALIZER_AUTH_INTENT,
    FINALIZER_MODEL, FINALIZER_SUBSCRIPTION, LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MODEL,
    LABEL_PART_OF, MANAGED_BY_VALUE, ObjectMeta, ObjectRef,
};
pub use model::{BackendKind, BackendRef, Model, ModelPhase, ModelSpec, ModelStatus};
pub use subscription::{
    Owner, Subscription, SubscriptionModelRef, SubscriptionSpec, SubscriptionStatus,
    TokenMetadata, TokenRateLimit,
};

/// Anything that can be reconciled carries a metadata header and an
/// optional deletion timestamp (a tombstone).
///
/// Mirrors the `ObjectMeta` + `DeletionTimestamp` convention every
/// reconciler in this workspace is specified against.
pub trait Resource {
    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// `true` once the object carries a deletion timestamp (a tombstone).
    /// Reconcilers must treat a tombstoned object as "being deleted", never
    /// as simply absent.
    fn is_tombstoned(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }
}
