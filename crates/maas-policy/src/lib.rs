//! CEL-like predicate IR and the two policy-spec reducers (§4.4, §4.5).
//!
//! Each reducer is a pure function `(route, live intents) -> spec`: the
//! aggregators in `maas-controller` are the plumbing that keeps this
//! function's output materialized as an emitted policy object (§9,
//! "always rebuild the whole spec").

pub mod auth;
pub mod error;
pub mod expr;
pub mod membership;
pub mod rate_limit;

pub use auth::{AuthConfig, BuiltAuthPolicy, ContributingAuthIntent, build_auth_policy_spec};
pub use error::PolicyError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use rate_limit::{BuiltRateLimitPolicy, ContributingSubscription, build_rate_limit_policy_spec};
