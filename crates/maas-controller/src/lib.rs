//! Model Controller (C3, §4.3) and the Auth/RateLimit Policy Aggregators
//! (C4, §4.4/§4.5): the reconcile loops that turn Model/AuthIntent/
//! Subscription state into Model status and emitted policies.

pub mod auth_aggregator;
pub mod error;
pub mod index;
pub mod model_controller;
pub mod policy_ops;
pub mod queue;
pub mod rate_limit_aggregator;
pub mod runner;

pub use auth_aggregator::AuthAggregator;
pub use error::ControllerError;
pub use model_controller::{BackendRegistry, ModelController};
pub use queue::WorkQueue;
pub use rate_limit_aggregator::RateLimitAggregator;
pub use runner::{feed_watch, run_loop, Retryable};
