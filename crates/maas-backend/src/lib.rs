//! Route Resolver (C1) and Backend Handler (C2): the two pluggable,
//! per-backend-kind contracts the Model Controller (`maas-controller`)
//! dispatches to (§4.1, §4.2).

pub mod config;
pub mod error;
pub mod handler;
pub mod resolver;

pub use config::BackendConfig;
pub use error::BackendError;
pub use handler::{BackendHandler, ExternalModelHandler, InternalInferenceHandler, handler_for};
pub use resolver::{
    ExternalModelResolver, InternalInferenceResolver, RouteResolver, external_route_name,
    resolver_for,
};
