//! Standalone HTTP server hosting the Subscription Selector (C5, §4.6)
//! over its one write-free surface, `POST /v1/subscriptions/select`
//! (§6). The cluster API itself is out of scope (§1); this binary backs
//! the selector's snapshot with whatever [`maas_store::ObjectStore`]
//! implementation is wired in — the in-memory store for this standalone
//! build, a real cluster-API-backed one in a full deployment.

pub mod api;
pub mod config;

use std::sync::Arc;

use maas_core::Subscription;
use maas_store::ObjectStore;

pub use config::MaasServerConfig;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Arc<dyn ObjectStore<Subscription>>,
}
