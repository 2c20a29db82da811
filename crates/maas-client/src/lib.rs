//! Selector HTTP Client
//!
//! A native Rust client for `POST /v1/subscriptions/select` (§6).
//!
//! # Quick Start
//!
//! ```no_run
//! use maas_client::{SelectRequest, SelectorClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), maas_client::Error> {
//!     let client = SelectorClient::new("http://localhost:8080");
//!     let request = SelectRequest {
//!         username: Some("alice".into()),
//!         groups: vec!["basic-users".into()],
//!         requested_subscription: None,
//!     };
//!     let selected = client.select(&request).await?;
//!     println!("selected: {}", selected.name);
//!     Ok(())
//! }
//! ```

mod error;

pub use error::Error;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `POST /v1/subscriptions/select` request body (§6).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(rename = "requestedSubscription", skip_serializing_if = "Option::is_none")]
    pub requested_subscription: Option<String>,
}

/// Successful `{name, organizationId, costCenter, labels}` response (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct SelectedSubscription {
    pub name: String,
    #[serde(rename = "organizationId", default)]
    pub organization_id: Option<String>,
    #[serde(rename = "costCenter", default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub labels: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    name: Option<String>,
    #[serde(rename = "organizationId")]
    organization_id: Option<String>,
    #[serde(rename = "costCenter")]
    cost_center: Option<String>,
    #[serde(default)]
    labels: std::collections::BTreeMap<String, String>,
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for the Subscription Selector service.
#[derive(Debug, Clone)]
pub struct SelectorClient {
    client: Client,
    base_url: String,
}

/// Builder for configuring a [`SelectorClient`].
#[derive(Debug)]
pub struct SelectorClientBuilder {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl SelectorClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom reqwest Client (TLS config, proxies, etc.).
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<SelectorClient, Error> {
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };
        Ok(SelectorClient {
            client,
            base_url: self.base_url,
        })
    }
}

impl SelectorClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        SelectorClientBuilder::new(base_url)
            .build()
            .expect("default client configuration should not fail")
    }

    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> SelectorClientBuilder {
        SelectorClientBuilder::new(base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /v1/subscriptions/select`. The server always answers HTTP 200
    /// (§6) — a `bad_request`/`not_found`/`access_denied`/
    /// `multiple_subscriptions`/`internal_error` body field is surfaced as
    /// [`Error::Selector`], not as an HTTP status.
    pub async fn select(&self, request: &SelectRequest) -> Result<SelectedSubscription, Error> {
        let url = format!("{}/v1/subscriptions/select", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_owned());
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawResponse = response
            .json()
            .await
            .map_err(|e| Error::Deserialization(e.to_string()))?;

        if let Some(code) = raw.error {
            return Err(Error::Selector {
                code,
                message: raw.message.unwrap_or_default(),
            });
        }

        Ok(SelectedSubscription {
            name: raw.name.ok_or_else(|| {
                Error::Deserialization("success response missing \"name\"".to_owned())
            })?,
            organization_id: raw.organization_id,
            cost_center: raw.cost_center,
            labels: raw.labels,
        })
    }

    /// `GET /healthz` readiness probe.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/healthz", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
