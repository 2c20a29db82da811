//! `POST /v1/subscriptions/select` (§6): the only write-free surface onto
//! the Subscription Selector's pure algorithm.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use maas_selector::{select, SelectRequest, SelectorError};
use maas_store::ObjectStore;

use crate::AppState;

const HEADER_SUBSCRIPTION: &str = "x-maas-subscription";

#[derive(Debug, Deserialize)]
pub struct SelectRequestBody {
    pub username: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(rename = "requestedSubscription", default)]
    pub requested_subscription: Option<String>,
}

/// The selector's own error taxonomy is carried inside a 200 body (§7,
/// "because the gateway's authorization engine is configured to call this
/// endpoint only for metadata extraction") — this handler never returns a
/// non-200 status for a selector-domain failure, only for malformed JSON
/// or a broken snapshot read.
pub async fn select_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SelectRequestBody>,
) -> impl IntoResponse {
    let requested_subscription = body.requested_subscription.or_else(|| {
        headers
            .get(HEADER_SUBSCRIPTION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    });

    let subscriptions = match state.subscriptions.list(None).await {
        Ok(subs) => subs,
        Err(err) => {
            tracing::error!(error = %err, "failed to snapshot subscriptions");
            return (StatusCode::OK, Json(error_body(&SelectorError::Internal(err.to_string()))));
        }
    };

    let request = SelectRequest {
        username: body.username,
        groups: body.groups,
        requested_subscription,
    };

    match select(&subscriptions, &request) {
        Ok(selected) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "name": selected.name,
                "organizationId": selected.organization_id,
                "costCenter": selected.cost_center,
                "labels": selected.labels,
            })),
        ),
        Err(err) => (StatusCode::OK, Json(error_body(&err))),
    }
}

fn error_body(err: &SelectorError) -> serde_json::Value {
    serde_json::json!({ "error": err.code(), "message": err.to_string() })
}
