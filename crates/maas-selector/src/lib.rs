//! Subscription Selector (C5, §4.6): a pure, stateless function from a
//! snapshot of Subscriptions plus one caller's identity to the single
//! Subscription that identity should be billed/rate-limited against.
//!
//! This crate owns no state and performs no I/O — the snapshot is handed
//! in by the caller (an informer cache in `maas-server`), which keeps the
//! algorithm itself trivially property-testable (§8 invariant 6: "same
//! input + same snapshot ⇒ same output").

pub mod error;

pub use error::SelectorError;

use std::collections::BTreeMap;

use maas_core::Subscription;

/// `POST /v1/subscriptions/select` request body (§6).
#[derive(Debug, Clone, Default)]
pub struct SelectRequest {
    pub username: Option<String>,
    pub groups: Vec<String>,
    pub requested_subscription: Option<String>,
}

/// The metering triple plus the winning Subscription's name, returned on
/// success (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSubscription {
    pub name: String,
    pub organization_id: Option<String>,
    pub cost_center: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl SelectedSubscription {
    fn from_subscription(sub: &Subscription) -> Self {
        let metadata = sub.spec.token_metadata.clone().unwrap_or_default();
        Self {
            name: sub.meta.name.clone(),
            organization_id: metadata.organization_id,
            cost_center: metadata.cost_center,
            labels: metadata.labels,
        }
    }
}

fn max_limit_overall(sub: &Subscription) -> i64 {
    sub.spec
        .model_refs
        .iter()
        .map(maas_core::SubscriptionModelRef::max_limit)
        .max()
        .unwrap_or_default()
}

/// Group comparison trims surrounding whitespace on both sides (§8
/// boundary behaviour, "Group name containing a whitespace-padded
/// variant").
fn owns(sub: &Subscription, username: Option<&str>, groups: &[String]) -> bool {
    if let Some(username) = username {
        if sub.spec.owner.users.iter().any(|u| u == username) {
            return true;
        }
    }
    sub.spec.owner.groups.iter().any(|owned| {
        groups
            .iter()
            .any(|requested| owned.trim() == requested.trim())
    })
}

/// Stable sort by `(priority DESC, maxLimit DESC)` (§4.6 step 3).
fn sorted_by_priority(subscriptions: &[Subscription]) -> Vec<&Subscription> {
    let mut sorted: Vec<&Subscription> = subscriptions.iter().collect();
    sorted.sort_by(|a, b| {
        b.spec
            .priority
            .cmp(&a.spec.priority)
            .then_with(|| max_limit_overall(b).cmp(&max_limit_overall(a)))
    });
    sorted
}

/// §4.6's full algorithm.
pub fn select(
    subscriptions: &[Subscription],
    request: &SelectRequest,
) -> Result<SelectedSubscription, SelectorError> {
    let username = request
        .username
        .as_deref()
        .filter(|u| !u.is_empty());
    if username.is_none() && request.groups.is_empty() {
        return Err(SelectorError::BadRequest(
            "at least one of username or groups must be present".to_owned(),
        ));
    }

    let sorted = sorted_by_priority(subscriptions);

    if let Some(requested_name) = &request.requested_subscription {
        let found = sorted.iter().find(|s| &s.meta.name == requested_name);
        return match found {
            None => Err(SelectorError::SubscriptionNotFound(requested_name.clone())),
            Some(sub) if !owns(sub, username, &request.groups) => {
                Err(SelectorError::AccessDenied(requested_name.clone()))
            }
            Some(sub) => Ok(SelectedSubscription::from_subscription(sub)),
        };
    }

    let owned: Vec<&Subscription> = sorted
        .into_iter()
        .filter(|s| owns(s, username, &request.groups))
        .collect();

    match owned.len() {
        0 => Err(SelectorError::NoSubscription),
        1 => Ok(SelectedSubscription::from_subscription(owned[0])),
        _ => Err(SelectorError::MultipleSubscriptions(
            owned.iter().map(|s| s.meta.name.clone()).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::{Owner, SubscriptionModelRef, SubscriptionSpec, TokenRateLimit};

    fn subscription(name: &str, groups: &[&str], priority: i32, max_limit: i64) -> Subscription {
        Subscription::new(
            name,
            "ns",
            SubscriptionSpec {
                owner: Owner {
                    groups: groups.iter().map(|s| s.to_string()).collect(),
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: "m1".into(),
                    token_rate_limits: vec![TokenRateLimit {
                        limit: max_limit,
                        window: "1m".into(),
                    }],
                }],
                priority,
                token_metadata: None,
            },
        )
    }

    fn tiers() -> Vec<Subscription> {
        vec![
            subscription("basic", &["basic-users"], 10, 100),
            subscription("premium", &["premium-users"], 20, 1000),
        ]
    }

    #[test]
    fn scenario_1_auto_select_single_subscription() {
        let request = SelectRequest {
            username: Some("alice".into()),
            groups: vec!["basic-users".into()],
            requested_subscription: None,
        };
        let selected = select(&tiers(), &request).unwrap();
        assert_eq!(selected.name, "basic");
    }

    #[test]
    fn scenario_2_multi_match_requires_explicit() {
        let request = SelectRequest {
            username: Some("alice".into()),
            groups: vec!["basic-users".into(), "premium-users".into()],
            requested_subscription: None,
        };
        let err = select(&tiers(), &request).unwrap_err();
        assert_eq!(err.code(), "multiple_subscriptions");
        match err {
            SelectorError::MultipleSubscriptions(names) => {
                assert_eq!(names, vec!["premium".to_owned(), "basic".to_owned()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scenario_3_explicit_deny() {
        let request = SelectRequest {
            username: Some("alice".into()),
            groups: vec!["basic-users".into()],
            requested_subscription: Some("premium".into()),
        };
        let err = select(&tiers(), &request).unwrap_err();
        assert_eq!(err.code(), "access_denied");
    }

    #[test]
    fn requested_subscription_not_found() {
        let request = SelectRequest {
            username: Some("alice".into()),
            groups: vec![],
            requested_subscription: Some("ghost".into()),
        };
        let err = select(&tiers(), &request).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn no_owned_subscription_is_not_found() {
        let request = SelectRequest {
            username: Some("bob".into()),
            groups: vec!["nobody".into()],
            requested_subscription: None,
        };
        let err = select(&tiers(), &request).unwrap_err();
        assert!(matches!(err, SelectorError::NoSubscription));
    }

    #[test]
    fn bad_request_when_both_username_and_groups_empty() {
        let request = SelectRequest::default();
        let err = select(&tiers(), &request).unwrap_err();
        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn group_comparison_trims_whitespace() {
        let request = SelectRequest {
            username: None,
            groups: vec!["  basic-users  ".into()],
            requested_subscription: None,
        };
        let selected = select(&tiers(), &request).unwrap();
        assert_eq!(selected.name, "basic");
    }

    #[test]
    fn metering_triple_is_carried_through() {
        let mut sub = subscription("basic", &["basic-users"], 10, 100);
        sub.spec.token_metadata = Some(maas_core::TokenMetadata {
            organization_id: Some("org-1".into()),
            cost_center: Some("cc-1".into()),
            labels: BTreeMap::from([("team".to_owned(), "infra".to_owned())]),
        });
        let request = SelectRequest {
            username: None,
            groups: vec!["basic-users".into()],
            requested_subscription: None,
        };
        let selected = select(&[sub], &request).unwrap();
        assert_eq!(selected.organization_id.as_deref(), Some("org-1"));
        assert_eq!(selected.cost_center.as_deref(), Some("cc-1"));
        assert_eq!(selected.labels.get("team").unwrap(), "infra");
    }
}
