//! Rate-Limit Aggregator policy-spec construction (§4.5).

use serde_json::{Value, json};

use maas_core::{ObjectRef, TokenRateLimit};

use crate::error::{PolicyError, check_cel_safe};
use crate::expr::Expr;
use crate::membership::membership;

/// One Subscription referencing the Model being reconciled.
#[derive(Debug, Clone)]
pub struct ContributingSubscription {
    pub name: String,
    pub groups: Vec<String>,
    pub users: Vec<String>,
    pub priority: i32,
    pub rates: Vec<TokenRateLimit>,
}

impl ContributingSubscription {
    fn max_limit(&self) -> i64 {
        self.rates.iter().map(|r| r.limit).max().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct BuiltRateLimitPolicy {
    pub spec: Value,
    pub contributing_names: Vec<String>,
}

const HEADER_SUBSCRIPTION: &str = "x-maas-subscription";

fn rates_json(rates: &[TokenRateLimit]) -> Value {
    let effective = if rates.is_empty() {
        vec![TokenRateLimit::default()]
    } else {
        rates.to_vec()
    };
    json!(
        effective
            .iter()
            .map(|r| json!({ "limit": r.limit, "window": r.window }))
            .collect::<Vec<_>>()
    )
}

fn header_value() -> Expr {
    Expr::Index(
        Box::new(Expr::ident("headers")),
        Box::new(Expr::string(HEADER_SUBSCRIPTION)),
    )
}

fn header_eq(name: &str) -> Expr {
    Expr::eq(header_value(), Expr::string(name))
}

fn header_ne(name: &str) -> Expr {
    Expr::ne(header_value(), Expr::string(name))
}

fn header_present() -> Expr {
    Expr::ident("headers").method_call(
        "exists",
        vec![Expr::Lambda(
            "h".to_owned(),
            Box::new(Expr::eq(Expr::ident("h"), Expr::string(HEADER_SUBSCRIPTION))),
        )],
    )
}

/// §4.5: sort live Subscriptions for a Model, validate CEL-safety of every
/// owner value, and build the `limits` map plus the two deny buckets.
/// Subscriptions with no groups and no users are skipped (logged by the
/// caller) rather than emitted as an unreachable rule.
pub fn build_rate_limit_policy_spec(
    route: &ObjectRef,
    subscriptions: &[ContributingSubscription],
) -> Result<BuiltRateLimitPolicy, PolicyError> {
    for sub in subscriptions {
        for group in &sub.groups {
            check_cel_safe(group)?;
        }
        for user in &sub.users {
            check_cel_safe(user)?;
        }
    }

    let mut sorted: Vec<&ContributingSubscription> = subscriptions.iter().collect();
    sorted.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.max_limit().cmp(&a.max_limit()))
    });

    let reachable: Vec<&ContributingSubscription> = sorted
        .into_iter()
        .filter(|s| !(s.groups.is_empty() && s.users.is_empty()))
        .collect();

    let mut limits = serde_json::Map::new();
    let mut higher_tier_memberships: Vec<Expr> = Vec::new();

    for sub in &reachable {
        let Some(own_membership) = membership(&sub.groups, &sub.users) else {
            continue;
        };

        let explicit_named = header_eq(&sub.name);
        let no_explicit_header_and_not_higher_tier = Expr::and(
            header_present().not(),
            Expr::Any(higher_tier_memberships.clone()).not(),
        );
        let branch = Expr::or(explicit_named, no_explicit_header_and_not_higher_tier);

        let key = format!("{}-{}-tokens", sub.name, route.name);
        limits.insert(
            key,
            json!({
                "rates": rates_json(&sub.rates),
                "when": Expr::and(own_membership.clone(), branch).to_source(),
                "counters": ["userid"],
            }),
        );

        higher_tier_memberships.push(own_membership);
    }

    let any_membership = Expr::Any(
        reachable
            .iter()
            .filter_map(|s| membership(&s.groups, &s.users))
            .collect(),
    );
    limits.insert(
        format!("deny-unsubscribed-{}", route.name),
        json!({
            "rates": [{ "limit": 0, "window": "1m" }],
            "when": any_membership.not().to_source(),
            "counters": ["userid"],
        }),
    );

    let known_names_exclusion = Expr::All(reachable.iter().map(|s| header_ne(&s.name)).collect());
    limits.insert(
        format!("deny-invalid-header-{}", route.name),
        json!({
            "rates": [{ "limit": 0, "window": "1m" }],
            "when": Expr::and(header_present(), known_names_exclusion).to_source(),
            "counters": ["userid"],
        }),
    );

    let spec = json!({
        "targetRef": {
            "group": "gateway.networking.k8s.io",
            "kind": "HTTPRoute",
            "name": route.name,
            "namespace": route.namespace,
        },
        "limits": Value::Object(limits),
    });

    let mut contributing_names: Vec<String> = subscriptions.iter().map(|s| s.name.clone()).collect();
    contributing_names.sort();

    Ok(BuiltRateLimitPolicy {
        spec,
        contributing_names,
    })
}
