//! Auth Aggregator policy-spec construction (§4.4).

use serde_json::{Value, json};

use maas_core::ObjectRef;

use crate::error::{PolicyError, check_cel_safe};
use crate::expr::Expr;

/// One AuthIntent contributing to a Model's emitted policy.
#[derive(Debug, Clone)]
pub struct ContributingAuthIntent {
    pub name: String,
    pub groups: Vec<String>,
    pub users: Vec<String>,
}

/// Gateway/cluster audience config the authentication block embeds
/// (§6, "Gateway & identity wiring").
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub gateway_audience: String,
    pub cluster_audience: String,
    pub cache_ttl_seconds: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            gateway_audience: "maas-gateway".to_owned(),
            cluster_audience: "https://kubernetes.default.svc".to_owned(),
            cache_ttl_seconds: 600,
        }
    }
}

/// Result of building an AuthPolicy spec: the spec tree plus the sorted
/// contributing-intent names the caller stamps into the `auth-policies`
/// annotation (§4.4 step 5).
#[derive(Debug, Clone)]
pub struct BuiltAuthPolicy {
    pub spec: Value,
    pub contributing_names: Vec<String>,
}

/// §4.4 steps 2-4: validate CEL-safety, build the union predicate, and
/// assemble the deterministic policy spec. Returns
/// [`PolicyError::UnsafeSubject`] on the first unsafe value found — the
/// caller must not perform any upsert in that case (invariant 7).
pub fn build_auth_policy_spec(
    route: &ObjectRef,
    intents: &[ContributingAuthIntent],
    config: &AuthConfig,
) -> Result<BuiltAuthPolicy, PolicyError> {
    for intent in intents {
        for group in &intent.groups {
            check_cel_safe(group)?;
        }
        for user in &intent.users {
            check_cel_safe(user)?;
        }
    }

    let group_predicates: Vec<Expr> = intents
        .iter()
        .flat_map(|i| i.groups.iter())
        .map(|g| Expr::Call(
            "incl".to_owned(),
            vec![Expr::string("identity.user.groups"), Expr::string(g)],
        ))
        .collect();
    let user_predicates: Vec<Expr> = intents
        .iter()
        .flat_map(|i| i.users.iter())
        .map(|u| Expr::eq(Expr::ident("identity.user.username"), Expr::string(u)))
        .collect();

    let mut all_predicates = group_predicates;
    all_predicates.extend(user_predicates);

    let authorization = if all_predicates.is_empty() {
        Value::Null
    } else {
        json!({ "when": Expr::Any(all_predicates).to_source() })
    };

    let spec = json!({
        "targetRef": {
            "group": "gateway.networking.k8s.io",
            "kind": "HTTPRoute",
            "name": route.name,
            "namespace": route.namespace,
        },
        "authentication": {
            "service-account-token-review": {
                "credentials": { "authorizationHeader": { "prefix": "Bearer" } },
                "audiences": [config.gateway_audience, config.cluster_audience],
                "cache": {
                    "key": "lower(request.headers[\"authorization\"])",
                    "ttl": config.cache_ttl_seconds,
                },
            },
        },
        "authorization": authorization,
        "response": {
            "groups": "identity.user.groups",
            "groups_str": "identity.user.groups.join(\",\")",
            "userid": "identity.user.username",
        },
    });

    let mut contributing_names: Vec<String> = intents.iter().map(|i| i.name.clone()).collect();
    contributing_names.sort();

    Ok(BuiltAuthPolicy {
        spec,
        contributing_names,
    })
}
