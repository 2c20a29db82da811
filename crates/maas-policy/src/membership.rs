//! Membership-predicate construction shared by the auth and rate-limit
//! builders: "does this identity belong to one of these groups/users".

use crate::expr::Expr;

/// `groups.split(",").exists(g, g == "G1" || g == "G2" || …)`, or `None` if
/// `groups` is empty (the predicate would be vacuously false).
#[must_use]
pub fn groups_membership(groups: &[String]) -> Option<Expr> {
    if groups.is_empty() {
        return None;
    }
    let disjunction = Expr::Any(
        groups
            .iter()
            .map(|g| Expr::eq(Expr::ident("g"), Expr::string(g)))
            .collect(),
    );
    Some(
        Expr::ident("groups")
            .method_call("split", vec![Expr::string(",")])
            .method_call("exists", vec![Expr::Lambda("g".to_owned(), Box::new(disjunction))]),
    )
}

/// `username == "U1" || username == "U2" || …`, or `None` if `users` is
/// empty.
#[must_use]
pub fn users_membership(users: &[String]) -> Option<Expr> {
    if users.is_empty() {
        return None;
    }
    Some(Expr::Any(
        users
            .iter()
            .map(|u| Expr::eq(Expr::ident("username"), Expr::string(u)))
            .collect(),
    ))
}

/// The combined group-or-user membership predicate, or `None` if both
/// `groups` and `users` are empty — callers must skip the bucket entirely
/// in that case rather than emit an always-false rule (§4.5 step "Skip
/// this subscription entirely if no groups and no users were supplied").
#[must_use]
pub fn membership(groups: &[String], users: &[String]) -> Option<Expr> {
    match (groups_membership(groups), users_membership(users)) {
        (Some(g), Some(u)) => Some(Expr::or(g, u)),
        (Some(g), None) => Some(g),
        (None, Some(u)) => Some(u),
        (None, None) => None,
    }
}
