//! Status condition log, the convention every object's `.status.conditions`
//! (and the emitted policies' `Accepted`/`Enforced` conditions read back by
//! the aggregators, §4.4) is expressed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Default for ConditionStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// A single status condition: `type`, `status`, `reason`, `message`, and
/// the time it last changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    #[must_use]
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Upsert this condition into a list, replacing any existing entry of
    /// the same `type`. Only bumps `last_transition_time` when the status
    /// actually changes, matching the usual Kubernetes condition-set
    /// convention.
    pub fn upsert(list: &mut Vec<Condition>, mut new: Condition) {
        if let Some(existing) = list.iter_mut().find(|c| c.type_ == new.type_) {
            if existing.status == new.status {
                new.last_transition_time = existing.last_transition_time;
            }
            *existing = new;
        } else {
            list.push(new);
        }
    }

    #[must_use]
    pub fn find<'a>(list: &'a [Condition], type_: &str) -> Option<&'a Condition> {
        list.iter().find(|c| c.type_ == type_)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_same_type() {
        let mut conditions = Vec::new();
        Condition::upsert(
            &mut conditions,
            Condition::new("Ready", ConditionStatus::False, "Pending", "not ready"),
        );
        Condition::upsert(
            &mut conditions,
            Condition::new("Ready", ConditionStatus::True, "Ready", "ready"),
        );
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, ConditionStatus::True);
    }
}
