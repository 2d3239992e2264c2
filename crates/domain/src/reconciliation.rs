//! Outcome of applying desired principals to a cluster.

use std::collections::BTreeSet;

use serde::Serialize;

/// How a desired principal was applied to the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalChange {
    /// The principal did not exist before this run.
    Created,
    /// The principal existed and was rewritten with the desired state.
    Updated,
}

impl PrincipalChange {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Usernames touched by one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// Principals that did not exist before the run.
    pub created: BTreeSet<String>,
    /// Principals that existed and were rewritten.
    pub updated: BTreeSet<String>,
    /// Principals removed because no desired record names them.
    pub deleted: BTreeSet<String>,
}

impl ReconciliationResult {
    /// Records an applied desired principal.
    pub fn record_change(&mut self, username: &str, change: PrincipalChange) {
        match change {
            PrincipalChange::Created => self.created.insert(username.to_owned()),
            PrincipalChange::Updated => self.updated.insert(username.to_owned()),
        };
    }

    /// Records a removed principal.
    pub fn record_deletion(&mut self, username: &str) {
        self.deleted.insert(username.to_owned());
    }

    /// Returns whether the run touched no principal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PrincipalChange, ReconciliationResult};

    #[test]
    fn serializes_as_sorted_username_lists() {
        let mut result = ReconciliationResult::default();
        result.record_change("carol", PrincipalChange::Created);
        result.record_change("bob", PrincipalChange::Updated);
        result.record_change("amy", PrincipalChange::Updated);
        result.record_deletion("alice");

        let value = serde_json::to_value(&result);
        assert!(value.is_ok());
        assert_eq!(
            value.unwrap_or_default(),
            json!({
                "created": ["carol"],
                "updated": ["amy", "bob"],
                "deleted": ["alice"],
            })
        );
    }

    #[test]
    fn default_result_is_empty() {
        assert!(ReconciliationResult::default().is_empty());
    }
}
