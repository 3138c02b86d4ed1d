//! Action journal entries.
//!
//! Every state-changing interaction is recorded as an [`ActionEntry`]. The
//! journal is append-only: entries are never mutated or deleted, and a full
//! roster reset does not touch it.

use serde::{Deserialize, Serialize};

/// Timestamp layout used in persisted journal entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded action: who did what, when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// Local wall-clock time, formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,

    /// Acting user's id.
    pub user_id: i64,

    /// Acting user's display name at the time of the action.
    pub user_name: String,

    /// Human-readable description of what happened.
    pub action: String,
}

impl ActionEntry {
    /// Create an entry with an already-formatted timestamp.
    pub fn new(
        timestamp: impl Into<String>,
        user_id: i64,
        user_name: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            user_id,
            user_name: user_name.into(),
            action: action.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fields() {
        let entry = ActionEntry::new("2025-06-01 18:30:00", 7, "Alice", "Signed up");
        assert_eq!(entry.user_id, 7);
        assert_eq!(entry.action, "Signed up");
    }
}
