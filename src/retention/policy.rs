//! Retention Policy Types
//!
//! Per-category lifecycle configuration, loaded once at startup and
//! treated as immutable for the process lifetime.

use chrono::Duration;

// == Final Action ==
/// What happens to a record once its archive window elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalAction {
    /// The record stays in the archive indefinitely
    Archive,
    /// The record is permanently deleted
    Purge,
}

// == Retention Policy ==
/// Lifecycle policy for one record category.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Record category this policy governs
    pub category: String,
    /// How long after its last update a record stays active
    pub active_window: Duration,
    /// How long an archived record is kept before the final action applies
    pub archive_window: Duration,
    /// Disposition once the archive window elapses
    pub final_action: FinalAction,
    /// Whether records of this category are eligible for the
    /// consent-gated protected archive
    pub protected: bool,
    /// Cache namespace whose entry for a record must be invalidated when
    /// the record changes lifecycle state
    pub cache_namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_construction() {
        let policy = RetentionPolicy {
            category: "progress".to_string(),
            active_window: Duration::days(180),
            archive_window: Duration::days(365),
            final_action: FinalAction::Purge,
            protected: true,
            cache_namespace: "progress".to_string(),
        };

        assert_eq!(policy.final_action, FinalAction::Purge);
        assert!(policy.active_window < policy.archive_window);
    }
}
