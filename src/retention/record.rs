//! Record Lifecycle Types
//!
//! The metadata slice of an external record the archiver scans, and the
//! one-directional lifecycle it advances records through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Record Lifecycle State ==
/// Lifecycle stage of an external record.
///
/// Transitions only move forward: Active → ProtectedArchive (consent
/// gated) or Active → Archived → Purged. A record never moves backward,
/// and the two archive variants never convert into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLifecycleState {
    Active,
    ProtectedArchive,
    Archived,
    Purged,
}

impl RecordLifecycleState {
    /// Position of the state along the lifecycle. Both archive variants
    /// share a stage; they differ in destination, not in progress.
    fn stage(self) -> u8 {
        match self {
            RecordLifecycleState::Active => 0,
            RecordLifecycleState::ProtectedArchive => 1,
            RecordLifecycleState::Archived => 1,
            RecordLifecycleState::Purged => 2,
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: RecordLifecycleState) -> bool {
        next.stage() > self.stage()
    }
}

// == Record Meta ==
/// Metadata of one external record, as surfaced by the record store.
///
/// The payload itself stays in the platform's storage; the archiver only
/// needs category, timestamps, consent, and current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Record identifier, also its cache key in the category's namespace
    pub id: String,
    /// Record category, matched against the retention policies
    pub category: String,
    /// Last modification time, drives the active-window boundary
    pub last_updated: DateTime<Utc>,
    /// Affirmative consent for the protected archive
    pub consent_protected: bool,
    /// Current lifecycle state
    pub state: RecordLifecycleState,
    /// When the record entered an archive state, if it has
    pub archived_at: Option<DateTime<Utc>>,
    /// Session start for anonymized analytics records
    pub session_start: Option<DateTime<Utc>>,
}

impl RecordMeta {
    /// Creates an active record with no archive or session timestamps.
    pub fn active(id: impl Into<String>, category: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            last_updated,
            consent_protected: false,
            state: RecordLifecycleState::Active,
            archived_at: None,
            session_start: None,
        }
    }
}
