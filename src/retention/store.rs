//! Record Store Boundary
//!
//! The archiver never owns persistence. It drives lifecycle transitions
//! through this trait, implemented by the platform's data layer (and by
//! the in-memory adapter used by the binary and the tests).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::EngineError;
use crate::retention::RecordMeta;

// == Store Error ==
/// Failure surfaced by a record-store call.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The call exceeded the implementation's deadline
    #[error("store call timed out")]
    Timeout,

    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The record no longer exists
    #[error("record not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout | StoreError::Unavailable(_) => {
                EngineError::StoreUnavailable(err.to_string())
            }
            StoreError::NotFound(id) => {
                EngineError::Internal(format!("record '{}' vanished mid-transition", id))
            }
        }
    }
}

// == Archive Kind ==
/// Destination archive for an Active-record transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Standard archive store
    Standard,
    /// Consent-gated protected archive store
    Protected,
}

// == Record Store ==
/// Boundary to the platform's record storage.
///
/// Every method is expected to enforce its own call deadline and surface
/// [`StoreError::Timeout`] rather than block indefinitely; the archiver
/// treats any error as an isolated per-record failure (or, for the
/// metadata scan, retries with backoff before giving up on the cycle).
pub trait RecordStore: Send + Sync {
    /// Returns metadata for every record that has not been purged.
    fn scan_metadata(&self) -> Result<Vec<RecordMeta>, StoreError>;

    /// Copies the record into the given archive store and marks its state
    /// accordingly, stamping `archived_at`.
    fn archive(
        &self,
        id: &str,
        kind: ArchiveKind,
        archived_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Permanently deletes the record.
    fn purge(&self, id: &str) -> Result<(), StoreError>;
}
