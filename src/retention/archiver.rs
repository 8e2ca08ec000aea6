//! Retention Archiver
//!
//! Scheduled job that advances records through their lifecycle: Active →
//! ProtectedArchive (consent gated) or Active → Archived → Purged, with a
//! direct purge for anonymized analytics sessions.
//!
//! Transitions are derived strictly from a record's current state and its
//! boundary timestamps, never from what a previous cycle touched, so
//! re-running a cycle for the same or an earlier instant is a no-op even
//! after a crash and restart. One record's failure never aborts the batch:
//! the id is reported for retry on the next cycle and the scan continues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::ANALYTICS_NAMESPACE;
use crate::cache::TieredCache;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::retention::{
    ArchiveKind, FinalAction, RecordLifecycleState, RecordMeta, RecordStore, RetentionPolicy,
};

/// Attempts for the initial metadata scan before the cycle gives up.
const SCAN_ATTEMPTS: u32 = 3;

/// Backoff before the first scan retry; doubles per attempt.
const SCAN_BACKOFF: StdDuration = StdDuration::from_millis(50);

// == Cycle Summary ==
/// Structured result of one retention cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    /// Records moved into an archive (standard or protected)
    pub archived_count: usize,
    /// Records permanently deleted
    pub purged_count: usize,
    /// Records whose transition failed; retried on the next cycle
    pub failed_ids: Vec<String>,
    /// Records examined by this cycle
    pub scanned: usize,
    /// True when the cycle was cancelled between records
    pub cancelled: bool,
}

// == Cancel Handle ==
/// Requests cooperative cancellation of the in-flight cycle.
///
/// The archiver checks the flag between records: the current record's
/// transition completes atomically, then the cycle stops, leaving a valid
/// partially-progressed state.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Outcome of examining one record.
enum Transition {
    None,
    Archived,
    Purged,
}

// == Retention Archiver ==
pub struct RetentionArchiver {
    store: Arc<dyn RecordStore>,
    cache: Arc<TieredCache>,
    policies: Vec<RetentionPolicy>,
    analytics_category: String,
    analytics_retention: chrono::Duration,
    /// At most one cycle runs process-wide
    running: AtomicBool,
    /// Cooperative cancellation flag for the in-flight cycle
    cancel: Arc<AtomicBool>,
}

impl RetentionArchiver {
    // == Constructor ==
    /// Creates an archiver over a record store and the cache whose entries
    /// it invalidates on lifecycle transitions.
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<TieredCache>, config: &Config) -> Self {
        Self {
            store,
            cache,
            policies: config.retention_policies.clone(),
            analytics_category: config.analytics_category.clone(),
            analytics_retention: config.analytics_retention,
            running: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for cancelling an in-flight cycle from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    // == Run Cycle ==
    /// Runs one retention cycle against the clock reading `now`.
    ///
    /// Returns `CycleInProgress` without touching anything if another
    /// cycle is still running; triggers racing the running cycle are
    /// skipped, never queued. Blocking (store calls, retry backoff):
    /// drive it through `spawn_blocking` from async contexts.
    pub fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(EngineError::CycleInProgress);
        }
        self.cancel.store(false, Ordering::Relaxed);

        let result = self.cycle_inner(now);
        self.running.store(false, Ordering::Release);
        result
    }

    fn cycle_inner(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        let records = self.scan_with_retry()?;

        let mut summary = CycleSummary {
            scanned: records.len(),
            ..CycleSummary::default()
        };

        for record in records {
            if self.cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                warn!(
                    archived = summary.archived_count,
                    purged = summary.purged_count,
                    "Retention cycle cancelled between records"
                );
                break;
            }

            match self.advance_record(&record, now) {
                Ok(Transition::None) => {}
                Ok(Transition::Archived) => {
                    summary.archived_count += 1;
                    self.invalidate_for(&record);
                }
                Ok(Transition::Purged) => {
                    summary.purged_count += 1;
                    self.invalidate_for(&record);
                }
                Err(err) => {
                    warn!(
                        record_id = %record.id,
                        category = %record.category,
                        error = %err,
                        "Record transition failed, will retry next cycle"
                    );
                    summary.failed_ids.push(record.id);
                }
            }
        }

        info!(
            scanned = summary.scanned,
            archived = summary.archived_count,
            purged = summary.purged_count,
            failed = summary.failed_ids.len(),
            "Retention cycle complete"
        );
        Ok(summary)
    }

    // == Per-Record Transition ==
    fn advance_record(&self, record: &RecordMeta, now: DateTime<Utc>) -> Result<Transition> {
        // Anonymized analytics sessions skip the archive stage: identity
        // is already unrecoverable, so the record is deleted outright once
        // its retention window elapses.
        if record.category == self.analytics_category {
            if let Some(session_start) = record.session_start {
                if record.state != RecordLifecycleState::Purged
                    && now - session_start >= self.analytics_retention
                {
                    self.store.purge(&record.id)?;
                    return Ok(Transition::Purged);
                }
            } else {
                debug!(record_id = %record.id, "Analytics record without session start, skipped");
            }
            return Ok(Transition::None);
        }

        let policy = self
            .policies
            .iter()
            .find(|p| p.category == record.category)
            .ok_or_else(|| EngineError::UnknownCategory(record.category.clone()))?;

        match record.state {
            RecordLifecycleState::Active => {
                if now - record.last_updated < policy.active_window {
                    return Ok(Transition::None);
                }
                let kind = if policy.protected && record.consent_protected {
                    ArchiveKind::Protected
                } else {
                    ArchiveKind::Standard
                };
                self.store.archive(&record.id, kind, now)?;
                Ok(Transition::Archived)
            }
            RecordLifecycleState::Archived | RecordLifecycleState::ProtectedArchive => {
                if policy.final_action != FinalAction::Purge {
                    return Ok(Transition::None);
                }
                match record.archived_at {
                    Some(archived_at) if now - archived_at >= policy.archive_window => {
                        self.store.purge(&record.id)?;
                        Ok(Transition::Purged)
                    }
                    Some(_) => Ok(Transition::None),
                    None => Err(EngineError::Internal(format!(
                        "Record '{}' is archived but carries no archive timestamp",
                        record.id
                    ))),
                }
            }
            RecordLifecycleState::Purged => Ok(Transition::None),
        }
    }

    /// Drops the cached view of a record whose lifecycle state changed.
    fn invalidate_for(&self, record: &RecordMeta) {
        let namespace = if record.category == self.analytics_category {
            ANALYTICS_NAMESPACE
        } else {
            self.policies
                .iter()
                .find(|p| p.category == record.category)
                .map(|p| p.cache_namespace.as_str())
                .unwrap_or(record.category.as_str())
        };

        if self.cache.invalidate(namespace, &record.id) {
            debug!(namespace, record_id = %record.id, "Invalidated cached view");
        }
    }

    // == Scan ==
    /// Fetches record metadata with bounded retry and backoff. Without a
    /// scan there is no partial progress to preserve, so exhausting the
    /// retries surfaces `StoreUnavailable` for the whole cycle.
    fn scan_with_retry(&self) -> Result<Vec<RecordMeta>> {
        let mut backoff = SCAN_BACKOFF;

        for attempt in 1..=SCAN_ATTEMPTS {
            match self.store.scan_metadata() {
                Ok(records) => return Ok(records),
                Err(err) if attempt < SCAN_ATTEMPTS => {
                    warn!(attempt, error = %err, "Metadata scan failed, backing off");
                    std::thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(err) => {
                    return Err(EngineError::StoreUnavailable(err.to_string()));
                }
            }
        }
        unreachable!("scan loop returns on success or final error")
    }
}
