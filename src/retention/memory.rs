//! In-Memory Record Store
//!
//! Reference [`RecordStore`] adapter backed by in-process maps. The binary
//! uses it as its default store; tests use it to drive the archiver
//! deterministically. Real deployments implement [`RecordStore`] over the
//! platform's persistence layer instead.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::retention::{ArchiveKind, RecordLifecycleState, RecordMeta, RecordStore, StoreError};

// == Memory Record Store ==
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    /// Live records by id (everything not yet purged)
    records: Mutex<BTreeMap<String, RecordMeta>>,
    /// Ids copied into the standard archive, in arrival order
    standard_archive: Mutex<Vec<String>>,
    /// Ids copied into the protected archive, in arrival order
    protected_archive: Mutex<Vec<String>>,
    /// Ids permanently deleted
    purged: Mutex<Vec<String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: RecordMeta) {
        self.records.lock().insert(record.id.clone(), record);
    }

    /// Returns a record's current metadata, if it still exists.
    pub fn get(&self, id: &str) -> Option<RecordMeta> {
        self.records.lock().get(id).cloned()
    }

    /// Ids in the standard archive.
    pub fn standard_archive_ids(&self) -> Vec<String> {
        self.standard_archive.lock().clone()
    }

    /// Ids in the protected archive.
    pub fn protected_archive_ids(&self) -> Vec<String> {
        self.protected_archive.lock().clone()
    }

    /// Ids that have been permanently deleted.
    pub fn purged_ids(&self) -> Vec<String> {
        self.purged.lock().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn scan_metadata(&self) -> Result<Vec<RecordMeta>, StoreError> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn archive(
        &self,
        id: &str,
        kind: ArchiveKind,
        archived_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match kind {
            ArchiveKind::Standard => {
                record.state = RecordLifecycleState::Archived;
                self.standard_archive.lock().push(id.to_string());
            }
            ArchiveKind::Protected => {
                record.state = RecordLifecycleState::ProtectedArchive;
                self.protected_archive.lock().push(id.to_string());
            }
        }
        record.archived_at = Some(archived_at);
        Ok(())
    }

    fn purge(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.records.lock().remove(id);
        if removed.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.purged.lock().push(id.to_string());
        Ok(())
    }
}
