//! Scheduled Retention Task
//!
//! Drives the archiver on a timer. Cycles are blocking (store calls,
//! retry backoff), so each one runs on the blocking pool; if a cycle is
//! still in flight when the timer fires again, the trigger is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::retention::RetentionArchiver;

/// Spawns the scheduled retention task.
///
/// # Arguments
/// * `archiver` - shared archiver reference
/// * `cycle_interval_secs` - Interval in seconds between cycles
///
/// # Returns
/// A JoinHandle for the spawned task. Abort it during graceful shutdown;
/// pair with the archiver's cancel handle to stop an in-flight cycle
/// between records.
pub fn spawn_retention_task(
    archiver: Arc<RetentionArchiver>,
    cycle_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cycle_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting retention task with interval of {} seconds",
            cycle_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let archiver = Arc::clone(&archiver);
            let result =
                tokio::task::spawn_blocking(move || archiver.run_cycle(Utc::now())).await;

            match result {
                Ok(Ok(summary)) => {
                    info!(
                        archived = summary.archived_count,
                        purged = summary.purged_count,
                        failed = summary.failed_ids.len(),
                        cancelled = summary.cancelled,
                        "Scheduled retention cycle finished"
                    );
                }
                Ok(Err(EngineError::CycleInProgress)) => {
                    warn!("Previous retention cycle still running, trigger skipped");
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "Retention cycle failed, will retry on next trigger");
                }
                Err(err) => {
                    warn!(error = %err, "Retention cycle task panicked or was aborted");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TieredCache;
    use crate::config::Config;
    use crate::retention::{MemoryRecordStore, RecordMeta};
    use chrono::Duration as ChronoDuration;

    fn archiver_over(store: Arc<MemoryRecordStore>) -> Arc<RetentionArchiver> {
        let config = Config::default();
        let cache = Arc::new(TieredCache::from_config(&config));
        Arc::new(RetentionArchiver::new(store, cache, &config))
    }

    #[tokio::test]
    async fn test_retention_task_archives_due_records() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(RecordMeta::active(
            "r1",
            "progress",
            Utc::now() - ChronoDuration::days(200),
        ));

        let handle = spawn_retention_task(archiver_over(Arc::clone(&store)), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.standard_archive_ids(), vec!["r1".to_string()]);
        handle.abort();
    }

    #[tokio::test]
    async fn test_retention_task_can_be_aborted() {
        let store = Arc::new(MemoryRecordStore::new());
        let handle = spawn_retention_task(archiver_over(store), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
