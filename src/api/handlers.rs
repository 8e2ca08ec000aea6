//! API Handlers
//!
//! HTTP request handlers for each engine endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::debug;

use crate::analytics::{aggregate, derived_cache_key, GroupStat, ANALYTICS_NAMESPACE};
use crate::cache::{StatsSnapshot, TieredCache};
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::models::{
    AggregateRequest, AggregateResponse, GetResponse, HealthResponse, InvalidateResponse,
    PutRequest, PutResponse, RunCycleRequest, WarmRequest, WarmResponse,
};
use crate::policy::PrivacyLevel;
use crate::retention::{CycleSummary, MemoryRecordStore, RecordStore, RetentionArchiver};
use crate::warmer::CacheWarmer;

/// Application state shared across all handlers.
///
/// Every component is constructed once at startup and shared by
/// reference; none of them is ambient global state.
#[derive(Clone)]
pub struct AppState {
    /// The privacy-tiered cache
    pub cache: Arc<TieredCache>,
    /// The retention archiver, also reachable by the scheduled task
    pub archiver: Arc<RetentionArchiver>,
    /// Advisory cache warmer
    pub warmer: Arc<CacheWarmer>,
    /// Default disclosure threshold for aggregation requests
    pub k_threshold: usize,
}

impl AppState {
    /// Creates an AppState over explicitly constructed components.
    pub fn new(
        cache: Arc<TieredCache>,
        archiver: Arc<RetentionArchiver>,
        warmer: Arc<CacheWarmer>,
        k_threshold: usize,
    ) -> Self {
        Self {
            cache,
            archiver,
            warmer,
            k_threshold,
        }
    }

    /// Creates an AppState from configuration with an in-memory record
    /// store backing the archiver.
    pub fn from_config(config: &Config) -> Self {
        Self::with_store(config, Arc::new(MemoryRecordStore::new()))
    }

    /// Creates an AppState over a caller-provided record store.
    pub fn with_store(config: &Config, store: Arc<dyn RecordStore>) -> Self {
        let cache = Arc::new(TieredCache::from_config(config));
        let archiver = Arc::new(RetentionArchiver::new(store, Arc::clone(&cache), config));
        let warmer = Arc::new(CacheWarmer::new(Arc::clone(&cache), config));
        Self::new(cache, archiver, warmer, config.k_threshold)
    }
}

/// Handler for PUT /cache/set
///
/// Stores a payload under (namespace, key) with a lifetime derived from
/// its privacy classification.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(EngineError::InvalidRequest(error_msg));
    }

    let level = req.level();
    let entry = state
        .cache
        .put(&req.namespace, &req.key, req.value, level)?;

    Ok(Json(PutResponse::from_entry(&entry)))
}

/// Handler for GET /cache/:namespace/:key
///
/// A miss (absent or expired entry) is a normal 200 response with
/// `hit = false`; callers fall through to the platform's store.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Json<GetResponse> {
    match state.cache.get(&namespace, &key) {
        Some(entry) => Json(GetResponse::hit(entry)),
        None => Json(GetResponse::miss(namespace, key)),
    }
}

/// Handler for DELETE /cache/:namespace/:key
///
/// Unconditional removal; removing an absent key is a no-op, not an error.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&namespace, &key);
    Json(InvalidateResponse::new(namespace, key, removed))
}

/// Handler for POST /analytics/aggregate
///
/// Serves the sanitized aggregation, from the analytics cache when the
/// derived query key hits. Caching the fresh result is best effort: a
/// cache failure degrades to computing per request, it never fails the
/// caller.
pub async fn aggregate_handler(
    State(state): State<AppState>,
    Json(req): Json<AggregateRequest>,
) -> Result<Json<AggregateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(EngineError::InvalidRequest(error_msg));
    }

    let k_threshold = req.k_threshold.unwrap_or(state.k_threshold);
    let cache_key = derived_cache_key(&req.group_by, &req.metrics, k_threshold, &req.rows);

    if let Some(entry) = state.cache.get(ANALYTICS_NAMESPACE, &cache_key) {
        match serde_json::from_value::<Vec<GroupStat>>(entry.value) {
            Ok(groups) => {
                return Ok(Json(AggregateResponse {
                    groups,
                    k_threshold,
                    cached: true,
                }));
            }
            Err(err) => {
                debug!(error = %err, "Cached aggregate unreadable, recomputing");
            }
        }
    }

    let groups = aggregate(&req.rows, &req.group_by, &req.metrics, k_threshold);

    // Aggregates passed the disclosure threshold; cohort-level data.
    match serde_json::to_value(&groups) {
        Ok(value) => {
            if let Err(err) =
                state
                    .cache
                    .put(ANALYTICS_NAMESPACE, &cache_key, value, PrivacyLevel::Limited)
            {
                debug!(error = %err, "Skipped caching aggregate result");
            }
        }
        Err(err) => {
            debug!(error = %err, "Aggregate result not cacheable");
        }
    }

    Ok(Json(AggregateResponse {
        groups,
        k_threshold,
        cached: false,
    }))
}

/// Handler for POST /cache/warm
///
/// Aggregates the supplied rows and warms the top groups into the
/// analytics namespace. Warming is advisory, so the endpoint reports how
/// many entries landed rather than failing on individual misses.
pub async fn warm_handler(
    State(state): State<AppState>,
    Json(req): Json<WarmRequest>,
) -> Result<Json<WarmResponse>> {
    let groups = aggregate(&req.rows, &req.group_by, &req.metrics, state.k_threshold);

    let top_n = req.top_n.unwrap_or(5);
    let min_subjects = req
        .min_subject_count
        .unwrap_or_else(|| state.warmer.default_min_subjects());

    let candidates = groups
        .iter()
        .filter(|g| !g.suppressed && g.subject_count >= min_subjects)
        .count();
    let warmed = state.warmer.warm_top(&groups, top_n, min_subjects);

    Ok(Json(WarmResponse::new(warmed, candidates)))
}

/// Handler for POST /retention/run-cycle
///
/// Triggers one retention cycle. Returns 409 if a cycle is already in
/// flight; the trigger is skipped, never queued.
pub async fn run_cycle_handler(
    State(state): State<AppState>,
    body: Option<Json<RunCycleRequest>>,
) -> Result<Json<CycleSummary>> {
    let now = body.and_then(|Json(req)| req.now).unwrap_or_else(Utc::now);

    let archiver = Arc::clone(&state.archiver);
    let summary = tokio::task::spawn_blocking(move || archiver.run_cycle(now))
        .await
        .map_err(|e| EngineError::Internal(format!("Cycle task failed: {}", e)))??;

    Ok(Json(summary))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.cache.stats())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
