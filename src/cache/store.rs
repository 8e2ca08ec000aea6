//! Cache Store Module
//!
//! Main cache engine: a sharded keyed store whose entry lifetimes derive
//! from each record's privacy classification.
//!
//! A (namespace, key) pair always maps to exactly one shard, so operations
//! on the same key serialize behind that shard's lock (a reader never sees
//! a partially written value, and racing writers resolve to whichever
//! commits last), while operations on keys in different shards proceed
//! without contending. There is no cache-global lock.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, StatsSnapshot, MAX_KEY_LENGTH};
use crate::config::{Config, NamespacePolicy};
use crate::error::{EngineError, Result};
use crate::policy::{PrivacyLevel, PrivacyPolicyResolver};

/// Number of lock shards.
const SHARD_COUNT: usize = 64;

type Shard = RwLock<HashMap<(String, String), CacheEntry>>;

// == Tiered Cache ==
/// Keyed cache with privacy-derived expiry and per-shard locking.
#[derive(Debug)]
pub struct TieredCache {
    /// Entry shards; a key's shard is fixed by its hash
    shards: Vec<Shard>,
    /// Maps privacy levels to lifetimes
    resolver: PrivacyPolicyResolver,
    /// Per-namespace payload limits and lifetime caps
    namespaces: Vec<NamespacePolicy>,
    /// Size limit for namespaces without an explicit policy
    default_max_value_bytes: usize,
    /// Operation counters
    stats: CacheStats,
}

impl TieredCache {
    // == Constructor ==
    /// Creates a cache from validated configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PrivacyPolicyResolver::new(config.lifetimes),
            config.namespaces.clone(),
            config.default_max_value_bytes,
        )
    }

    /// Creates a cache with an explicit resolver and namespace table.
    pub fn new(
        resolver: PrivacyPolicyResolver,
        namespaces: Vec<NamespacePolicy>,
        default_max_value_bytes: usize,
    ) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Self {
            shards,
            resolver,
            namespaces,
            default_max_value_bytes,
            stats: CacheStats::new(),
        }
    }

    // == Put ==
    /// Stores a value under (namespace, key) with a lifetime resolved from
    /// its privacy level, replacing any existing entry immediately.
    ///
    /// A namespace may cap entry lifetimes (the analytics namespace uses a
    /// short cap); the effective lifetime is the minimum of the cap and the
    /// privacy-derived lifetime. A payload larger than the namespace's
    /// limit is rejected and the previous entry, if any, stays untouched.
    pub fn put(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        privacy_level: PrivacyLevel,
    ) -> Result<CacheEntry> {
        if namespace.is_empty() {
            return Err(EngineError::InvalidRequest(
                "Namespace cannot be empty".to_string(),
            ));
        }
        if key.is_empty() {
            return Err(EngineError::InvalidRequest(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(EngineError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let size_bytes = serde_json::to_vec(&value)
            .map_err(|e| EngineError::Internal(format!("Unserializable payload: {}", e)))?
            .len();

        let limit = self.max_value_bytes(namespace);
        if size_bytes > limit {
            self.stats.record_oversized_rejection();
            return Err(EngineError::OversizedValue {
                namespace: namespace.to_string(),
                limit,
                actual: size_bytes,
            });
        }

        let mut lifetime = self.resolver.resolve(privacy_level);
        if let Some(cap_secs) = self.ttl_cap_secs(namespace) {
            lifetime = lifetime.min(Duration::from_secs(cap_secs));
        }

        let entry = CacheEntry::new(
            namespace.to_string(),
            key.to_string(),
            value,
            privacy_level,
            size_bytes,
            lifetime,
        );

        let shard = self.shard_for(namespace, key);
        shard
            .write()
            .insert((namespace.to_string(), key.to_string()), entry.clone());
        self.stats.record_insert();

        Ok(entry)
    }

    // == Get ==
    /// Retrieves the entry under (namespace, key).
    ///
    /// Returns `None` for an absent or expired entry; an expired entry is
    /// evicted at read time (lazy expiry). A miss is a normal outcome, not
    /// an error.
    pub fn get(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        let shard = self.shard_for(namespace, key);
        let lookup = (namespace.to_string(), key.to_string());

        {
            let entries = shard.read();
            match entries.get(&lookup) {
                Some(entry) if !entry.is_expired() => {
                    let hit = entry.clone();
                    self.stats.record_hit();
                    return Some(hit);
                }
                Some(_) => {} // expired, fall through to evict
                None => {
                    self.stats.record_miss();
                    return None;
                }
            }
        }

        // Re-check under the write lock: a racing put may have replaced
        // the expired entry since the read lock was released.
        let mut entries = shard.write();
        match entries.get(&lookup) {
            Some(entry) if !entry.is_expired() => {
                let hit = entry.clone();
                self.stats.record_hit();
                Some(hit)
            }
            Some(_) => {
                entries.remove(&lookup);
                self.stats.record_expired_eviction();
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Invalidate ==
    /// Removes an entry unconditionally. Returns whether one was present.
    pub fn invalidate(&self, namespace: &str, key: &str) -> bool {
        let shard = self.shard_for(namespace, key);
        let removed = shard
            .write()
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some();

        if removed {
            self.stats.record_invalidation();
        }
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, shard by shard.
    ///
    /// Expiry is lazy at read time; this sweep only reclaims memory for
    /// entries nobody asks for again. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut removed = 0;

        for shard in &self.shards {
            let mut entries = shard.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired_at(now));
            removed += before - entries.len();
        }

        self.stats.record_expired_evictions(removed as u64);
        removed
    }

    // == Stats ==
    /// Returns a point-in-time snapshot of the counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Current number of entries across all shards, expired ones included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Internals ==
    fn shard_for(&self, namespace: &str, key: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        namespace.hash(&mut hasher);
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % SHARD_COUNT]
    }

    fn max_value_bytes(&self, namespace: &str) -> usize {
        self.namespaces
            .iter()
            .find(|ns| ns.name == namespace)
            .map(|ns| ns.max_value_bytes)
            .unwrap_or(self.default_max_value_bytes)
    }

    fn ttl_cap_secs(&self, namespace: &str) -> Option<u64> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == namespace)
            .and_then(|ns| ns.ttl_cap_secs)
    }
}
