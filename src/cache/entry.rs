//! Cache Entry Module
//!
//! Defines the structure for individual cache entries. Every entry carries
//! the privacy level it was stored under and an expiry derived from it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::policy::PrivacyLevel;

// == Cache Entry ==
/// A single cached value and its metadata.
///
/// Entries are owned exclusively by the cache: created on put, replaced on
/// overwrite, removed on expiry or explicit invalidation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Namespace the entry lives in
    pub namespace: String,
    /// Key within the namespace
    pub key: String,
    /// The stored payload, opaque to the cache
    pub value: Value,
    /// Privacy level the entry was stored under
    pub privacy_level: PrivacyLevel,
    /// Serialized payload size in bytes
    pub size_bytes: usize,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds); always after `created_at`
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `lifetime` after now.
    pub fn new(
        namespace: String,
        key: String,
        value: Value,
        privacy_level: PrivacyLevel,
        size_bytes: usize,
        lifetime: Duration,
    ) -> Self {
        let now = current_timestamp_ms();

        Self {
            namespace,
            key,
            value,
            privacy_level,
            size_bytes,
            created_at: now,
            expires_at: now + lifetime.as_millis() as u64,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired when the current time is
    /// greater than or equal to its expiration time, so the entry becomes
    /// logically absent the instant its lifetime has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds; 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let now = current_timestamp_ms();
        self.expires_at.saturating_sub(now)
    }

    /// Returns remaining lifetime in whole seconds; 0 once expired.
    pub fn ttl_remaining(&self) -> u64 {
        self.ttl_remaining_ms() / 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
