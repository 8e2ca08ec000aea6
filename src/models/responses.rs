//! Response DTOs for the engine API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::analytics::GroupStat;
use crate::cache::CacheEntry;
use crate::policy::PrivacyLevel;

/// Response body for the cache put operation (PUT /cache/set)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    pub namespace: String,
    pub key: String,
    /// Level the entry was stored under
    pub privacy_level: PrivacyLevel,
    /// Remaining lifetime in seconds
    pub ttl_seconds: u64,
}

impl PutResponse {
    /// Builds the response from the stored entry.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            message: format!(
                "Key '{}' stored in namespace '{}'",
                entry.key, entry.namespace
            ),
            namespace: entry.namespace.clone(),
            key: entry.key.clone(),
            privacy_level: entry.privacy_level,
            ttl_seconds: entry.ttl_remaining(),
        }
    }
}

/// Response body for the cache get operation (GET /cache/:namespace/:key)
///
/// A miss is a normal outcome: `hit` is false and `value` is absent, with
/// a 200 status.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub namespace: String,
    pub key: String,
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl GetResponse {
    pub fn hit(entry: CacheEntry) -> Self {
        Self {
            namespace: entry.namespace,
            key: entry.key,
            hit: true,
            value: Some(entry.value),
        }
    }

    pub fn miss(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            hit: false,
            value: None,
        }
    }
}

/// Response body for invalidation (DELETE /cache/:namespace/:key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub namespace: String,
    pub key: String,
    /// Whether an entry was actually present
    pub removed: bool,
}

impl InvalidateResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, removed: bool) -> Self {
        let namespace = namespace.into();
        let key = key.into();
        Self {
            message: if removed {
                format!("Key '{}' invalidated in namespace '{}'", key, namespace)
            } else {
                format!("Key '{}' was not present in namespace '{}'", key, namespace)
            },
            namespace,
            key,
            removed,
        }
    }
}

/// Response body for aggregation (POST /analytics/aggregate)
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    /// Sanitized group statistics, suppression markers included
    pub groups: Vec<GroupStat>,
    /// Disclosure threshold the aggregation ran with
    pub k_threshold: usize,
    /// Whether the result came from the analytics cache
    pub cached: bool,
}

/// Response body for the warmer endpoint (POST /cache/warm)
#[derive(Debug, Clone, Serialize)]
pub struct WarmResponse {
    pub message: String,
    /// Entries actually warmed
    pub warmed: usize,
    /// Groups that were eligible candidates
    pub candidates: usize,
}

impl WarmResponse {
    pub fn new(warmed: usize, candidates: usize) -> Self {
        Self {
            message: format!("Warmed {} of {} candidate groups", warmed, candidates),
            warmed,
            candidates,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn entry() -> CacheEntry {
        CacheEntry::new(
            "progress".to_string(),
            "learner-1".to_string(),
            json!({"done": 2}),
            PrivacyLevel::Private,
            16,
            Duration::from_secs(900),
        )
    }

    #[test]
    fn test_put_response_from_entry() {
        let resp = PutResponse::from_entry(&entry());
        let json = serde_json::to_string(&resp).unwrap();

        assert!(json.contains("learner-1"));
        assert!(json.contains("\"privacy_level\":3"));
    }

    #[test]
    fn test_get_response_hit() {
        let resp = GetResponse::hit(entry());
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["hit"], json!(true));
        assert_eq!(json["value"], json!({"done": 2}));
    }

    #[test]
    fn test_get_response_miss_omits_value() {
        let resp = GetResponse::miss("progress", "absent");
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["hit"], json!(false));
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_invalidate_response_messages() {
        let removed = InvalidateResponse::new("progress", "k", true);
        assert!(removed.message.contains("invalidated"));

        let absent = InvalidateResponse::new("progress", "k", false);
        assert!(absent.message.contains("not present"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();

        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
