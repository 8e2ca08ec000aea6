//! Request DTOs for the engine API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::analytics::{MetricSpec, RawRow};
use crate::cache::MAX_KEY_LENGTH;
use crate::policy::PrivacyLevel;

/// Request body for the cache put operation (PUT /cache/set)
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// Target namespace ("progress", "content", "analytics", ...)
    pub namespace: String,
    /// Key within the namespace
    pub key: String,
    /// Opaque payload
    pub value: Value,
    /// Raw privacy classification; absent or unknown values are treated
    /// as the most conservative level
    #[serde(default)]
    pub privacy_level: Option<u8>,
}

impl PutRequest {
    /// Resolves the request's privacy level, defaulting conservatively.
    pub fn level(&self) -> PrivacyLevel {
        match self.privacy_level {
            Some(raw) => PrivacyLevel::from_raw(raw),
            None => PrivacyLevel::Restricted,
        }
    }

    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.namespace.is_empty() {
            return Some("Namespace cannot be empty".to_string());
        }
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Request body for the aggregation endpoint (POST /analytics/aggregate)
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateRequest {
    /// Raw rows from the platform's query layer
    pub rows: Vec<RawRow>,
    /// Fields to partition by
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Aggregates to compute per group
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    /// Disclosure threshold override; the configured default applies
    /// when absent
    #[serde(default)]
    pub k_threshold: Option<usize>,
}

impl AggregateRequest {
    /// Validates the request data.
    pub fn validate(&self) -> Option<String> {
        if let Some(k) = self.k_threshold {
            if k < 2 {
                return Some("k_threshold must be at least 2".to_string());
            }
        }
        None
    }
}

/// Request body for the warmer endpoint (POST /cache/warm)
#[derive(Debug, Clone, Deserialize)]
pub struct WarmRequest {
    /// Raw rows to aggregate before warming
    pub rows: Vec<RawRow>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    /// How many top groups to warm (default 5)
    #[serde(default)]
    pub top_n: Option<usize>,
    /// Eligibility threshold; the configured default applies when absent
    #[serde(default)]
    pub min_subject_count: Option<u64>,
}

/// Request body for triggering a retention cycle (POST /retention/run-cycle)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunCycleRequest {
    /// Clock reading to evaluate boundaries against; defaults to the
    /// current time
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_request_deserialize() {
        let json = r#"{"namespace": "progress", "key": "learner-1", "value": {"x": 1}, "privacy_level": 3}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.namespace, "progress");
        assert_eq!(req.key, "learner-1");
        assert_eq!(req.value, json!({"x": 1}));
        assert_eq!(req.level(), PrivacyLevel::Private);
    }

    #[test]
    fn test_put_request_missing_level_is_restricted() {
        let json = r#"{"namespace": "progress", "key": "k", "value": 1}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.level(), PrivacyLevel::Restricted);
    }

    #[test]
    fn test_put_request_unknown_level_is_restricted() {
        let json = r#"{"namespace": "progress", "key": "k", "value": 1, "privacy_level": 9}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.level(), PrivacyLevel::Restricted);
    }

    #[test]
    fn test_put_request_validation() {
        let req = PutRequest {
            namespace: "".to_string(),
            key: "k".to_string(),
            value: json!(1),
            privacy_level: None,
        };
        assert!(req.validate().is_some());

        let req = PutRequest {
            namespace: "progress".to_string(),
            key: "x".repeat(MAX_KEY_LENGTH + 1),
            value: json!(1),
            privacy_level: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_aggregate_request_defaults() {
        let json = r#"{"rows": []}"#;
        let req: AggregateRequest = serde_json::from_str(json).unwrap();

        assert!(req.group_by.is_empty());
        assert!(req.metrics.is_empty());
        assert!(req.k_threshold.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_aggregate_request_rejects_tiny_k() {
        let json = r#"{"rows": [], "k_threshold": 1}"#;
        let req: AggregateRequest = serde_json::from_str(json).unwrap();

        assert!(req.validate().is_some());
    }

    #[test]
    fn test_run_cycle_request_empty_body() {
        let req: RunCycleRequest = serde_json::from_str("{}").unwrap();
        assert!(req.now.is_none());
    }
}
