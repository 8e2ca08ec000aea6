//! Configuration Module
//!
//! Handles loading and validating the engine configuration.
//!
//! Scalar knobs come from environment variables with sensible defaults.
//! The namespace table and the per-category retention policies ship as
//! built-in defaults; every recognized option is an explicit field here and
//! the whole configuration is validated once at startup, before any
//! component is constructed.

use std::env;

use chrono::Duration;
use thiserror::Error;

use crate::policy::{LifetimeTable, PrivacyLevel};
use crate::retention::{FinalAction, RetentionPolicy};

// == Config Error ==
/// Raised when the loaded configuration is inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("privacy lifetimes must be positive and non-increasing toward level 4")]
    UnorderedLifetimes,

    #[error("k_threshold must be at least 2, got {0}")]
    KThresholdTooSmall(usize),

    #[error("namespace policy has an empty name")]
    EmptyNamespace,

    #[error("namespace '{0}' allows zero-byte payloads")]
    ZeroSizeLimit(String),

    #[error("namespace '{0}' caps entry lifetime at zero")]
    ZeroTtlCap(String),

    #[error("retention policy '{0}' is invalid: {1}")]
    InvalidRetentionPolicy(String, String),

    #[error("analytics retention window must be positive")]
    NonPositiveAnalyticsWindow,

    #[error("interval '{0}' must be positive")]
    NonPositiveInterval(&'static str),
}

// == Namespace Policy ==
/// Per-namespace cache limits.
#[derive(Debug, Clone)]
pub struct NamespacePolicy {
    /// Namespace name (e.g. "progress", "content", "analytics")
    pub name: String,
    /// Maximum serialized payload size in bytes
    pub max_value_bytes: usize,
    /// Optional lifetime cap in seconds; the effective entry lifetime is
    /// the minimum of this and the privacy-derived lifetime
    pub ttl_cap_secs: Option<u64>,
}

// == Config ==
/// Engine configuration, loaded once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache lifetime per privacy level
    pub lifetimes: LifetimeTable,
    /// Known cache namespaces and their limits
    pub namespaces: Vec<NamespacePolicy>,
    /// Payload size limit applied to namespaces not listed above
    pub default_max_value_bytes: usize,
    /// Minimum distinct-subject population for a visible aggregate group
    pub k_threshold: usize,
    /// Lifecycle policy per record category
    pub retention_policies: Vec<RetentionPolicy>,
    /// Record category holding anonymized analytics sessions
    pub analytics_category: String,
    /// Direct-purge window for the anonymized analytics category
    pub analytics_retention: Duration,
    /// Interval between retention cycles, in seconds
    pub cycle_interval_secs: u64,
    /// Interval between opportunistic expired-entry sweeps, in seconds
    pub cleanup_interval_secs: u64,
    /// Warmer default: minimum subjects a group needs to be warm-eligible
    pub warm_min_subjects: u64,
    /// Warmer ranking tie-breaker metric
    pub warm_rank_metric: String,
    /// Privacy level assigned to warmed aggregate entries
    pub warm_privacy_level: PrivacyLevel,
}

impl Config {
    /// Creates a Config from environment variables, falling back to the
    /// built-in defaults for anything unset or unparsable.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `TTL_PUBLIC` / `TTL_LIMITED` / `TTL_PRIVATE` / `TTL_RESTRICTED` -
    ///   per-level cache lifetimes in seconds (defaults: 3600/1800/900/300)
    /// - `K_THRESHOLD` - disclosure threshold (default: 5)
    /// - `ANALYTICS_RETENTION_DAYS` - direct-purge window for anonymized
    ///   analytics sessions (default: 730)
    /// - `CYCLE_INTERVAL` - retention cycle frequency in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - expiry sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.server_port = env_parse("SERVER_PORT", config.server_port);
        config.lifetimes.public_secs = env_parse("TTL_PUBLIC", config.lifetimes.public_secs);
        config.lifetimes.limited_secs = env_parse("TTL_LIMITED", config.lifetimes.limited_secs);
        config.lifetimes.private_secs = env_parse("TTL_PRIVATE", config.lifetimes.private_secs);
        config.lifetimes.restricted_secs =
            env_parse("TTL_RESTRICTED", config.lifetimes.restricted_secs);
        config.k_threshold = env_parse("K_THRESHOLD", config.k_threshold);
        config.cycle_interval_secs = env_parse("CYCLE_INTERVAL", config.cycle_interval_secs);
        config.cleanup_interval_secs = env_parse("CLEANUP_INTERVAL", config.cleanup_interval_secs);

        let analytics_days: i64 = env_parse("ANALYTICS_RETENTION_DAYS", 730);
        config.analytics_retention = Duration::days(analytics_days);

        config
    }

    /// Checks every invariant the rest of the engine assumes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lifetimes.is_ordered() {
            return Err(ConfigError::UnorderedLifetimes);
        }
        if self.k_threshold < 2 {
            return Err(ConfigError::KThresholdTooSmall(self.k_threshold));
        }
        for ns in &self.namespaces {
            if ns.name.is_empty() {
                return Err(ConfigError::EmptyNamespace);
            }
            if ns.max_value_bytes == 0 {
                return Err(ConfigError::ZeroSizeLimit(ns.name.clone()));
            }
            if ns.ttl_cap_secs == Some(0) {
                return Err(ConfigError::ZeroTtlCap(ns.name.clone()));
            }
        }
        for policy in &self.retention_policies {
            if policy.category.is_empty() {
                return Err(ConfigError::InvalidRetentionPolicy(
                    policy.category.clone(),
                    "empty category".to_string(),
                ));
            }
            if policy.cache_namespace.is_empty() {
                return Err(ConfigError::InvalidRetentionPolicy(
                    policy.category.clone(),
                    "empty cache namespace".to_string(),
                ));
            }
            if policy.active_window <= Duration::zero() {
                return Err(ConfigError::InvalidRetentionPolicy(
                    policy.category.clone(),
                    "active window must be positive".to_string(),
                ));
            }
            if policy.final_action == FinalAction::Purge
                && policy.archive_window <= Duration::zero()
            {
                return Err(ConfigError::InvalidRetentionPolicy(
                    policy.category.clone(),
                    "archive window must be positive when the final action is purge".to_string(),
                ));
            }
        }
        if self.analytics_retention <= Duration::zero() {
            return Err(ConfigError::NonPositiveAnalyticsWindow);
        }
        if self.cycle_interval_secs == 0 {
            return Err(ConfigError::NonPositiveInterval("CYCLE_INTERVAL"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::NonPositiveInterval("CLEANUP_INTERVAL"));
        }
        Ok(())
    }

    // == Lookups ==
    /// Returns the policy for a namespace, if one is configured.
    pub fn namespace_policy(&self, name: &str) -> Option<&NamespacePolicy> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Payload size limit for a namespace (configured or default).
    pub fn max_value_bytes(&self, namespace: &str) -> usize {
        self.namespace_policy(namespace)
            .map(|ns| ns.max_value_bytes)
            .unwrap_or(self.default_max_value_bytes)
    }

    /// Returns the retention policy for a record category.
    pub fn retention_policy(&self, category: &str) -> Option<&RetentionPolicy> {
        self.retention_policies
            .iter()
            .find(|p| p.category == category)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            lifetimes: LifetimeTable::default(),
            namespaces: vec![
                NamespacePolicy {
                    name: "progress".to_string(),
                    max_value_bytes: 64 * 1024,
                    ttl_cap_secs: None,
                },
                NamespacePolicy {
                    name: "content".to_string(),
                    max_value_bytes: 256 * 1024,
                    ttl_cap_secs: None,
                },
                NamespacePolicy {
                    name: "analytics".to_string(),
                    max_value_bytes: 128 * 1024,
                    ttl_cap_secs: Some(120),
                },
            ],
            default_max_value_bytes: 64 * 1024,
            k_threshold: 5,
            retention_policies: vec![
                RetentionPolicy {
                    category: "progress".to_string(),
                    active_window: Duration::days(180),
                    archive_window: Duration::days(365),
                    final_action: FinalAction::Purge,
                    protected: true,
                    cache_namespace: "progress".to_string(),
                },
                RetentionPolicy {
                    category: "content".to_string(),
                    active_window: Duration::days(365),
                    archive_window: Duration::days(730),
                    final_action: FinalAction::Archive,
                    protected: false,
                    cache_namespace: "content".to_string(),
                },
            ],
            analytics_category: "analytics_session".to_string(),
            analytics_retention: Duration::days(730),
            cycle_interval_secs: 3600,
            cleanup_interval_secs: 30,
            warm_min_subjects: 10,
            warm_rank_metric: "effectiveness".to_string(),
            warm_privacy_level: PrivacyLevel::Limited,
        }
    }
}

// == Helpers ==
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
