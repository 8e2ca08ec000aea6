//! Analytics Module
//!
//! Group aggregation over raw learning-analytics rows with K-anonymity
//! suppression enforced at the aggregation boundary, plus derived cache
//! keys for caching aggregate results.

mod aggregator;
mod key;

pub use aggregator::{aggregate, GroupStat, MetricKind, MetricSpec, RawRow, DEFAULT_K_THRESHOLD};
pub use key::derived_cache_key;

// == Public Constants ==
/// Cache namespace for aggregate results; carries a short lifetime cap.
pub const ANALYTICS_NAMESPACE: &str = "analytics";
