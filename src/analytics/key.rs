//! Derived Cache Keys
//!
//! Aggregate results are cached in the "analytics" namespace under a key
//! derived from the full query, so identical queries hit the same entry
//! and differing queries can never collide into each other's results.

use sha2::{Digest, Sha256};

use crate::analytics::{MetricSpec, RawRow};

/// Computes the cache key for an aggregation query.
///
/// The key is the SHA-256 of the canonical JSON form of the query: group-by
/// fields, metric specs, threshold, and the input rows (whose maps are
/// ordered, keeping the serialization stable). Hex-encoded, so it is always
/// within the cache's key-length limit.
pub fn derived_cache_key(
    group_by: &[String],
    metrics: &[MetricSpec],
    k_threshold: usize,
    rows: &[RawRow],
) -> String {
    let canonical = serde_json::json!({
        "group_by": group_by,
        "metrics": metrics,
        "k_threshold": k_threshold,
        "rows": rows,
    });
    let bytes = serde_json::to_vec(&canonical).expect("canonical query serialization");

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MetricKind;
    use std::collections::BTreeMap;

    fn sample_row(subject: &str) -> RawRow {
        RawRow {
            subject_id: subject.to_string(),
            dimensions: BTreeMap::from([("course".to_string(), "algebra".to_string())]),
            metrics: BTreeMap::from([("score".to_string(), 1.0)]),
        }
    }

    fn sample_metrics() -> Vec<MetricSpec> {
        vec![MetricSpec {
            name: "score".to_string(),
            kind: MetricKind::Mean,
        }]
    }

    #[test]
    fn test_identical_queries_share_a_key() {
        let rows = vec![sample_row("s1")];
        let group_by = vec!["course".to_string()];

        let a = derived_cache_key(&group_by, &sample_metrics(), 5, &rows);
        let b = derived_cache_key(&group_by, &sample_metrics(), 5, &rows);

        assert_eq!(a, b);
    }

    #[test]
    fn test_differing_queries_differ() {
        let rows = vec![sample_row("s1")];
        let group_by = vec!["course".to_string()];

        let base = derived_cache_key(&group_by, &sample_metrics(), 5, &rows);
        let other_k = derived_cache_key(&group_by, &sample_metrics(), 6, &rows);
        let other_rows =
            derived_cache_key(&group_by, &sample_metrics(), 5, &[sample_row("s2")]);

        assert_ne!(base, other_k);
        assert_ne!(base, other_rows);
    }

    #[test]
    fn test_key_is_hex_digest() {
        let key = derived_cache_key(&[], &[], 5, &[]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
