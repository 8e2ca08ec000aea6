//! Cache Warmer
//!
//! Pre-populates the analytics namespace with the highest-traffic visible
//! aggregate groups so the first real request hits warm data. Strictly
//! advisory: a failure to warm an entry is logged and skipped, it never
//! affects correctness, only first-request latency.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::analytics::{GroupStat, ANALYTICS_NAMESPACE};
use crate::cache::TieredCache;
use crate::config::Config;
use crate::policy::PrivacyLevel;

// == Cache Warmer ==
pub struct CacheWarmer {
    cache: Arc<TieredCache>,
    /// Metric used to break subject-count ties when ranking groups
    rank_metric: String,
    /// Privacy level warmed entries are stored under
    privacy_level: PrivacyLevel,
    /// Default eligibility threshold for `warm_top` callers
    min_subjects: u64,
}

impl CacheWarmer {
    pub fn new(cache: Arc<TieredCache>, config: &Config) -> Self {
        Self {
            cache,
            rank_metric: config.warm_rank_metric.clone(),
            privacy_level: config.warm_privacy_level,
            min_subjects: config.warm_min_subjects,
        }
    }

    /// Default minimum subject count for warm eligibility.
    pub fn default_min_subjects(&self) -> u64 {
        self.min_subjects
    }

    // == Warm Top ==
    /// Warms the top `n` groups with at least `min_subject_count` subjects,
    /// ranked by subject count descending, ties broken by the ranking
    /// metric descending. Returns how many entries were actually warmed.
    ///
    /// Suppressed groups are never eligible; they carry nothing worth
    /// caching and their population is not comparable anyway.
    pub fn warm_top(&self, stats: &[GroupStat], n: usize, min_subject_count: u64) -> usize {
        let mut eligible: Vec<&GroupStat> = stats
            .iter()
            .filter(|stat| !stat.suppressed && stat.subject_count >= min_subject_count)
            .collect();

        eligible.sort_by(|a, b| {
            b.subject_count
                .cmp(&a.subject_count)
                .then_with(|| self.compare_rank_metric(b, a))
        });

        let mut warmed = 0;
        for stat in eligible.into_iter().take(n) {
            let key = group_cache_key(stat);
            let value = match serde_json::to_value(stat) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key, error = %err, "Skipping unserializable group");
                    continue;
                }
            };

            match self
                .cache
                .put(ANALYTICS_NAMESPACE, &key, value, self.privacy_level)
            {
                Ok(_) => {
                    warmed += 1;
                    debug!(key, subjects = stat.subject_count, "Warmed aggregate group");
                }
                Err(err) => {
                    warn!(key, error = %err, "Failed to warm group, continuing");
                }
            }
        }
        warmed
    }

    fn compare_rank_metric(&self, a: &GroupStat, b: &GroupStat) -> Ordering {
        let value = |stat: &GroupStat| stat.metrics.get(&self.rank_metric).copied();
        match (value(a), value(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Stable cache key for a group: its group-by values in field order.
fn group_cache_key(stat: &GroupStat) -> String {
    let parts: Vec<String> = stat
        .group_key
        .iter()
        .map(|(field, value)| format!("{}={}", field, value))
        .collect();
    parts.join("&")
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn warmer() -> (CacheWarmer, Arc<TieredCache>) {
        let config = Config::default();
        let cache = Arc::new(TieredCache::from_config(&config));
        (CacheWarmer::new(Arc::clone(&cache), &config), cache)
    }

    fn group(course: &str, subjects: u64, effectiveness: f64) -> GroupStat {
        GroupStat {
            group_key: BTreeMap::from([("course".to_string(), course.to_string())]),
            subject_count: subjects,
            metrics: BTreeMap::from([("effectiveness".to_string(), effectiveness)]),
            suppressed: false,
        }
    }

    fn suppressed_group(course: &str) -> GroupStat {
        GroupStat {
            group_key: BTreeMap::from([("course".to_string(), course.to_string())]),
            subject_count: 0,
            metrics: BTreeMap::new(),
            suppressed: true,
        }
    }

    #[test]
    fn test_warms_top_groups_into_analytics_namespace() {
        let (warmer, cache) = warmer();
        let stats = vec![group("algebra", 50, 0.8), group("geometry", 30, 0.9)];

        let warmed = warmer.warm_top(&stats, 2, 10);

        assert_eq!(warmed, 2);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=algebra").is_some());
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=geometry").is_some());
    }

    #[test]
    fn test_takes_only_n() {
        let (warmer, cache) = warmer();
        let stats = vec![
            group("a", 50, 0.1),
            group("b", 40, 0.1),
            group("c", 30, 0.1),
        ];

        let warmed = warmer.warm_top(&stats, 2, 10);

        assert_eq!(warmed, 2);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=a").is_some());
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=b").is_some());
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=c").is_none());
    }

    #[test]
    fn test_min_subject_count_filters() {
        let (warmer, cache) = warmer();
        let stats = vec![group("big", 12, 0.5), group("small", 9, 0.9)];

        let warmed = warmer.warm_top(&stats, 10, 10);

        assert_eq!(warmed, 1);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=small").is_none());
    }

    #[test]
    fn test_ties_broken_by_effectiveness() {
        let (warmer, cache) = warmer();
        let stats = vec![group("weak", 20, 0.2), group("strong", 20, 0.9)];

        let warmed = warmer.warm_top(&stats, 1, 10);

        assert_eq!(warmed, 1);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=strong").is_some());
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=weak").is_none());
    }

    #[test]
    fn test_suppressed_groups_never_warmed() {
        let (warmer, cache) = warmer();
        let stats = vec![suppressed_group("hidden"), group("visible", 15, 0.5)];

        let warmed = warmer.warm_top(&stats, 10, 0);

        assert_eq!(warmed, 1);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=hidden").is_none());
    }

    #[test]
    fn test_put_failure_is_swallowed() {
        let (warmer, cache) = warmer();
        // A key beyond the cache's key-length limit fails the put; the
        // warmer must shrug it off and keep going.
        let mut oversized_key = group("x", 40, 0.5);
        oversized_key.group_key.insert("padding".to_string(), "y".repeat(300));
        let stats = vec![oversized_key, group("ok", 20, 0.5)];

        let warmed = warmer.warm_top(&stats, 10, 10);

        assert_eq!(warmed, 1);
        assert!(cache.get(ANALYTICS_NAMESPACE, "course=ok").is_some());
    }

    #[test]
    fn test_empty_input() {
        let (warmer, _cache) = warmer();
        assert_eq!(warmer.warm_top(&[], 5, 10), 0);
    }
}
