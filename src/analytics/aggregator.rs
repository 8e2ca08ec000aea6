//! Anonymizing Aggregator
//!
//! Computes group statistics over raw analytics rows and suppresses any
//! group whose population falls below the disclosure threshold. The
//! suppression rule is a disclosure-control invariant, enforced here at the
//! aggregation boundary rather than left to callers: a suppressed group
//! exposes no aggregate values and never its true sub-threshold population.
//!
//! The function is pure and deterministic over its inputs — no I/O, no
//! clock — so results can be cached under a derived key.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Minimum distinct-subject population for a visible group.
pub const DEFAULT_K_THRESHOLD: usize = 5;

// == Raw Row ==
/// One raw analytics row, as supplied by the platform's query layer.
///
/// `dimensions` hold the grouping fields (course, difficulty, ...);
/// `metrics` hold the numeric observations for this row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Identifier of the learner this row belongs to
    pub subject_id: String,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

// == Metric Spec ==
/// How a named metric is aggregated within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Mean,
    Median,
    Count,
}

/// A requested aggregate: metric name plus aggregation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub kind: MetricKind,
}

// == Group Stat ==
/// Aggregated statistics for one group.
///
/// A suppressed group keeps the same shape as a visible one: the marker is
/// the only difference, the metric map is empty, and `subject_count` is
/// reported as zero so the true sub-threshold population cannot be read
/// off the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    /// Values of the group-by fields identifying this group
    pub group_key: BTreeMap<String, String>,
    /// Distinct subjects in the group; zeroed when suppressed
    pub subject_count: u64,
    /// Aggregate value per requested metric; empty when suppressed
    pub metrics: BTreeMap<String, f64>,
    /// True when the group fell below the disclosure threshold
    pub suppressed: bool,
}

impl GroupStat {
    fn suppressed(group_key: BTreeMap<String, String>) -> Self {
        Self {
            group_key,
            subject_count: 0,
            metrics: BTreeMap::new(),
            suppressed: true,
        }
    }
}

// == Aggregate ==
/// Partitions `rows` by the requested fields and computes per-group
/// aggregates, suppressing groups with fewer than `k_threshold` distinct
/// subjects.
///
/// `subject_count` counts distinct subject identifiers, not rows: a
/// learner contributing many rows still counts once toward the threshold.
/// A row missing a group-by field is bucketed under the empty value rather
/// than dropped, so it cannot silently shift a group across the threshold.
/// Output is ordered by group key, so identical inputs produce identical
/// results.
pub fn aggregate(
    rows: &[RawRow],
    group_by: &[String],
    metrics: &[MetricSpec],
    k_threshold: usize,
) -> Vec<GroupStat> {
    let mut partitions: BTreeMap<BTreeMap<String, String>, Vec<&RawRow>> = BTreeMap::new();

    for row in rows {
        let mut group_key = BTreeMap::new();
        for field in group_by {
            let value = row.dimensions.get(field).cloned().unwrap_or_default();
            group_key.insert(field.clone(), value);
        }
        partitions.entry(group_key).or_default().push(row);
    }

    partitions
        .into_iter()
        .map(|(group_key, members)| {
            let subjects: HashSet<&str> = members
                .iter()
                .map(|row| row.subject_id.as_str())
                .collect();

            if subjects.len() < k_threshold {
                return GroupStat::suppressed(group_key);
            }

            let mut aggregates = BTreeMap::new();
            for spec in metrics {
                if let Some(value) = compute_metric(&members, spec) {
                    aggregates.insert(spec.name.clone(), value);
                }
            }

            GroupStat {
                group_key,
                subject_count: subjects.len() as u64,
                metrics: aggregates,
                suppressed: false,
            }
        })
        .collect()
}

/// Computes one aggregate over the rows of a group.
///
/// Mean and median are undefined over zero observations and yield no
/// entry; a count over zero observations is an honest 0.
fn compute_metric(members: &[&RawRow], spec: &MetricSpec) -> Option<f64> {
    let mut values: Vec<f64> = members
        .iter()
        .filter_map(|row| row.metrics.get(&spec.name).copied())
        .collect();

    match spec.kind {
        MetricKind::Count => Some(values.len() as f64),
        MetricKind::Mean => {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        MetricKind::Median => {
            if values.is_empty() {
                return None;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 1 {
                Some(values[mid])
            } else {
                Some((values[mid - 1] + values[mid]) / 2.0)
            }
        }
    }
}
