use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Snapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSide {
    pub file: String,
    pub version: String,
    pub timestamp: String,
    pub total_metrics: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub common_metrics: usize,
    pub unique_to_a: usize,
    pub unique_to_b: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonHeader {
    pub snapshot_a: SnapshotSide,
    pub snapshot_b: SnapshotSide,
    pub summary: ComparisonSummary,
}

/// Difference between the metric-name sets of two snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub comparison: ComparisonHeader,
    pub common_metrics: Vec<String>,
    pub unique_to_snapshot_a: Vec<String>,
    pub unique_to_snapshot_b: Vec<String>,
}

/// A snapshot together with the file name it was read from.
#[derive(Clone, Debug)]
pub struct NamedSnapshot {
    pub file: String,
    pub snapshot: Snapshot,
}

pub fn compare_snapshots(a: &NamedSnapshot, b: &NamedSnapshot) -> Comparison {
    let set_a: BTreeSet<&str> = a.snapshot.metrics.iter().map(String::as_str).collect();
    let set_b: BTreeSet<&str> = b.snapshot.metrics.iter().map(String::as_str).collect();

    let common: Vec<String> = set_a.intersection(&set_b).map(|s| s.to_string()).collect();
    let only_a: Vec<String> = set_a.difference(&set_b).map(|s| s.to_string()).collect();
    let only_b: Vec<String> = set_b.difference(&set_a).map(|s| s.to_string()).collect();

    let side = |named: &NamedSnapshot, total: usize| SnapshotSide {
        file: named.file.clone(),
        version: named.snapshot.platform_version().to_string(),
        timestamp: named.snapshot.timestamp().to_string(),
        total_metrics: total,
    };

    Comparison {
        comparison: ComparisonHeader {
            snapshot_a: side(a, set_a.len()),
            snapshot_b: side(b, set_b.len()),
            summary: ComparisonSummary {
                common_metrics: common.len(),
                unique_to_a: only_a.len(),
                unique_to_b: only_b.len(),
            },
        },
        common_metrics: common,
        unique_to_snapshot_a: only_a,
        unique_to_snapshot_b: only_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotMetadata;

    fn named(file: &str, version: Option<&str>, metrics: &[&str]) -> NamedSnapshot {
        NamedSnapshot {
            file: file.to_string(),
            snapshot: Snapshot {
                metadata: SnapshotMetadata {
                    platform_version: version.map(str::to_string),
                    timestamp: Some("2026-10-18T09:12:44Z".to_string()),
                    ..Default::default()
                },
                metrics: metrics.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    #[test]
    fn splits_common_and_unique() {
        let a = named("a.yaml", Some("v0.64.0"), &["up", "old_metric", "kube_pod_info"]);
        let b = named("b.yaml", Some("v0.65.0"), &["kube_pod_info", "new_metric", "up"]);
        let cmp = compare_snapshots(&a, &b);

        assert_eq!(cmp.common_metrics, vec!["kube_pod_info", "up"]);
        assert_eq!(cmp.unique_to_snapshot_a, vec!["old_metric"]);
        assert_eq!(cmp.unique_to_snapshot_b, vec!["new_metric"]);
        assert_eq!(
            cmp.comparison.summary,
            ComparisonSummary {
                common_metrics: 2,
                unique_to_a: 1,
                unique_to_b: 1,
            }
        );
        assert_eq!(cmp.comparison.snapshot_a.version, "v0.64.0");
        assert_eq!(cmp.comparison.snapshot_b.file, "b.yaml");
    }

    #[test]
    fn self_comparison_has_no_unique_metrics() {
        let a = named("a.yaml", None, &["b", "a", "a"]);
        let cmp = compare_snapshots(&a, &a);
        assert!(cmp.unique_to_snapshot_a.is_empty());
        assert!(cmp.unique_to_snapshot_b.is_empty());
        assert_eq!(cmp.comparison.snapshot_a.total_metrics, 2);
        assert_eq!(cmp.comparison.snapshot_a.version, "unknown");
    }

    #[test]
    fn json_shape_matches_report_contract() {
        let a = named("a.yaml", Some("v1"), &["x"]);
        let b = named("b.yaml", Some("v2"), &["y"]);
        let value = serde_json::to_value(compare_snapshots(&a, &b)).expect("to json");

        assert_eq!(value["comparison"]["snapshot_a"]["file"], "a.yaml");
        assert_eq!(value["comparison"]["snapshot_b"]["total_metrics"], 1);
        assert_eq!(value["comparison"]["summary"]["unique_to_b"], 1);
        assert_eq!(value["common_metrics"], serde_json::json!([]));
        assert_eq!(value["unique_to_snapshot_a"], serde_json::json!(["x"]));
        assert_eq!(value["unique_to_snapshot_b"], serde_json::json!(["y"]));
    }
}
