use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "unknown";

/// Metadata recorded alongside the metric names of a snapshot.
///
/// Every field is optional on read so that hand-edited or older snapshot files
/// still load; writers fill all of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argocd_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codespace_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captain_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_count: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl Snapshot {
    /// Builds a snapshot from raw metric names. Names are sorted and
    /// de-duplicated, and `metrics_count` is derived from the result.
    pub fn new(mut metrics: Vec<String>, mut metadata: SnapshotMetadata, timestamp: String) -> Self {
        metrics.sort();
        metrics.dedup();
        metadata.timestamp = Some(timestamp);
        metadata.metrics_count = Some(metrics.len() as u64);
        Self { metadata, metrics }
    }

    pub fn platform_version(&self) -> &str {
        self.metadata.platform_version.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn timestamp(&self) -> &str {
        self.metadata.timestamp.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Release versions of the platform components a snapshot was taken on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformVersions {
    pub platform_version: String,
    pub argocd_version: String,
    pub codespace_version: String,
}

impl Default for PlatformVersions {
    fn default() -> Self {
        Self {
            platform_version: UNKNOWN.to_string(),
            argocd_version: UNKNOWN.to_string(),
            codespace_version: UNKNOWN.to_string(),
        }
    }
}

/// One row of `list --json` output.
#[derive(Clone, Debug, Serialize)]
pub struct SnapshotSummary {
    pub file: String,
    pub platform_version: Option<String>,
    pub metrics_count: Option<u64>,
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
