//! Discovery of the platform release a snapshot is taken on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_yaml::Value;

use crate::model::{PlatformVersions, UNKNOWN};

const VERSIONS_FILE: &str = "VERSIONS/glueops.yaml";
const SAVED_VARIABLES_FILE: &str = "saved_variables";

const PLATFORM_KEY: &str = "glueops_platform_helm_chart_version";
const ARGOCD_KEY: &str = "argocd_app_version";
const CODESPACE_KEY: &str = "codespace_version";

/// Where to look for version and cluster information.
#[derive(Clone, Debug)]
pub struct DiscoveryContext {
    pub cluster_path: Option<PathBuf>,
    pub workspace_root: PathBuf,
    pub cwd: PathBuf,
    /// Value of the `CLUSTER` environment variable.
    pub cluster_env: Option<String>,
}

impl DiscoveryContext {
    pub fn from_env(cluster_path: Option<PathBuf>, workspace_root: PathBuf) -> Result<Self> {
        Ok(Self {
            cluster_path,
            workspace_root,
            cwd: std::env::current_dir().context("get current dir")?,
            cluster_env: std::env::var("CLUSTER").ok(),
        })
    }

    fn candidate_version_files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(cluster_path) = &self.cluster_path {
            out.push(cluster_path.join(VERSIONS_FILE));
        }
        out.push(
            self.workspace_root
                .join(self.cluster_env.as_deref().unwrap_or(""))
                .join(VERSIONS_FILE),
        );
        out.push(self.cwd.join(VERSIONS_FILE));

        if let Ok(entries) = fs::read_dir(&self.workspace_root) {
            let mut found = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path().join(VERSIONS_FILE))
                .filter(|p| p.is_file())
                .collect::<Vec<_>>();
            found.sort();
            out.extend(found);
        }
        out
    }
}

/// Finds the first readable versions file and extracts component versions.
/// Unreadable files are logged and skipped.
pub fn discover_versions(ctx: &DiscoveryContext) -> PlatformVersions {
    for path in ctx.candidate_version_files() {
        if !path.is_file() {
            continue;
        }
        match read_versions_file(&path) {
            Ok(versions) => {
                tracing::debug!(path = %path.display(), "read platform versions");
                return versions;
            }
            Err(err) => {
                tracing::warn!("could not read {}: {:#}", path.display(), err);
            }
        }
    }
    PlatformVersions::default()
}

pub fn read_versions_file(path: &Path) -> Result<PlatformVersions> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let doc: Value =
        serde_yaml::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    parse_versions(&doc)
}

fn parse_versions(doc: &Value) -> Result<PlatformVersions> {
    let map = doc
        .as_mapping()
        .context("versions file is not a mapping")?;
    let mut versions = PlatformVersions::default();

    if let Some(list) = map.get("versions") {
        let items = list.as_sequence().context("`versions` is not a list")?;
        for item in items {
            let name = item.get("name").and_then(scalar_to_string).unwrap_or_default();
            let version = item
                .get("version")
                .and_then(scalar_to_string)
                .unwrap_or_else(|| UNKNOWN.to_string());
            match name.as_str() {
                PLATFORM_KEY => versions.platform_version = version,
                ARGOCD_KEY => versions.argocd_version = version,
                CODESPACE_KEY => versions.codespace_version = version,
                _ => {}
            }
        }
    } else {
        let get = |key: &str| {
            map.get(key)
                .and_then(scalar_to_string)
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        versions.platform_version = get(PLATFORM_KEY);
        versions.argocd_version = get(ARGOCD_KEY);
        versions.codespace_version = get(CODESPACE_KEY);
    }
    Ok(versions)
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The cluster identifier: `CLUSTER` from the environment, else from the
/// workspace's `saved_variables` file.
pub fn discover_captain_domain(ctx: &DiscoveryContext) -> String {
    if let Some(cluster) = &ctx.cluster_env {
        return cluster.clone();
    }

    let saved = ctx.workspace_root.join(SAVED_VARIABLES_FILE);
    match fs::read_to_string(&saved) {
        Ok(content) => content
            .lines()
            .find_map(|line| line.strip_prefix("CLUSTER="))
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        Err(_) => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
