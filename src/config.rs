use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_SNAPSHOTS_DIR: &str = "snapshots";
pub const DEFAULT_WORKSPACE_ROOT: &str = "/workspaces/glueops";
pub const DEFAULT_PROM_NAMESPACE: &str = "glueops-core-kube-prometheus-stack";
pub const DEFAULT_PROM_SERVICE: &str = "prometheus-operated";
pub const DEFAULT_PROM_PORT: u16 = 9090;
pub const DEFAULT_KUBECTL: &str = "kubectl";
pub const DEFAULT_PORT_FORWARD_TIMEOUT_SECS: u64 = 25;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Optional settings read from the YAML config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub prometheus_namespace: Option<String>,
    pub prometheus_service: Option<String>,
    pub prometheus_port: Option<u16>,
    pub prometheus_url: Option<String>,
    pub snapshots_dir: Option<PathBuf>,
    pub workspace_root: Option<PathBuf>,
    pub kubectl: Option<String>,
    pub port_forward_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Loads the config file. A missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: FileConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn snapshots_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.snapshots_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOTS_DIR))
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_ROOT))
    }
}

/// Connection flags given on the command line; each one overrides the config file.
#[derive(Clone, Debug, Default)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub namespace: Option<String>,
    pub service: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceTarget {
    pub namespace: String,
    pub service: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Talk to Prometheus at this base URL (no trailing slash).
    Direct(String),
    /// Reach Prometheus through `kubectl port-forward`.
    PortForward(ServiceTarget),
}

#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    pub endpoint: Endpoint,
    /// Namespace recorded in snapshot metadata, even when a direct URL is used.
    pub namespace: String,
    pub kubectl: String,
    pub port_forward_timeout: Duration,
    pub request_timeout: Duration,
}

impl ConnectionSettings {
    pub fn resolve(overrides: &ConnectionOverrides, cfg: &FileConfig) -> Self {
        let namespace = overrides
            .namespace
            .clone()
            .or_else(|| cfg.prometheus_namespace.clone())
            .unwrap_or_else(|| DEFAULT_PROM_NAMESPACE.to_string());
        let service = overrides
            .service
            .clone()
            .or_else(|| cfg.prometheus_service.clone())
            .unwrap_or_else(|| DEFAULT_PROM_SERVICE.to_string());
        let port = overrides
            .port
            .or(cfg.prometheus_port)
            .unwrap_or(DEFAULT_PROM_PORT);

        let endpoint = match overrides.url.as_ref().or(cfg.prometheus_url.as_ref()) {
            Some(url) => Endpoint::Direct(url.trim_end_matches('/').to_string()),
            None => Endpoint::PortForward(ServiceTarget {
                namespace: namespace.clone(),
                service,
                port,
            }),
        };

        Self {
            endpoint,
            namespace,
            kubectl: cfg
                .kubectl
                .clone()
                .unwrap_or_else(|| DEFAULT_KUBECTL.to_string()),
            port_forward_timeout: Duration::from_secs(
                cfg.port_forward_timeout_secs
                    .unwrap_or(DEFAULT_PORT_FORWARD_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                cfg.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
