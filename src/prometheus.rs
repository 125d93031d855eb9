use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const METRIC_NAMES_PATH: &str = "/api/v1/label/__name__/values";
const READY_PATH: &str = "/-/ready";
/// Upper bound for a single readiness check, independent of the request timeout.
const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

fn with_retries<T>(label: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
    const ATTEMPTS: usize = 3;
    let mut last: Option<anyhow::Error> = None;
    for i in 0..ATTEMPTS {
        match f() {
            Ok(v) => return Ok(v),
            Err(err) => {
                if i + 1 < ATTEMPTS {
                    tracing::warn!(attempt = i + 1, "{}: {:#}; retrying", label, err);
                    std::thread::sleep(Duration::from_millis(200 * (1 << i)));
                }
                last = Some(err);
            }
        }
    }
    Err(last
        .unwrap_or_else(|| anyhow::anyhow!("unknown error"))
        .context(label.to_string()))
}

/// Body of a Prometheus label-values response.
#[derive(Debug, Deserialize)]
struct LabelValuesResponse {
    status: String,
    #[serde(default)]
    data: Vec<String>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct PrometheusClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("prom-snapshot")
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetches every metric name Prometheus knows about, sorted and unique.
    pub fn fetch_metric_names(&self) -> Result<Vec<String>> {
        let body: LabelValuesResponse = with_retries("fetch metric names", || {
            let resp = self
                .client
                .get(self.url(METRIC_NAMES_PATH))
                .send()
                .with_context(|| format!("GET {}", self.url(METRIC_NAMES_PATH)))?;
            let status = resp.status();
            if status.is_server_error() {
                anyhow::bail!("Prometheus returned {}", status);
            }
            // Prometheus reports API errors as JSON bodies on 4xx responses.
            let text = resp.text().context("read metric names response")?;
            match serde_json::from_str::<LabelValuesResponse>(&text) {
                Ok(body) => Ok(body),
                Err(_) if !status.is_success() => anyhow::bail!("Prometheus returned {}", status),
                Err(err) => Err(err).context("parse metric names response"),
            }
        })?;

        if body.status != "success" {
            anyhow::bail!(
                "Prometheus API error (status={}, errorType={}): {}",
                body.status,
                body.error_type.as_deref().unwrap_or("-"),
                body.error.as_deref().unwrap_or("no error message")
            );
        }

        let mut names = body.data;
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Whether Prometheus answers its readiness endpoint.
    pub fn is_ready(&self) -> bool {
        match self
            .client
            .get(self.url(READY_PATH))
            .timeout(READY_CHECK_TIMEOUT)
            .send()
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!("readiness check failed: {}", err);
                false
            }
        }
    }
}
