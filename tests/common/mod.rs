use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::oneshot;

/// A minimal Prometheus stand-in serving the metric-name and readiness endpoints.
pub struct FakePrometheus {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for FakePrometheus {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[allow(dead_code)]
pub fn spawn_prometheus(metrics: &[&str]) -> Result<FakePrometheus> {
    spawn_prometheus_with(
        StatusCode::OK,
        serde_json::json!({ "status": "success", "data": metrics }),
    )
}

#[allow(dead_code)]
pub fn spawn_prometheus_with(status: StatusCode, body: serde_json::Value) -> Result<FakePrometheus> {
    let (prom, _hits) = spawn_prometheus_sequence(vec![(status, body)])?;
    Ok(prom)
}

/// Serves `responses` in order from the metric-names endpoint, repeating the
/// last one once exhausted. The counter records how many requests arrived.
#[allow(dead_code)]
pub fn spawn_prometheus_sequence(
    responses: Vec<(StatusCode, serde_json::Value)>,
) -> Result<(FakePrometheus, Arc<AtomicUsize>)> {
    anyhow::ensure!(!responses.is_empty(), "at least one response is required");
    let responses = Arc::new(responses);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new()
        .route("/-/ready", get(|| async { "Prometheus Server is Ready.\n" }))
        .route(
            "/api/v1/label/__name__/values",
            get(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)].clone();
                async move { (status, Json(body)) }
            }),
        );
    Ok((serve(app)?, hits))
}

fn serve(app: Router) -> Result<FakePrometheus> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind fake prometheus")?;
    listener
        .set_nonblocking(true)
        .context("set listener nonblocking")?;
    let addr = listener.local_addr().context("read listener addr")?;
    let (tx, rx) = oneshot::channel::<()>();

    let thread = thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build tokio runtime");
        rt.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("adopt std listener");
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });
    });

    let base_url = format!("http://{}", addr);
    wait_for_ready(&base_url)?;

    Ok(FakePrometheus {
        base_url,
        shutdown: Some(tx),
        thread: Some(thread),
    })
}

fn wait_for_ready(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("fake prometheus did not become ready at {}/-/ready", base_url);
        }
        match client.get(format!("{}/-/ready", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => thread::sleep(Duration::from_millis(20)),
        }
    }
}

/// Runs the CLI from `cwd` with a scrubbed environment.
#[allow(dead_code)]
pub fn run_cli(cwd: &Path, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_prom-snapshot"))
        .args(args)
        .current_dir(cwd)
        .env_remove("CLUSTER")
        .env_remove("PROM_SNAPSHOT_DIR")
        .env_remove("PROM_SNAPSHOT_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .with_context(|| format!("run prom-snapshot {:?}", args))
}

/// Like [`run_cli`], but fails unless the command succeeds; returns stdout.
#[allow(dead_code)]
pub fn run_ok(cwd: &Path, args: &[&str]) -> Result<String> {
    let out = run_cli(cwd, args)?;
    if !out.status.success() {
        anyhow::bail!(
            "prom-snapshot {:?} failed (status {:?})\nstdout:\n{}\nstderr:\n{}",
            args,
            out.status,
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
}
