use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use prom_snapshot::compare::{NamedSnapshot, compare_snapshots};
use prom_snapshot::config::{ConnectionOverrides, ConnectionSettings, Endpoint, FileConfig};
use prom_snapshot::model::{Snapshot, SnapshotMetadata, SnapshotSummary};
use prom_snapshot::platform::{DiscoveryContext, discover_captain_domain, discover_versions};
use prom_snapshot::port_forward::PortForward;
use prom_snapshot::prometheus::PrometheusClient;
use prom_snapshot::report::{write_comparison_report, write_snapshot_table};
use prom_snapshot::store::SnapshotStore;

use crate::Commands;

pub(crate) struct GlobalOptions {
    pub(crate) dir: Option<PathBuf>,
    pub(crate) config: PathBuf,
}

pub(crate) fn handle_command(globals: &GlobalOptions, command: Commands) -> Result<()> {
    let cfg = FileConfig::load(&globals.config)?;
    let store = SnapshotStore::new(cfg.snapshots_dir(globals.dir.clone()))?;

    match command {
        Commands::Snapshot {
            output,
            url,
            namespace,
            service,
            port,
            cluster_path,
            json,
        } => {
            let overrides = ConnectionOverrides {
                url,
                namespace,
                service,
                port,
            };
            take_snapshot(&cfg, &store, &overrides, output, cluster_path, json)
        }
        Commands::List { json } => list_snapshots(&store, json),
        Commands::Compare {
            snapshot_a,
            snapshot_b,
            json,
            verbose,
        } => compare(&store, &snapshot_a, &snapshot_b, json, verbose),
    }
}

fn take_snapshot(
    cfg: &FileConfig,
    store: &SnapshotStore,
    overrides: &ConnectionOverrides,
    output: Option<PathBuf>,
    cluster_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let settings = ConnectionSettings::resolve(overrides, cfg);

    let mut forward = None;
    let base_url = match &settings.endpoint {
        Endpoint::Direct(url) => url.clone(),
        Endpoint::PortForward(target) => {
            tracing::info!(
                "starting port-forward to {}/{}:{}",
                target.namespace,
                target.service,
                target.port
            );
            let pf = PortForward::spawn(&settings.kubectl, target)?;
            let url = pf.local_url();
            forward = Some(pf);
            url
        }
    };

    let client = PrometheusClient::new(&base_url, settings.request_timeout)?;
    if let Some(pf) = forward.as_mut() {
        pf.wait_ready(settings.port_forward_timeout, || client.is_ready())?;
    }

    tracing::info!("fetching metrics from {}", client.base_url());
    let metrics = client.fetch_metric_names()?;
    tracing::info!("found {} metrics", metrics.len());
    drop(forward);

    let ctx = DiscoveryContext::from_env(cluster_path, cfg.workspace_root())?;
    let versions = discover_versions(&ctx);
    let metadata = SnapshotMetadata {
        platform_version: Some(versions.platform_version.clone()),
        argocd_version: Some(versions.argocd_version),
        codespace_version: Some(versions.codespace_version),
        captain_domain: Some(discover_captain_domain(&ctx)),
        prometheus_namespace: Some(settings.namespace.clone()),
        ..Default::default()
    };

    let now = OffsetDateTime::now_utc();
    let timestamp = now.format(&Rfc3339).context("format snapshot timestamp")?;
    let snapshot = Snapshot::new(metrics, metadata, timestamp);

    let path = output.unwrap_or_else(|| store.default_snapshot_path(&versions.platform_version, now));
    store.save(&snapshot, &path)?;

    eprintln!("\n✅ Snapshot saved: {}", path.display());
    eprintln!("   Platform version: {}", snapshot.platform_version());
    eprintln!("   Metrics count: {}", snapshot.metrics.len());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("serialize snapshot json")?
        );
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn list_snapshots(store: &SnapshotStore, json: bool) -> Result<()> {
    let entries = store.list()?;
    if entries.is_empty() {
        eprintln!("No snapshots found");
        if json {
            println!("[]");
        }
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|entry| match store.load(&entry.path) {
            Ok(snap) => SnapshotSummary {
                file: entry.file_name.clone(),
                platform_version: snap.metadata.platform_version,
                metrics_count: snap.metadata.metrics_count,
                timestamp: snap.metadata.timestamp,
                error: None,
            },
            Err(err) => {
                tracing::warn!("{:#}", err);
                SnapshotSummary {
                    file: entry.file_name.clone(),
                    platform_version: None,
                    metrics_count: None,
                    timestamp: None,
                    error: Some(err.root_cause().to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("serialize snapshot list json")?
        );
    } else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_snapshot_table(&mut out, &rows)?;
        out.flush().context("flush stdout")?;
    }
    Ok(())
}

fn compare(
    store: &SnapshotStore,
    reference_a: &str,
    reference_b: &str,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let a = load_named(store, &store.resolve(reference_a)?)?;
    let b = load_named(store, &store.resolve(reference_b)?)?;
    tracing::debug!("comparing {} with {}", a.file, b.file);

    let result = compare_snapshots(&a, &b);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialize comparison json")?
        );
    } else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_comparison_report(&mut out, &result, verbose)?;
        out.flush().context("flush stdout")?;
    }
    Ok(())
}

fn load_named(store: &SnapshotStore, path: &Path) -> Result<NamedSnapshot> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(NamedSnapshot {
        file,
        snapshot: store.load(path)?,
    })
}
