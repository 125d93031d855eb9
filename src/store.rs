use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use time::OffsetDateTime;

use crate::model::Snapshot;

pub const LATEST: &str = "latest";
const SNAPSHOT_PATTERNS: &[&str] = &["*.yaml", "*.yml"];

#[derive(Clone, Debug)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: SystemTime,
}

/// A flat directory of snapshot files.
#[derive(Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    patterns: GlobSet,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in SNAPSHOT_PATTERNS {
            builder.add(Glob::new(pattern).with_context(|| format!("compile glob {}", pattern))?);
        }
        let patterns = builder.build().context("build snapshot globset")?;
        Ok(Self {
            dir: dir.into(),
            patterns,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, snapshot: &Snapshot, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(snapshot).context("serialize snapshot")?;
        write_atomic(path, yaml.as_bytes())
            .with_context(|| format!("write snapshot {}", path.display()))
    }

    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        load_snapshot(path)
    }

    /// Snapshot files ordered newest first (by mtime, then by name).
    pub fn list(&self) -> Result<Vec<SnapshotEntry>> {
        if !self.dir.is_dir() {
            return Err(anyhow!(
                "no snapshots directory found at {}",
                self.dir.display()
            ));
        }

        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("read snapshots dir {}", self.dir.display()))?
        {
            let entry = entry.context("read snapshots dir entry")?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.patterns.is_match(&file_name) {
                continue;
            }
            // Follows symlinks, so a linked snapshot sorts by its target's mtime.
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(err) => {
                    tracing::warn!("skipping {}: {}", path.display(), err);
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta
                .modified()
                .with_context(|| format!("read mtime of {}", path.display()))?;
            out.push(SnapshotEntry {
                path,
                file_name,
                modified,
            });
        }

        out.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(out)
    }

    pub fn latest(&self) -> Result<Option<SnapshotEntry>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Resolves `latest` or a snapshot path. A bare name that does not exist
    /// relative to the current directory is also looked up in the store.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        if reference == LATEST {
            let latest = if self.dir.is_dir() { self.latest()? } else { None };
            return latest
                .map(|e| e.path)
                .with_context(|| format!("no snapshots found in {}", self.dir.display()));
        }

        let path = PathBuf::from(reference);
        if path.is_file() {
            return Ok(path);
        }
        let in_store = self.dir.join(reference);
        if in_store.is_file() {
            return Ok(in_store);
        }
        Err(anyhow!("snapshot not found: {}", path.display()))
    }

    pub fn default_snapshot_path(&self, platform_version: &str, now: OffsetDateTime) -> PathBuf {
        self.dir
            .join(default_snapshot_file_name(platform_version, now))
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_yaml::from_str(&content)
        .with_context(|| format!("parse snapshot {}", path.display()))?;
    Ok(snapshot)
}

/// `<version with dots as dashes>_<YYYY-MM-DDTHH-MM-SS>.yaml`, in UTC.
pub fn default_snapshot_file_name(platform_version: &str, now: OffsetDateTime) -> String {
    let now = now.to_offset(time::UtcOffset::UTC);
    format!(
        "{}_{:04}-{:02}-{:02}T{:02}-{:02}-{:02}.yaml",
        platform_version.replace('.', "-"),
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
