//! Human-readable rendering of comparisons and snapshot listings.

use std::io::Write;

use anyhow::Result;

use crate::compare::{Comparison, SnapshotSide};
use crate::model::SnapshotSummary;

/// Unique-metric lists longer than this are only printed in verbose mode.
pub const VERBOSE_THRESHOLD: usize = 50;

const WIDE: usize = 60;
const TABLE_WIDTH: usize = 90;

pub fn write_comparison_report(
    out: &mut impl Write,
    result: &Comparison,
    verbose: bool,
) -> Result<()> {
    let comp = &result.comparison;
    let banner = "=".repeat(WIDE);
    let rule = "-".repeat(WIDE);

    writeln!(out, "\n{}", banner)?;
    writeln!(out, "PROMETHEUS METRICS COMPARISON REPORT")?;
    writeln!(out, "{}", banner)?;

    write_side(out, "A", &comp.snapshot_a)?;
    write_side(out, "B", &comp.snapshot_b)?;

    writeln!(out, "\n{}", rule)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", rule)?;
    let summary = &comp.summary;
    writeln!(out, "✅ Common metrics:        {}", summary.common_metrics)?;
    writeln!(out, "🔵 Unique to Snapshot A:  {}", summary.unique_to_a)?;
    writeln!(out, "🟢 Unique to Snapshot B:  {}", summary.unique_to_b)?;

    write_unique(
        out,
        "🔵 METRICS UNIQUE TO SNAPSHOT A (missing in B)",
        '-',
        &result.unique_to_snapshot_a,
        verbose,
    )?;
    write_unique(
        out,
        "🟢 METRICS UNIQUE TO SNAPSHOT B (missing in A)",
        '+',
        &result.unique_to_snapshot_b,
        verbose,
    )?;

    writeln!(out, "\n{}", banner)?;
    Ok(())
}

fn write_side(out: &mut impl Write, label: &str, side: &SnapshotSide) -> Result<()> {
    writeln!(out, "\n📊 Snapshot {}: {}", label, side.file)?;
    writeln!(out, "   Version: {}", side.version)?;
    writeln!(out, "   Date: {}", side.timestamp)?;
    writeln!(out, "   Total metrics: {}", side.total_metrics)?;
    Ok(())
}

fn write_unique(
    out: &mut impl Write,
    title: &str,
    marker: char,
    metrics: &[String],
    verbose: bool,
) -> Result<()> {
    if metrics.is_empty() {
        return Ok(());
    }
    if !verbose && metrics.len() > VERBOSE_THRESHOLD {
        writeln!(
            out,
            "\n({} metrics not shown for \"{}\"; rerun with -v to list them)",
            metrics.len(),
            title
        )?;
        return Ok(());
    }

    let rule = "-".repeat(WIDE);
    writeln!(out, "\n{}", rule)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", rule)?;
    for metric in metrics {
        writeln!(out, "  {} {}", marker, metric)?;
    }
    Ok(())
}

pub fn write_snapshot_table(out: &mut impl Write, rows: &[SnapshotSummary]) -> Result<()> {
    writeln!(
        out,
        "\n{:<45} {:<15} {:<10} {}",
        "Snapshot File", "Version", "Metrics", "Date"
    )?;
    writeln!(out, "{}", "-".repeat(TABLE_WIDTH))?;

    for row in rows {
        match &row.error {
            Some(err) => writeln!(
                out,
                "{:<45} {:<15} {:<10} {}",
                row.file,
                "ERROR",
                "-",
                truncate(err, 20)
            )?,
            None => {
                let count = row
                    .metrics_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string());
                writeln!(
                    out,
                    "{:<45} {:<15} {:<10} {}",
                    row.file,
                    row.platform_version.as_deref().unwrap_or("?"),
                    count,
                    truncate(row.timestamp.as_deref().unwrap_or("?"), 19)
                )?
            }
        }
    }

    writeln!(out)?;
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
