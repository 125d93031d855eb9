use std::process::Command;

use anyhow::{Context, Result};

fn run_prom_snapshot(args: &[&str]) -> Result<String> {
    let out = Command::new(env!("CARGO_BIN_EXE_prom-snapshot"))
        .args(args)
        .output()
        .with_context(|| format!("run prom-snapshot {:?}", args))?;

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

#[test]
fn cli_help_surface_is_stable() -> Result<()> {
    let help = run_prom_snapshot(&["--help"])?;
    assert!(help.contains("Usage: prom-snapshot"));
    assert!(help.contains("snapshot"));
    assert!(help.contains("list"));
    assert!(help.contains("compare"));
    assert!(help.contains("--dir"));
    assert!(help.contains("prom-snapshot compare latest"));

    let snap_help = run_prom_snapshot(&["snapshot", "--help"])?;
    for flag in ["--output", "--url", "--namespace", "--service", "--port", "--cluster-path", "--json"] {
        assert!(snap_help.contains(flag), "snapshot help missing {flag}");
    }

    let compare_help = run_prom_snapshot(&["compare", "--help"])?;
    assert!(compare_help.contains("Usage: prom-snapshot compare [OPTIONS] <SNAPSHOT_A> <SNAPSHOT_B>"));
    assert!(compare_help.contains("--verbose"));

    Ok(())
}
