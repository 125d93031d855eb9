use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use prom_snapshot::config::DEFAULT_CONFIG_FILE;

mod cli_exec;

const EXAMPLES: &str = "\
Examples:
  # Take a snapshot
  prom-snapshot snapshot

  # Take a snapshot with custom output
  prom-snapshot snapshot -o my-snapshot.yaml

  # Compare two snapshots
  prom-snapshot compare snapshots/v0.64.0.yaml snapshots/v0.65.0.yaml

  # Compare latest snapshot with another
  prom-snapshot compare latest snapshots/v0.64.0.yaml

  # List all snapshots
  prom-snapshot list";

#[derive(Parser)]
#[command(name = "prom-snapshot")]
#[command(about = "Capture and compare Prometheus metric snapshots", long_about = None)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Snapshot directory
    #[arg(long, global = true, env = "PROM_SNAPSHOT_DIR", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file (YAML)
    #[arg(
        long,
        global = true,
        env = "PROM_SNAPSHOT_CONFIG",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a metrics snapshot
    Snapshot {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Prometheus URL (skip port-forward)
        #[arg(short = 'u', long)]
        url: Option<String>,
        /// Prometheus namespace
        #[arg(short = 'n', long)]
        namespace: Option<String>,
        /// Prometheus service name
        #[arg(short = 's', long)]
        service: Option<String>,
        /// Prometheus port
        #[arg(short = 'p', long)]
        port: Option<u16>,
        /// Path to cluster directory (for version info)
        #[arg(long)]
        cluster_path: Option<PathBuf>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List available snapshots
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two snapshots
    Compare {
        /// First snapshot file (or 'latest')
        snapshot_a: String,
        /// Second snapshot file (or 'latest')
        snapshot_b: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
        /// Show all metrics
        #[arg(short = 'v', long)]
        verbose: bool,
    },
}

fn main() {
    prom_snapshot::logging::init();
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let globals = cli_exec::GlobalOptions {
        dir: cli.dir,
        config: cli.config,
    };
    cli_exec::handle_command(&globals, cli.command)
}
