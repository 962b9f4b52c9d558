//! XFPanel - eXtreme Feedback Panel host
//!
//! The `xfpanel` command runs the panel engine against a JSON snapshot of a
//! CI server and prints the ordered entries.
//!
//! ## Commands
//!
//! - `sort`: Run a single refresh cycle
//! - `watch`: Re-read the snapshot and re-sort every refresh interval
//! - `check-config`: Validate a panel configuration and show its layout

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

use xfpanel_core::{Entry, Panel, PanelConfig, ServerSnapshot, StaticCiServer};

#[derive(Parser)]
#[command(name = "xfpanel")]
#[command(author = "XFPanel Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "eXtreme Feedback Panel for CI build status", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort the jobs of a snapshot once and print the entries
    Sort {
        /// CI server snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Panel configuration (JSON); stock settings when omitted
        #[arg(short, long, env = "XFPANEL_CONFIG")]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Re-read the snapshot and re-sort every `refresh` seconds
    Watch {
        /// CI server snapshot (JSON), re-read on every cycle
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Panel configuration (JSON); stock settings when omitted
        #[arg(short, long, env = "XFPANEL_CONFIG")]
        config: Option<PathBuf>,

        /// Stop after this many cycles (default: run until interrupted)
        #[arg(long)]
        cycles: Option<u32>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    xfpanel_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Sort {
            snapshot,
            config,
            format,
        } => cmd_sort(&snapshot, config.as_deref(), format),
        Commands::Watch {
            snapshot,
            config,
            cycles,
            format,
        } => cmd_watch(&snapshot, config.as_deref(), cycles, format).await,
        Commands::CheckConfig { config } => cmd_check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PanelConfig> {
    match path {
        Some(path) => PanelConfig::from_file(path)
            .with_context(|| format!("Invalid panel configuration {:?}", path)),
        None => Ok(PanelConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<ServerSnapshot> {
    ServerSnapshot::from_file(path).with_context(|| format!("Failed to load snapshot {:?}", path))
}

fn cmd_sort(snapshot_path: &Path, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshot = load_snapshot(snapshot_path)?;
    let panel = Panel::new(config, Arc::new(snapshot.server()));

    let entries = panel.sort(&snapshot.jobs);
    println!("{}", render(&entries, format)?);
    Ok(())
}

async fn cmd_watch(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    cycles: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let refresh = Duration::from_secs(u64::from(config.refresh));
    let mut snapshot = load_snapshot(snapshot_path)?;
    let server = Arc::new(snapshot.server());
    let panel = Panel::new(config, server.clone());

    info!(event = "watch.started", refresh_secs = refresh.as_secs(), cycles = ?cycles);

    let mut interval = tokio::time::interval(refresh);
    let mut completed = 0u32;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!(event = "watch.interrupted", completed);
                return Ok(());
            }
        }

        // Keep the last good snapshot when the file is mid-write or broken.
        match load_snapshot(snapshot_path) {
            Ok(fresh) => {
                fresh.apply_to(&server);
                snapshot = fresh;
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(event = "watch.snapshot_stale", error = %error);
            }
        }

        let entries = panel.sort(&snapshot.jobs);
        if format == OutputFormat::Table {
            println!("== {} ==", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("{}", render(&entries, format)?);

        completed += 1;
        if cycles.is_some_and(|limit| completed >= limit) {
            info!(event = "watch.finished", completed);
            return Ok(());
        }
    }
}

fn cmd_check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    let panel = Panel::new(config, Arc::new(StaticCiServer::new()));

    println!("{}", serde_json::to_string_pretty(&panel.config())?);
    println!("Entry height: {}px", panel.entry_height());
    Ok(())
}

fn render(entries: &[Entry<'_>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        OutputFormat::Table => Ok(render_entries_text(entries)),
    }
}

fn render_entries_text(entries: &[Entry<'_>]) -> String {
    if entries.is_empty() {
        return "No jobs".to_string();
    }

    let mut out = format!(
        "{:<3} {:<32} {:<10} {:>6} {:>6} {:<14} {}\n",
        "Q", "JOB", "STATUS", "FAIL", "DIFF", "AGE", "RESPONSIBLE"
    );
    for entry in entries {
        let marker = match (entry.broken, entry.building) {
            (true, true) => "!*",
            (true, false) => "!",
            (false, true) => "*",
            (false, false) => "",
        };
        let queue = entry
            .queue_number
            .map(|n| n.to_string())
            .unwrap_or_default();
        let who = if !entry.claim_info.is_empty() {
            entry.claim_info.as_str()
        } else if entry.show_responsibles {
            entry.responsibles.trim()
        } else {
            ""
        };
        out.push_str(&format!(
            "{:<3} {:<32} {:<10} {:>6} {:>6} {:<14} {}\n",
            queue,
            format!("{}{}", entry.label, marker),
            entry.build_status,
            entry.number_of_tests,
            entry.diff,
            entry.completion_timestamp_string,
            who
        ));
    }
    out.trim_end().to_string()
}
