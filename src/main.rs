mod app;
mod commands;
mod config;
mod dashboard;
mod error;
mod input;
mod keys;
mod link;
mod mappings;
mod refresh;
mod streams;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "streamshower",
    version,
    about = "Keyboard-driven dashboard for live streams"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Stream snapshot to display (default: from config, then the cache dir)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in $EDITOR (default: nvim)
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config) = cli.command {
        return config::open_config_in_editor();
    }

    setup_tracing(cli.verbose);
    let cfg = config::load_config()?;
    let snapshot = cfg.snapshot_path(cli.snapshot)?;
    info!(snapshot = %snapshot.display(), "starting streamshower");
    app::run_app(snapshot, cfg)
}

/// Logs to a file in the cache dir; the terminal belongs to the dashboard.
fn setup_tracing(verbose: bool) {
    use std::fs::OpenOptions;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let Some(log_dir) = dirs::cache_dir().map(|dir| dir.join("streamshower")) else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("streamshower.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("STREAMSHOWER_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("streamshower=debug")
        } else {
            EnvFilter::new("streamshower=info")
        }
    });
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}
