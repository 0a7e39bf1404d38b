//! `pintwin` — terminal console for a Pico W GPIO board.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `pintwin_core`'s [`Twin`](pintwin_core::Twin). A background data bridge
//! task forwards snapshot, connectivity, and diagnostics changes into the
//! TUI action loop; the board stays authoritative for all pin state.
//!
//! Logs are written to a file (never stdout/stderr — that would corrupt
//! the terminal UI).
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod component;
mod components;
mod data_bridge;
mod event;
mod reconcile;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use pintwin_core::Twin;

use crate::app::App;

/// Terminal console for monitoring and driving a Pico W GPIO board.
#[derive(Parser, Debug)]
#[command(name = "pintwin", version, about)]
struct Cli {
    /// Board base URL (e.g., http://192.168.1.50)
    #[arg(short, long, env = "PINTWIN_BOARD")]
    board: Option<Url>,

    /// Config file path (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file path (defaults to the platform state directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Returns a guard that must be held for the
/// lifetime of the application so logs flush on exit.
fn setup_tracing(path: &std::path::Path, verbose: u8) -> Result<WorkerGuard> {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pintwin={log_level},pintwin_core={log_level}"))
    });

    let log_dir = path.parent().unwrap_or(std::path::Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let log_filename = path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("pintwin.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let config = match &cli.config {
        Some(path) => pintwin_config::load_config_from(path)?,
        None => pintwin_config::load_config_or_default(),
    };

    let log_path = cli
        .log_file
        .clone()
        .or_else(|| config.log.file.clone())
        .unwrap_or_else(pintwin_config::default_log_path);
    let _log_guard = setup_tracing(&log_path, cli.verbose)?;

    let twin_config = pintwin_config::to_twin_config(&config, cli.board.as_ref().map(Url::as_str))?;
    info!(board = %twin_config.base_url, "starting pintwin");

    let twin = Twin::new(twin_config).map_err(|e| eyre!("{e}"))?;
    let mut app = App::new(twin);
    app.run().await?;

    Ok(())
}
