//! codexpopclip - clipboard action popup
//!
//! Watches the clipboard and the primary selection and, whenever either
//! changes, pops up a small menu of text actions next to the mouse pointer:
//! case transforms, whitespace cleanup, or any command you configure.

mod app;
mod config;
mod event;
mod menu;
mod models;
mod screens;
mod services;
#[cfg(test)]
mod testing;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{EffectiveSettings, SettingsFile};
use services::{ArboardClipboard, ClipboardSource};
use utils::expand_path;

/// codexpopclip - act on whatever you just copied or selected
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Settings file (default: ~/.config/codexpopclip/settings.json or .toml)
    #[arg(short, long)]
    config: Option<String>,

    /// External actions file (default: ~/.config/codexpopclip/actions.json or .toml)
    #[arg(short, long)]
    actions: Option<String>,

    /// Write logs here instead of the default log file
    #[arg(long)]
    log_file: Option<String>,
}

/// Where logs go when `--log-file` is not given and stderr is the TUI's terminal.
fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("codexpopclip")
        .join("codexpopclip.log")
}

fn log_writer(log_file: Option<&str>) -> Result<BoxMakeWriter> {
    let path = match log_file {
        Some(path) => PathBuf::from(expand_path(path)),
        None if !std::io::stderr().is_terminal() => return Ok(BoxMakeWriter::new(std::io::stderr)),
        None => default_log_path(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

fn init_logging(args: &Args, settings: &EffectiveSettings) -> Result<()> {
    let filter = if args.debug {
        "codexpopclip=debug,warn".to_string()
    } else {
        settings.log_level.filter_directive()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_writer(args.log_file.as_deref())?)
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn log_diagnostics(settings: &EffectiveSettings, settings_path: Option<&Path>) {
    match settings_path {
        Some(path) => info!(path = %path.display(), "settings file"),
        None => info!("no settings file; using defaults"),
    }
    info!(
        poll = settings.poll_enabled,
        poll_ms = settings.poll_interval_ms,
        wlpaste = settings.fallback_reader_enabled,
        wlpaste_mode = ?settings.fallback_reader_mode,
        actions_per_page = settings.actions_per_page,
        log_level = ?settings.log_level,
        trace = settings.trace,
        "effective settings"
    );
    info!(supported = ArboardClipboard::supports_selection(), "primary selection");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Settings are read before logging exists, so a bad file is reported after init.
    let loaded = match &args.config {
        Some(path) => {
            let path = PathBuf::from(expand_path(path));
            SettingsFile::from_file(&path).map(|file| Some((file, path)))
        }
        None => SettingsFile::load(),
    };
    let (file, settings_path, settings_error) = match loaded {
        Ok(Some((file, path))) => (file, Some(path), None),
        Ok(None) => (SettingsFile::default(), None, None),
        Err(e) => (SettingsFile::default(), None, Some(e)),
    };
    let settings = EffectiveSettings::from_env(&file);

    init_logging(&args, &settings)?;
    if let Some(e) = settings_error {
        warn!(error = %e, "settings file ignored");
    }
    log_diagnostics(&settings, settings_path.as_deref());

    let actions = match &args.actions {
        Some(path) => config::load_actions_from(Path::new(&expand_path(path))),
        None => config::load_actions(),
    }
    .unwrap_or_else(|e| {
        warn!(error = %e, "external actions ignored");
        Vec::new()
    });
    info!(count = actions.len(), "external actions");

    let clipboard: Arc<dyn ClipboardSource> =
        Arc::new(ArboardClipboard::new().context("failed to open the clipboard")?);

    // Run the TUI application
    let mut app = app::App::new(
        settings,
        clipboard,
        actions,
        ArboardClipboard::supports_selection(),
    );
    app.run().await
}
