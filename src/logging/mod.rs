//! Diagnostic logging to disk.
//!
//! The terminal is owned by the dashboard, so `tracing` output goes to
//! `<data dir>/finboard.log` instead of stderr. The filter comes from the
//! `FINBOARD_LOG` environment variable, else the configured level.

use crate::config::model::LoggingConfig;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "FINBOARD_LOG";
pub const LOG_FILE: &str = "finboard.log";

/// Pick the filter directive: env override first, then config, then `info`.
fn build_filter(env: Option<&str>, configured: &str) -> EnvFilter {
    env.and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the log path, or `None` when
/// logging is disabled or the file cannot be opened.
pub fn init(config: &LoggingConfig, data_dir: &Path) -> Option<PathBuf> {
    if !config.enabled {
        return None;
    }
    let _ = std::fs::create_dir_all(data_dir);
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.level);
    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    tracing::info!(path = %path.display(), "logging initialized");
    Some(path)
}
