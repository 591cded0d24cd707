use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `~/.local/state/idresolve` on Linux, the local data dir elsewhere.
pub fn log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("idresolve"))
}

/// Initialize structured logging to `<state dir>/idresolve/idresolve.log`.
///
/// The dashboard owns the terminal, so nothing is written to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let log_dir = log_dir().context("no state directory for this platform")?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_file_path = log_dir.join("idresolve.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("failed to open {}", log_file_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,idresolve=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    tracing::info!("idresolve logging initialized at {}", log_file_path.display());

    Ok(log_file_path)
}
