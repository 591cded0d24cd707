use crate::config::FollowMode;
use anyhow::{Context, Result};

/// Opens resolved targets on behalf of a widget.
pub trait Navigator: Send + Sync {
    fn open(&self, url: &str, mode: FollowMode) -> Result<()>;
}

/// Hands URLs to the system's default browser.
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open(&self, url: &str, mode: FollowMode) -> Result<()> {
        tracing::info!(url, ?mode, "following target");
        match mode {
            FollowMode::NewTab => {
                open::that_detached(url).with_context(|| format!("failed to open {}", url))
            }
            // The launcher is waited for so an already running browser takes the
            // URL into its current window.
            FollowMode::SameTab => {
                let url = url.to_string();
                launch_waiting(move || open::that(&url).map_err(|e| (url, e)));
                Ok(())
            }
        }
    }
}

/// Runs a launcher that blocks until it exits. Inside a tokio runtime it goes
/// to the blocking pool so the event loop keeps drawing; failures are logged.
fn launch_waiting<F>(launch: F)
where
    F: FnOnce() -> std::result::Result<(), (String, std::io::Error)> + Send + 'static,
{
    let report = |result: std::result::Result<(), (String, std::io::Error)>| {
        if let Err((url, e)) = result {
            tracing::error!(url, error = %e, "failed to open target");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(move || report(launch()));
        }
        Err(_) => report(launch()),
    }
}
