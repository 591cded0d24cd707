use std::time::Duration;
use thiserror::Error;

/// Failures of a single lookup. None of these are fatal to a widget; the next
/// input change starts over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("resolver returned HTTP {0}")]
    Status(u16),

    #[error("no response after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("identifier must be at least {min} characters")]
    TooShort { min: usize },
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ResolveError::Status(status.as_u16());
        }
        ResolveError::Network(err.to_string())
    }
}
