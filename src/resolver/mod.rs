pub mod http;
pub mod identifier;

use crate::error::ResolveError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Longest raw body shown when a response can't be interpreted.
const MAX_RAW_DISPLAY: usize = 2048;

/// A lookup against a resolution service. Returns the raw response body;
/// interpretation is left to [`Resolution::from_body`].
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<String, ResolveError>;
}

/// The interpreted outcome of a completed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// First element of the response array.
    Record {
        record: Value,
        target: Option<String>,
    },
    /// The service answered with an empty array.
    Empty,
    /// The body wasn't a JSON array.
    Malformed { reason: String, raw: String },
}

impl Resolution {
    pub fn from_body(body: &str) -> Self {
        let parsed: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                return Resolution::Malformed {
                    reason: e.to_string(),
                    raw: body.to_string(),
                }
            }
        };

        let Value::Array(mut records) = parsed else {
            return Resolution::Malformed {
                reason: "expected a JSON array".to_string(),
                raw: body.to_string(),
            };
        };

        if records.is_empty() {
            return Resolution::Empty;
        }

        let record = records.swap_remove(0);
        let target = record
            .get("target")
            .and_then(Value::as_str)
            .filter(|t| reqwest::Url::parse(t).is_ok())
            .map(str::to_string);

        Resolution::Record { record, target }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Resolution::Record { target, .. } => target.as_deref(),
            _ => None,
        }
    }

    /// Text for the output area: the record pretty-printed with two-space
    /// indentation, or a notice when there is no record.
    pub fn display_text(&self, identifier: &str) -> String {
        match self {
            Resolution::Record { record, .. } => {
                serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string())
            }
            Resolution::Empty => format!("No result for {}", identifier),
            Resolution::Malformed { reason, raw } => {
                let mut shown: String = raw.chars().take(MAX_RAW_DISPLAY).collect();
                if shown.len() < raw.len() {
                    shown.push_str("...");
                }
                format!("Malformed response: {}\n\n{}", reason, shown)
            }
        }
    }

    pub fn info(&self) -> Option<IdentifierInfo> {
        match self {
            Resolution::Record { record, .. } => serde_json::from_value(record.clone()).ok(),
            _ => None,
        }
    }
}

/// Well-known fields of an IGSN resolver record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IdentifierInfo {
    pub original: Option<String>,
    pub normalized: Option<String>,
    pub handle: Option<String>,
    pub target: Option<String>,
    pub ttl: Option<i64>,
    pub timestamp: Option<String>,
}

impl IdentifierInfo {
    /// One-line summary, empty when the record carries none of the known fields.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref handle) = self.handle {
            parts.push(format!("handle {}", handle));
        }
        if let Some(ttl) = self.ttl {
            parts.push(format!("ttl {}s", ttl));
        }
        if let Some(ref timestamp) = self.timestamp {
            parts.push(timestamp.clone());
        }
        parts.join(" | ")
    }
}
