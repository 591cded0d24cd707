use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVICE_BASE_URL: &str = "https://igsn-resolver.vercel.app/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<ResolverConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_resolver_title")]
    pub title: String,
    #[serde(default = "default_service_base_url")]
    pub service_base_url: String,
    #[serde(default)]
    pub follow_mode: FollowMode,
    #[serde(default)]
    pub normalize: Normalize,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// How `follow` hands the target to the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowMode {
    #[default]
    NewTab,
    SameTab,
}

/// Rewriting applied to the typed identifier before lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalize {
    #[default]
    None,
    Igsn,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_resolver_title() -> String {
    "Identifier".to_string()
}

fn default_service_base_url() -> String {
    DEFAULT_SERVICE_BASE_URL.to_string()
}

fn default_resolvers() -> Vec<ResolverConfig> {
    vec![ResolverConfig {
        title: "IGSN".to_string(),
        service_base_url: default_service_base_url(),
        follow_mode: FollowMode::NewTab,
        normalize: Normalize::None,
        position: Position { row: 0, col: 0 },
    }]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            resolvers: default_resolvers(),
        }
    }
}

impl GeneralConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// `~/.config/idresolve/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("idresolve").join("config.toml"))
    }

    /// Loads `path`, falling back to the built-in defaults when it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            resolvers = config.resolvers.len(),
            "config loaded"
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.resolvers.is_empty() {
            anyhow::bail!("at least one [[resolvers]] entry is required");
        }
        let mut taken = HashSet::new();
        for resolver in &self.resolvers {
            let position = (resolver.position.row, resolver.position.col);
            if !taken.insert(position) {
                anyhow::bail!(
                    "resolver '{}' reuses position row {} col {}",
                    resolver.title,
                    position.0,
                    position.1
                );
            }
            reqwest::Url::parse(&resolver.service_base_url).with_context(|| {
                format!(
                    "resolver '{}' has an invalid service_base_url",
                    resolver.title
                )
            })?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }
}
