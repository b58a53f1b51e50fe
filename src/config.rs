//! Configuration file parser.
//!
//! The config file is optional: a missing file yields `Config::default()`,
//! which has no feeds. Unknown top-level keys are accepted and logged.
//! `CHECK_INTERVAL` and `DB_PATH` in the environment override the file, and
//! each feed may name an environment variable holding its webhook URL.
//!
//! ```toml
//! check_interval_secs = 300
//! db_path = "/data/rss_data.db"
//!
//! [pacing]
//! after_send_ms = 1000
//! between_entries_ms = 500
//! between_feeds_ms = 2000
//!
//! [[feeds]]
//! name = "BBC News"
//! url = "http://feeds.bbci.co.uk/news/world/rss.xml"
//! webhook_url_env = "BBC_WEBHOOK_URL"
//! ```
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::scheduler::PacingPolicy;
use crate::util::validate_http_url;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_DB_PATH: &str = "/data/rss_data.db";

const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
const ENV_DB_PATH: &str = "DB_PATH";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed '{name}': {reason}")]
    InvalidFeed { name: String, reason: String },

    #[error("Invalid value for environment variable {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

// ============================================================================
// File Format
// ============================================================================

#[derive(Deserialize)]
#[serde(default)]
struct RawConfig {
    check_interval_secs: u64,
    db_path: PathBuf,
    pacing: RawPacing,
    feeds: Vec<RawFeed>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pacing: RawPacing::default(),
            feeds: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawPacing {
    after_send_ms: u64,
    between_entries_ms: u64,
    between_feeds_ms: u64,
}

impl Default for RawPacing {
    fn default() -> Self {
        let pacing = PacingPolicy::default();
        Self {
            after_send_ms: pacing.after_send.as_millis() as u64,
            between_entries_ms: pacing.between_entries.as_millis() as u64,
            between_feeds_ms: pacing.between_feeds.as_millis() as u64,
        }
    }
}

#[derive(Deserialize)]
struct RawFeed {
    name: String,
    url: String,
    #[serde(default)]
    webhook_url: Option<String>,
    #[serde(default)]
    webhook_url_env: Option<String>,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One polled feed and where its notifications go.
///
/// The webhook URL embeds a credential, so it is kept as a secret and
/// redacted from `Debug` output.
#[derive(Debug)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    webhook_url: Option<SecretString>,
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, webhook_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            webhook_url: webhook_url
                .filter(|w| !w.trim().is_empty())
                .map(SecretString::from),
        }
    }

    /// The destination endpoint, if one is configured.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_ref().map(|w| w.expose_secret())
    }
}

/// Immutable runtime configuration, built once at startup.
#[derive(Debug)]
pub struct Config {
    /// Sleep between the end of one cycle and the start of the next.
    pub check_interval: Duration,
    /// Location of the SQLite seen-article store.
    pub db_path: PathBuf,
    pub pacing: PacingPolicy,
    /// Feeds in polling order.
    pub feeds: Vec<FeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pacing: PacingPolicy::default(),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = ["check_interval_secs", "db_path", "pacing", "feeds"];

    /// Load configuration from a TOML file, applying environment overrides.
    ///
    /// - Missing or empty file → defaults (still subject to env overrides)
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Bad feed or webhook URL → `Err(ConfigError::InvalidFeed)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with environment lookups going through `env`.
    pub fn load_with_env<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "No config file found, using defaults");
                return Self::from_toml_with_env("", env);
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_with_env(&content, env)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Build a configuration from TOML text, resolving environment lookups
    /// through `env` instead of the process environment.
    pub fn from_toml_with_env<F>(content: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            if let Ok(table) = content.parse::<toml::Table>() {
                for key in table.keys() {
                    if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                        tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                    }
                }
            }
            toml::from_str(content)?
        };

        let check_interval_secs = match env(ENV_CHECK_INTERVAL) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_CHECK_INTERVAL,
                    value,
                })?,
            None => raw.check_interval_secs,
        };

        let db_path = env(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(raw.db_path);

        let feeds = raw
            .feeds
            .into_iter()
            .map(|feed| resolve_feed(feed, &env))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            check_interval: Duration::from_secs(check_interval_secs),
            db_path,
            pacing: PacingPolicy {
                after_send: Duration::from_millis(raw.pacing.after_send_ms),
                between_entries: Duration::from_millis(raw.pacing.between_entries_ms),
                between_feeds: Duration::from_millis(raw.pacing.between_feeds_ms),
            },
            feeds,
        })
    }
}

/// Validate one `[[feeds]]` table. The env var named by `webhook_url_env`
/// takes precedence over an inline `webhook_url`.
fn resolve_feed<F>(raw: RawFeed, env: &F) -> Result<FeedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let invalid = |reason: String| ConfigError::InvalidFeed {
        name: raw.name.clone(),
        reason,
    };

    if raw.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }
    validate_http_url(&raw.url).map_err(|e| invalid(format!("feed url: {}", e)))?;

    let webhook = raw
        .webhook_url_env
        .as_deref()
        .and_then(|key| env(key))
        .or_else(|| raw.webhook_url.clone())
        .filter(|w| !w.trim().is_empty());

    match &webhook {
        Some(w) => {
            validate_http_url(w).map_err(|e| invalid(format!("webhook url: {}", e)))?;
        }
        None => {
            tracing::warn!(
                feed = %raw.name,
                "No webhook URL configured; deliveries for this feed will fail"
            );
        }
    }

    Ok(FeedConfig::new(raw.name, raw.url, webhook))
}

// ============================================================================
// Tests
// ============================================================================
