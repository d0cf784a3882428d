//! Application configuration: the persisted flat document and the
//! immutable automation snapshots derived from it.
//!
//! The on-disk document keeps the key names the client has always
//! written (`ip`, `user`, `auto_source_path`, ...) so existing config
//! files keep working. Credentials are stored in clear text; that is a
//! known compatibility constraint of the format, not something this
//! crate changes on its own.
//!
//! The automation loop never reads shared mutable configuration.
//! [`AutomationConfig`] is an immutable snapshot published through a
//! `tokio::sync::watch` channel: the settings surface swaps in a whole
//! new snapshot and the loop picks up the latest one at the top of its
//! next cycle.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{instrument, warn};

/// File name of the persisted config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Floor for the automation check interval.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Default automation check interval in seconds.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Error type for configuration problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field the automation loop requires is empty. Not user-facing:
    /// the loop skips the cycle quietly.
    #[error("automation requires a non-empty {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
}

/// The persisted flat configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server address (IP or hostname). Persisted as `ip`.
    #[serde(rename = "ip")]
    pub host: String,
    /// Preferred port; `None` lets negotiation try both well-known ports.
    pub port: Option<u16>,
    /// Account name. Persisted as `user`.
    #[serde(rename = "user")]
    pub username: String,
    /// Account password, stored in clear text for compatibility.
    pub password: String,
    /// Default local directory for interactive downloads.
    pub download_path: String,
    /// Whether the automation loop is enabled.
    pub auto_download_enabled: bool,
    /// Automation check interval in seconds; clamped to a 5 s floor at
    /// use time.
    pub check_interval: u64,
    /// Remote source path, `share` or `share/sub/path`.
    pub auto_source_path: String,
    /// Local destination directory for automated downloads.
    pub auto_local_path: String,
    /// Delete remote files after a successful automated download.
    pub delete_after_download: bool,
    /// Skip files already recorded in today's ledger.
    pub skip_downloaded_today: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            username: "guest".to_string(),
            password: String::new(),
            download_path: String::new(),
            auto_download_enabled: false,
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            auto_source_path: String::new(),
            auto_local_path: String::new(),
            delete_after_download: false,
            skip_downloaded_today: true,
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`, degrading to defaults when the file
    /// is missing or unreadable.
    #[instrument(level = "debug")]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(error) => {
                    warn!(path = %path.display(), %error, "corrupt config file, using defaults");
                    Self::default()
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Persists the config to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Captures the immutable automation snapshot for one loop cycle.
    #[must_use]
    pub fn automation_snapshot(&self) -> AutomationConfig {
        AutomationConfig {
            enabled: self.auto_download_enabled,
            interval: Duration::from_secs(self.check_interval),
            source_path: self.auto_source_path.trim().to_string(),
            local_path: PathBuf::from(self.auto_local_path.trim()),
            delete_after_download: self.delete_after_download,
            skip_downloaded_today: self.skip_downloaded_today,
            host: self.host.trim().to_string(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Per-user config directory for this client.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scanfetch"))
}

/// A remote source path split into its share and sub-path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    /// Share name, the first path segment.
    pub share: String,
    /// Path below the share root; empty for the share root itself.
    pub path: String,
}

impl SourcePath {
    /// Parses `share` or `share/sub/path`; backslashes are accepted as
    /// separators. Returns `None` for an empty input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.replace('\\', "/");
        let trimmed = normalized.trim().trim_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.split_once('/') {
            Some((share, path)) => Some(Self {
                share: share.to_string(),
                path: path.to_string(),
            }),
            None => Some(Self {
                share: trimmed.to_string(),
                path: String::new(),
            }),
        }
    }
}

/// Immutable configuration snapshot for one automation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationConfig {
    /// Whether automation runs at all.
    pub enabled: bool,
    /// Configured check interval, before the floor clamp.
    pub interval: Duration,
    /// Remote source path (`share` or `share/sub/path`).
    pub source_path: String,
    /// Local destination directory.
    pub local_path: PathBuf,
    /// Delete remote files after a successful download.
    pub delete_after_download: bool,
    /// Skip files already recorded in today's ledger.
    pub skip_downloaded_today: bool,
    /// Server address.
    pub host: String,
    /// Preferred port.
    pub port: Option<u16>,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl AutomationConfig {
    /// The sleep interval with the 5 s floor applied.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_CHECK_INTERVAL)
    }

    /// Checks the fields the automation loop cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first empty
    /// required field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_path.is_empty() {
            return Err(ConfigError::MissingField {
                field: "source path",
            });
        }
        if self.local_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "local path" });
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingField { field: "host" });
        }
        Ok(())
    }
}

/// Creates the snapshot-publishing channel the settings surface and the
/// automation loop share. The sender side swaps in whole snapshots; the
/// receiver side reads the latest one per cycle.
#[must_use]
pub fn snapshot_channel(
    initial: AutomationConfig,
) -> (watch::Sender<AutomationConfig>, watch::Receiver<AutomationConfig>) {
    watch::channel(initial)
}
