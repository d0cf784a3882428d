//! Presentation capability: the command surface the (external) browser
//! UI drives.
//!
//! The UI layer is a thin collaborator outside this crate. It calls
//! these commands one at a time per user action and receives progress
//! through two callbacks: a status callback fed human-readable progress
//! strings, and an error callback fed (title, message) pairs. Errors are
//! surfaced synchronously through the callback and also returned, so a
//! caller can react programmatically.
//!
//! The bridge opens and closes its own sessions through the negotiator;
//! it never shares a session with the automation loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::config::AppConfig;
use crate::connect::{self, ConnectError, NegotiationRequest};
use crate::smb::{RemoteEntry, RemoteError, Session, ShareInfo, SmbTransport, listing};
use crate::transfer::{self, ActionKind, BatchReport, TransferError};

/// Callback fed human-readable progress strings.
pub type StatusCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Callback fed (title, message) error pairs.
pub type ErrorCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Command surface for the interactive path.
pub struct Bridge {
    transport: Arc<dyn SmbTransport>,
    config_path: PathBuf,
    on_status: StatusCallback,
    on_error: ErrorCallback,
}

impl Bridge {
    /// Creates a bridge over the given transport, persisting connection
    /// defaults to the config file at `config_path`. Callbacks default
    /// to no-ops.
    #[must_use]
    pub fn new(transport: Arc<dyn SmbTransport>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            config_path: config_path.into(),
            on_status: Box::new(|_| {}),
            on_error: Box::new(|_, _| {}),
        }
    }

    /// Installs the status callback.
    #[must_use]
    pub fn on_status(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_status = Box::new(callback);
        self
    }

    /// Installs the error callback.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(callback);
        self
    }

    fn status(&self, message: &str) {
        (self.on_status)(message);
    }

    fn error(&self, title: &str, message: &str) {
        (self.on_error)(title, message);
    }

    /// Connects and authenticates, negotiating port and server name.
    ///
    /// On success the winning port (and the credentials that worked) are
    /// persisted as the new defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] after surfacing it through the error
    /// callback.
    #[instrument(level = "info", skip(self, password), fields(host = %host))]
    pub async fn connect(
        &self,
        host: &str,
        port: Option<u16>,
        username: &str,
        password: &str,
    ) -> Result<Session, ConnectError> {
        self.status(&format!("Connecting to {host}..."));
        let request = NegotiationRequest {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        };
        match connect::negotiate(self.transport.as_ref(), &request).await {
            Ok(session) => {
                self.persist_connection(host, session.port(), username, password);
                self.status(&format!(
                    "Connected to {host} port {} ({})",
                    session.port(),
                    session.protocol()
                ));
                Ok(session)
            }
            Err(error) => {
                self.error("Connection error", &error.to_string());
                self.status("Connection failed");
                Err(error)
            }
        }
    }

    /// Lists browsable shares.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] after surfacing it through the error
    /// callback.
    pub async fn list_shares(&self, session: &Session) -> Result<Vec<ShareInfo>, RemoteError> {
        match listing::list_shares(session).await {
            Ok(shares) => Ok(shares),
            Err(error) => {
                self.error("Share listing error", &error.to_string());
                self.status("Listing shares failed");
                Err(error)
            }
        }
    }

    /// Lists a directory within a share.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] after surfacing it through the error
    /// callback.
    pub async fn list(
        &self,
        session: &Session,
        share: &str,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.status(&format!("Listing {share}/{path}..."));
        match listing::list_entries(session, share, path).await {
            Ok(entries) => Ok(entries),
            Err(error) => {
                self.error("Listing error", &error.to_string());
                self.status("Listing failed");
                Err(error)
            }
        }
    }

    /// Runs a batch action over the selected names under `parent_path`.
    ///
    /// Per-item progress goes to the status callback; the final report
    /// summary goes to the error callback when any item failed.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Local`] when the target directory cannot
    /// be created; per-item failures are folded into the report instead.
    #[instrument(level = "info", skip(self, session, names), fields(kind = ?kind, total = names.len()))]
    pub async fn execute_action(
        &self,
        session: &Session,
        share: &str,
        parent_path: &str,
        kind: ActionKind,
        names: &[String],
        target_dir: &Path,
    ) -> Result<BatchReport, TransferError> {
        if names.is_empty() {
            self.status("No files selected.");
            return Ok(BatchReport::new());
        }

        if kind != ActionKind::DeleteOnly {
            if let Err(error) = tokio::fs::create_dir_all(target_dir).await {
                let error = TransferError::local(target_dir, error);
                self.error("Target directory error", &error.to_string());
                return Err(error);
            }
        }

        let report = transfer::execute_batch(
            session,
            share,
            parent_path,
            kind,
            names,
            target_dir,
            |index, total, name| {
                self.status(&format!(
                    "Processing ({index}/{total}): {name} [{}]...",
                    kind.label()
                ));
            },
        )
        .await;

        self.status(&format!(
            "Batch {} finished. Succeeded: {}/{}",
            kind.label(),
            report.succeeded(),
            report.total()
        ));
        if !report.is_clean() {
            self.error("Action report", &report.summary());
        }
        Ok(report)
    }

    /// Writes the winning connection parameters back as defaults.
    fn persist_connection(&self, host: &str, port: u16, username: &str, password: &str) {
        let mut config = AppConfig::load(&self.config_path);
        config.host = host.to_string();
        config.port = Some(port);
        config.username = username.to_string();
        config.password = password.to_string();
        if let Err(error) = config.save(&self.config_path) {
            warn!(path = %self.config_path.display(), %error, "failed to persist connection defaults");
        }
    }
}
