//! The automation scheduler: a perpetual polling loop that discovers and
//! fetches new files from the configured source path.
//!
//! One cycle walks Idle → Checking → Connecting → Listing →
//! Processing → Idle. There is no terminal state; the loop runs for the
//! process lifetime and every per-cycle error (connect, list, transfer)
//! is isolated to that cycle, logged, and swallowed. The loop
//! never raises anything user-facing and never terminates the host
//! process.
//!
//! The loop opens its own session each cycle and closes it
//! unconditionally before going back to sleep; it never shares a session
//! with the interactive path. Configuration is an immutable snapshot
//! read at the top of each cycle from the watch channel, so the settings
//! surface can replace it at any point without restarting the loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::{AutomationConfig, ConfigError, SourcePath};
use crate::connect::{self, NegotiationRequest};
use crate::history::HistoryLedger;
use crate::smb::{Session, SmbTransport, listing};
use crate::transfer;

/// Result of one automation cycle. Skips are quiet by design; only the
/// processed case did any remote work beyond connect and list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Automation is disabled; nothing was contacted.
    SkippedDisabled,
    /// A required field is empty; nothing was contacted.
    SkippedIncomplete(ConfigError),
    /// Connection negotiation exhausted its candidates.
    ConnectFailed,
    /// The source path could not be listed.
    ListFailed,
    /// The entry set was processed. `failed` counts entries whose
    /// download failed; a delete failure after a successful download is
    /// logged only, since the file was fetched and recorded.
    Processed {
        /// Files downloaded (and recorded in the ledger) this cycle.
        downloaded: usize,
        /// Files whose download failed this cycle.
        failed: usize,
        /// Entries skipped: directories, plus files already in today's
        /// ledger when skipping is enabled.
        skipped: usize,
    },
}

/// The long-lived automation loop.
pub struct Scheduler {
    transport: Arc<dyn SmbTransport>,
    ledger: Arc<HistoryLedger>,
    config: watch::Receiver<AutomationConfig>,
}

impl Scheduler {
    /// Creates a scheduler over the given transport, ledger, and config
    /// snapshot channel.
    #[must_use]
    pub fn new(
        transport: Arc<dyn SmbTransport>,
        ledger: Arc<HistoryLedger>,
        config: watch::Receiver<AutomationConfig>,
    ) -> Self {
        Self {
            transport,
            ledger,
            config,
        }
    }

    /// Runs the loop forever: sleep, snapshot, cycle, repeat.
    ///
    /// Spawn this on its own task; it only returns if the config channel
    /// is closed, which means the process is tearing down anyway.
    pub async fn run(mut self) {
        info!("automation loop started");
        loop {
            let interval = self.config.borrow().effective_interval();
            tokio::time::sleep(interval).await;
            if self.config.has_changed().is_err() {
                debug!("config channel closed, stopping automation loop");
                return;
            }
            let snapshot = self.config.borrow_and_update().clone();
            let outcome = self.run_cycle(&snapshot).await;
            debug!(?outcome, "cycle finished");
        }
    }

    /// Runs a single cycle against the given snapshot.
    ///
    /// Factored out of [`run`](Self::run) so tests can drive cycles
    /// directly. Never returns an error: every failure is folded into
    /// the [`CycleOutcome`].
    #[instrument(level = "debug", skip(self, snapshot))]
    pub async fn run_cycle(&self, snapshot: &AutomationConfig) -> CycleOutcome {
        // Checking: disabled or incomplete config skips quietly, before
        // any remote contact.
        if !snapshot.enabled {
            return CycleOutcome::SkippedDisabled;
        }
        if let Err(missing) = snapshot.validate() {
            debug!(%missing, "cycle skipped");
            return CycleOutcome::SkippedIncomplete(missing);
        }
        let Some(source) = SourcePath::parse(&snapshot.source_path) else {
            return CycleOutcome::SkippedIncomplete(ConfigError::MissingField {
                field: "source path",
            });
        };

        // Connecting.
        let request = NegotiationRequest {
            host: snapshot.host.clone(),
            port: snapshot.port,
            username: snapshot.username.clone(),
            password: snapshot.password.clone(),
        };
        let session = match connect::negotiate(self.transport.as_ref(), &request).await {
            Ok(session) => session,
            Err(error) => {
                warn!(%error, "automation connect failed");
                return CycleOutcome::ConnectFailed;
            }
        };

        // Listing; the session is closed on every path from here on.
        let entries = match listing::list_entries(&session, &source.share, &source.path).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "automation listing failed");
                session.close().await;
                return CycleOutcome::ListFailed;
            }
        };

        // Processing: files only, sequentially, one entry's failure
        // never aborts the rest.
        let outcome = self
            .process_entries(&session, &source, entries, snapshot)
            .await;
        session.close().await;
        outcome
    }

    async fn process_entries(
        &self,
        session: &Session,
        source: &SourcePath,
        entries: Vec<crate::smb::RemoteEntry>,
        snapshot: &AutomationConfig,
    ) -> CycleOutcome {
        let mut downloaded = 0usize;
        let mut failed = 0usize;
        let mut skipped = 0usize;

        for entry in entries {
            if entry.is_directory {
                skipped += 1;
                continue;
            }
            if snapshot.skip_downloaded_today && self.ledger.is_downloaded_today(&entry.name) {
                debug!(name = %entry.name, "already downloaded today");
                skipped += 1;
                continue;
            }

            let remote_path = transfer::remote_join(&source.path, &entry.name);
            match self
                .fetch_one(session, &source.share, &remote_path, &entry.name, snapshot)
                .await
            {
                Ok(()) => downloaded += 1,
                Err(error) => {
                    warn!(name = %entry.name, %error, "automation transfer failed");
                    failed += 1;
                }
            }
        }

        info!(downloaded, failed, skipped, "automation cycle processed");
        CycleOutcome::Processed {
            downloaded,
            failed,
            skipped,
        }
    }

    /// Downloads one file, records it, then deletes it when configured.
    ///
    /// The ledger record lands immediately after the download, before
    /// the delete is even considered, so a crash between the two never
    /// loses history. A delete failure is logged but not returned: the
    /// file is already fetched and recorded.
    async fn fetch_one(
        &self,
        session: &Session,
        share: &str,
        remote_path: &str,
        name: &str,
        snapshot: &AutomationConfig,
    ) -> Result<(), transfer::TransferError> {
        let local_path = snapshot.local_path.join(name);
        transfer::download_file(session, share, remote_path, &local_path).await?;

        if let Err(error) = self.ledger.record_downloaded(name) {
            warn!(name, %error, "history write-through failed");
        }

        if snapshot.delete_after_download {
            if let Err(error) = transfer::delete_file(session, share, remote_path).await {
                warn!(name, %error, "delete after download failed");
            } else {
                debug!(name, "downloaded and deleted");
                return Ok(());
            }
        }
        debug!(name, "downloaded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn snapshot() -> AutomationConfig {
        AppConfig::default().automation_snapshot()
    }

    /// A disabled snapshot skips before touching the transport; a panic
    /// in the transport would fail this test if it were contacted.
    #[tokio::test]
    async fn test_disabled_snapshot_skips_without_transport_contact() {
        struct PanicTransport;

        #[async_trait::async_trait]
        impl SmbTransport for PanicTransport {
            async fn connect(
                &self,
                _params: &crate::smb::ConnectParams,
            ) -> crate::smb::Result<Box<dyn crate::smb::SmbSession>> {
                panic!("transport must not be contacted");
            }
            async fn query_server_name(
                &self,
                _addr: &str,
                _timeout: std::time::Duration,
            ) -> Option<String> {
                panic!("transport must not be contacted");
            }
        }

        let dir = tempfile::TempDir::new().unwrap();
        let ledger = Arc::new(HistoryLedger::load(dir.path().join("history.json")));
        let (_tx, rx) = crate::config::snapshot_channel(snapshot());
        let scheduler = Scheduler::new(Arc::new(PanicTransport), ledger, rx);

        assert_eq!(
            scheduler.run_cycle(&snapshot()).await,
            CycleOutcome::SkippedDisabled
        );

        let mut incomplete = snapshot();
        incomplete.enabled = true;
        // host/source/local all empty: still no contact.
        assert!(matches!(
            scheduler.run_cycle(&incomplete).await,
            CycleOutcome::SkippedIncomplete(_)
        ));
    }
}
