//! Per-day download-history ledger.
//!
//! The ledger is what makes the polling loop idempotent: a filename
//! recorded under today's date key is not fetched again that day. It is
//! persisted as a JSON document mapping ISO-8601 local dates to the list
//! of filenames downloaded on that date, the same on-disk layout the
//! client has always used, so existing history files keep working.
//!
//! Mutations are written through synchronously, one file write per newly
//! recorded name, so an abrupt termination never loses more than the
//! record being written. The interior mutex makes every call one
//! load-mutate-persist critical section; the browser path and the
//! automation loop share a single ledger behind an `Arc`.
//!
//! Old records are never pruned; growth is bounded by office scan volume
//! and is the documented contract.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument, warn};

/// File name of the persisted ledger inside the config directory.
pub const HISTORY_FILE_NAME: &str = "download_history.json";

type DayRecords = BTreeMap<String, BTreeSet<String>>;

/// Durable per-day record of filenames already downloaded.
#[derive(Debug)]
pub struct HistoryLedger {
    path: PathBuf,
    records: Mutex<DayRecords>,
}

impl HistoryLedger {
    /// Loads the ledger from `path`.
    ///
    /// A missing or corrupt file degrades to an empty ledger rather than
    /// failing startup; the corruption is logged and the file is
    /// rewritten on the next successful download.
    #[instrument(level = "debug")]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<DayRecords>(&raw) {
                Ok(records) => records,
                Err(error) => {
                    warn!(path = %path.display(), %error, "corrupt history file, starting empty");
                    DayRecords::new()
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => DayRecords::new(),
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable history file, starting empty");
                DayRecords::new()
            }
        };
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Whether `name` was already recorded under today's date key.
    #[must_use]
    pub fn is_downloaded_today(&self, name: &str) -> bool {
        self.is_downloaded_on(&today_key(), name)
    }

    /// Records `name` under today's date key and persists the ledger.
    ///
    /// Idempotent: a name already present today is a no-op and touches
    /// neither memory nor disk.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the write-through fails; the
    /// in-memory record is kept either way so the current process still
    /// skips the file.
    pub fn record_downloaded(&self, name: &str) -> io::Result<()> {
        self.record_on(&today_key(), name)
    }

    fn is_downloaded_on(&self, date_key: &str, name: &str) -> bool {
        let records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        records.get(date_key).is_some_and(|names| names.contains(name))
    }

    fn record_on(&self, date_key: &str, name: &str) -> io::Result<()> {
        let mut records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let inserted = records.entry(date_key.to_string()).or_default().insert(name.to_string());
        if !inserted {
            return Ok(());
        }
        debug!(date = date_key, name, "recorded download");
        self.persist(&records)
    }

    fn persist(&self, records: &DayRecords) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records).map_err(io::Error::other)?;
        std::fs::write(&self.path, json)
    }
}

/// Today's ledger key: the local calendar date, ISO 8601.
fn today_key() -> String {
    chrono::Local::now().date_naive().to_string()
}
