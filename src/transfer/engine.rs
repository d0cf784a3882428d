//! Download and delete operations against an open session.
//!
//! All operations run strictly sequentially: directory recursion and
//! batch processing never fan out. That bounds remote load and keeps
//! progress reporting and partial-failure accounting simple, which is the
//! right trade for a low-file-count scan share.
//!
//! Single-item operations propagate their first error. Batch processing
//! ([`execute_batch`]) catches each item's error, records it in the
//! [`BatchReport`], and keeps going.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::{BatchReport, TransferError};
use crate::smb::{Session, listing};

/// Reason string for the one explicitly unsupported combination.
const DIR_DELETE_AFTER_DOWNLOAD: &str = "recursive delete after a directory download";

/// Batch action, chosen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Delete the selection from the server without downloading.
    DeleteOnly,
    /// Download the selection, leaving the server untouched.
    DownloadOnly,
    /// Download the selection, then delete what downloaded successfully.
    DownloadAndDelete,
}

impl ActionKind {
    /// Human-readable label for progress strings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DeleteOnly => "delete",
            Self::DownloadOnly => "download",
            Self::DownloadAndDelete => "download and delete",
        }
    }
}

/// Joins a remote parent path and a child name with `/` separators.
#[must_use]
pub fn remote_join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Downloads one remote file to `local_path`, overwriting any existing
/// local file of the same name. Parent directories are created as needed.
///
/// A partially written local file is left in place on failure; a retry
/// simply overwrites it.
///
/// # Errors
///
/// Returns [`TransferError::Local`] on directory creation or write
/// failure and [`TransferError::Remote`] when the remote read fails.
#[instrument(level = "debug", skip(session), fields(share = %share, remote = %remote_path))]
pub async fn download_file(
    session: &Session,
    share: &str,
    remote_path: &str,
    local_path: &Path,
) -> Result<u64, TransferError> {
    if let Some(parent) = local_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::local(parent, e))?;
        }
    }

    let mut file = tokio::fs::File::create(local_path)
        .await
        .map_err(|e| TransferError::local(local_path, e))?;

    let bytes = session
        .transport()
        .retrieve_file(share, remote_path, &mut file)
        .await?;

    file.flush()
        .await
        .map_err(|e| TransferError::local(local_path, e))?;

    debug!(bytes, local = %local_path.display(), "file downloaded");
    Ok(bytes)
}

/// Recursively mirrors a remote directory tree under `local_path`.
///
/// Entries are processed in listing order, recursing into a
/// sub-directory at the point it is encountered. The first failure
/// aborts and propagates.
///
/// # Errors
///
/// Returns the first [`TransferError`] encountered.
#[instrument(level = "debug", skip(session), fields(share = %share, remote = %remote_path))]
pub async fn download_directory(
    session: &Session,
    share: &str,
    remote_path: &str,
    local_path: &Path,
) -> Result<(), TransferError> {
    tokio::fs::create_dir_all(local_path)
        .await
        .map_err(|e| TransferError::local(local_path, e))?;

    let entries = listing::list_entries(session, share, remote_path).await?;
    for entry in entries {
        let child_remote = remote_join(remote_path, &entry.name);
        let child_local = local_path.join(&entry.name);
        if entry.is_directory {
            Box::pin(download_directory(session, share, &child_remote, &child_local)).await?;
        } else {
            download_file(session, share, &child_remote, &child_local).await?;
        }
    }
    Ok(())
}

/// Deletes one remote file.
///
/// # Errors
///
/// Returns [`TransferError::Remote`] when the delete fails.
pub async fn delete_file(
    session: &Session,
    share: &str,
    remote_path: &str,
) -> Result<(), TransferError> {
    session.transport().delete_file(share, remote_path).await?;
    Ok(())
}

/// Recursively deletes a remote directory.
///
/// The protocol only removes empty directories, so children are emptied
/// first: files are deleted and sub-directories recursed in listing
/// order, then the now-empty directory itself is removed.
///
/// # Errors
///
/// Returns the first [`TransferError`] encountered.
#[instrument(level = "debug", skip(session), fields(share = %share, remote = %remote_path))]
pub async fn delete_directory_recursive(
    session: &Session,
    share: &str,
    remote_path: &str,
) -> Result<(), TransferError> {
    let entries = listing::list_entries(session, share, remote_path).await?;
    for entry in entries {
        let child_remote = remote_join(remote_path, &entry.name);
        if entry.is_directory {
            Box::pin(delete_directory_recursive(session, share, &child_remote)).await?;
        } else {
            session.transport().delete_file(share, &child_remote).await?;
        }
    }
    session.transport().delete_directory(share, remote_path).await?;
    Ok(())
}

/// Downloads a remote path, then deletes it from the server.
///
/// The delete is attempted only after the download fully succeeds; a
/// failed download never triggers a delete. For directories the download
/// is performed but the recursive delete-after-download is not
/// supported: the call reports [`TransferError::Unsupported`] so the
/// caller sees the remote copy was left behind.
///
/// # Errors
///
/// Returns the download error, the delete error, or
/// [`TransferError::Unsupported`] for the directory case.
#[instrument(level = "debug", skip(session), fields(share = %share, remote = %remote_path))]
pub async fn download_then_delete(
    session: &Session,
    share: &str,
    remote_path: &str,
    local_path: &Path,
) -> Result<(), TransferError> {
    let entry = session.transport().stat(share, remote_path).await?;
    if entry.is_directory {
        download_directory(session, share, remote_path, local_path).await?;
        warn!(share, remote_path, "directory downloaded; {DIR_DELETE_AFTER_DOWNLOAD} is not supported");
        return Err(TransferError::unsupported(DIR_DELETE_AFTER_DOWNLOAD));
    }
    download_file(session, share, remote_path, local_path).await?;
    delete_file(session, share, remote_path).await
}

/// Processes a batch of selected names under `parent_path` with the
/// given action, sequentially.
///
/// Each item's failure is recorded and the batch keeps going; the report
/// accounts for every name. `on_item` is invoked with the 1-based index,
/// the total, and the item name before each item is processed, feeding
/// the presentation layer's progress strings.
#[instrument(level = "debug", skip(session, names, on_item), fields(share = %share, kind = ?kind, total = names.len()))]
pub async fn execute_batch(
    session: &Session,
    share: &str,
    parent_path: &str,
    kind: ActionKind,
    names: &[String],
    target_dir: &Path,
    on_item: impl Fn(usize, usize, &str),
) -> BatchReport {
    let mut report = BatchReport::new();
    let total = names.len();

    for (index, name) in names.iter().enumerate() {
        on_item(index + 1, total, name);
        let remote_path = remote_join(parent_path, name);
        let result = process_item(session, share, &remote_path, kind, name, target_dir).await;
        match result {
            Ok(()) => report.record_success(),
            Err(error) => {
                warn!(name, %error, "batch item failed");
                report.record_failure(name, error.to_string());
            }
        }
    }
    report
}

async fn process_item(
    session: &Session,
    share: &str,
    remote_path: &str,
    kind: ActionKind,
    name: &str,
    target_dir: &Path,
) -> Result<(), TransferError> {
    match kind {
        ActionKind::DeleteOnly => {
            let entry = session.transport().stat(share, remote_path).await?;
            if entry.is_directory {
                delete_directory_recursive(session, share, remote_path).await
            } else {
                delete_file(session, share, remote_path).await
            }
        }
        ActionKind::DownloadOnly => {
            let entry = session.transport().stat(share, remote_path).await?;
            let local_path = target_dir.join(name);
            if entry.is_directory {
                download_directory(session, share, remote_path, &local_path).await
            } else {
                download_file(session, share, remote_path, &local_path).await.map(|_| ())
            }
        }
        ActionKind::DownloadAndDelete => {
            let local_path = target_dir.join(name);
            download_then_delete(session, share, remote_path, &local_path).await
        }
    }
}
