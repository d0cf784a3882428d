//! Error types for transfer operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::smb::RemoteError;

/// Errors that can occur while downloading or deleting.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote side failed (listing, read, delete).
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local directory creation or file write failed.
    #[error("IO error writing to {path}: {source}")]
    Local {
        /// The local path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The operation is not supported. Reported explicitly so callers can
    /// detect it instead of seeing a silent partial success.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Description of the unsupported operation.
        operation: &'static str,
    },
}

impl TransferError {
    /// Creates a local IO error.
    pub fn local(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Local {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Whether this is the unsupported-operation case.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
