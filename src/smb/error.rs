//! Error types for remote SMB operations.
//!
//! The concrete wire transport lives outside this crate, so these variants
//! carry the context the core needs (share, path, attempt detail) while the
//! transport reports its own failure text as a plain message.

use thiserror::Error;

/// Errors produced by the remote capability on an established or attempted
/// session.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The transport could not establish or authenticate a session.
    #[error("connect to {host}:{port} failed: {message}")]
    Connect {
        /// Host the transport dialed.
        host: String,
        /// Port the transport dialed.
        port: u16,
        /// Transport-reported failure text.
        message: String,
    },

    /// Listing a share root or directory failed.
    #[error("list {share}/{path} failed: {message}")]
    List {
        /// Share being listed.
        share: String,
        /// Path within the share.
        path: String,
        /// Transport-reported failure text.
        message: String,
    },

    /// Reading remote file bytes failed mid-stream.
    #[error("read {share}/{path} failed: {message}")]
    Read {
        /// Share containing the file.
        share: String,
        /// Path of the file within the share.
        path: String,
        /// Transport-reported failure text.
        message: String,
    },

    /// Deleting a remote file or directory failed.
    #[error("delete {share}/{path} failed: {message}")]
    Delete {
        /// Share containing the target.
        share: String,
        /// Path of the target within the share.
        path: String,
        /// Transport-reported failure text.
        message: String,
    },

    /// The remote path does not exist.
    #[error("{share}/{path} not found")]
    NotFound {
        /// Share that was queried.
        share: String,
        /// Path that was not found.
        path: String,
    },
}

impl RemoteError {
    /// Creates a connect error.
    pub fn connect(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Creates a listing error.
    pub fn list(
        share: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::List {
            share: share.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a read error.
    pub fn read(
        share: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Read {
            share: share.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a delete error.
    pub fn delete(
        share: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Delete {
            share: share.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(share: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            share: share.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_display_carries_host_and_port() {
        let error = RemoteError::connect("192.168.1.10", 445, "connection refused");
        let msg = error.to_string();
        assert!(msg.contains("192.168.1.10:445"), "Expected endpoint in: {msg}");
        assert!(msg.contains("connection refused"), "Expected detail in: {msg}");
    }

    #[test]
    fn test_list_error_display_carries_share_and_path() {
        let error = RemoteError::list("scans", "pending", "access denied");
        let msg = error.to_string();
        assert!(msg.contains("scans/pending"), "Expected path in: {msg}");
        assert!(msg.contains("access denied"), "Expected detail in: {msg}");
    }

    #[test]
    fn test_not_found_display() {
        let error = RemoteError::not_found("scans", "gone.pdf");
        assert!(error.to_string().contains("scans/gone.pdf"));
        assert!(error.to_string().contains("not found"));
    }
}
