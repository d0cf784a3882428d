//! Remote SMB capability consumed by the core.
//!
//! The SMB/CIFS wire protocol is not implemented in this crate. The
//! deployment supplies a [`SmbTransport`] that can open authenticated
//! sessions and answer NetBIOS name queries; everything above it (the
//! negotiator, the transfer engine, the automation loop) works against
//! the [`SmbSession`] trait object and never sees the wire.
//!
//! # Overview
//!
//! - [`SmbTransport`] - opens sessions, answers NetBIOS name queries
//! - [`SmbSession`] - list/stat/retrieve/delete operations on one server
//! - [`Session`] - an open session plus the negotiated connection metadata
//! - [`RemoteEntry`] - one listing result (name, kind, size)

mod error;
pub mod listing;

pub use error::RemoteError;

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Negotiated SMB dialect family, as reported by the transport after
/// authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Legacy SMB1/CIFS dialect.
    Smb1,
    /// SMB2 or SMB3 dialect.
    Smb2,
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smb1 => write!(f, "SMB1"),
            Self::Smb2 => write!(f, "SMB2/3"),
        }
    }
}

/// Parameters for one session-open attempt.
///
/// The negotiator builds one of these per (port, server name) candidate
/// pair; the transport dials exactly what it is given and does not retry.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Host to dial: an IP literal, or the original input when resolution
    /// failed.
    pub host: String,
    /// TCP port to dial.
    pub port: u16,
    /// Account name used for authentication.
    pub username: String,
    /// Account password used for authentication.
    pub password: String,
    /// NetBIOS name this client identifies itself as (15 chars max).
    pub client_name: String,
    /// Remote server name candidate for this attempt.
    pub server_name: String,
    /// Direct TCP framing (port 445) instead of the NetBIOS session service.
    pub direct_transport: bool,
    /// Per-attempt dial timeout.
    pub timeout: Duration,
}

/// One remote listing result. Produced fresh on every listing call and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Entry name within its parent directory.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Byte size; meaningful only when `is_directory` is false.
    pub size: u64,
}

impl RemoteEntry {
    /// Creates a file entry.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            size,
        }
    }

    /// Creates a directory entry.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            size: 0,
        }
    }
}

/// One share advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInfo {
    /// Share name.
    pub name: String,
    /// Whether the server flags the share as special (IPC$, printers, ...).
    pub special: bool,
}

/// The consumed wire capability: opens sessions and answers NetBIOS name
/// queries. Implemented outside this crate by the deployment.
#[async_trait]
pub trait SmbTransport: Send + Sync {
    /// Opens and authenticates one session with exactly the given
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Connect`] when the dial or authentication
    /// fails.
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn SmbSession>>;

    /// Queries the NetBIOS name service at `addr` for the server's name.
    ///
    /// Returns `None` when the query times out or the service does not
    /// answer; the negotiator treats that as "no discovered name" and
    /// falls back to the wildcard.
    async fn query_server_name(&self, addr: &str, timeout: Duration) -> Option<String>;
}

/// Operations on one authenticated session.
///
/// All operations are strictly sequential per session; the core never
/// issues concurrent calls on the same session.
#[async_trait]
pub trait SmbSession: Send + Sync {
    /// Dialect family the server negotiated during authentication.
    fn protocol_version(&self) -> ProtocolVersion;

    /// Lists the shares advertised by the server, unfiltered.
    async fn list_shares(&self) -> Result<Vec<ShareInfo>>;

    /// Lists a directory within a share, unfiltered (includes the `.` and
    /// `..` pseudo-entries when the server reports them).
    async fn list_path(&self, share: &str, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Returns the entry for a single path.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] when the path does not exist.
    async fn stat(&self, share: &str, path: &str) -> Result<RemoteEntry>;

    /// Streams the full contents of a remote file into `sink`, returning
    /// the number of bytes written.
    async fn retrieve_file(
        &self,
        share: &str,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;

    /// Deletes a single remote file.
    async fn delete_file(&self, share: &str, path: &str) -> Result<()>;

    /// Deletes a remote directory. The protocol only permits removing
    /// empty directories; callers empty children first.
    async fn delete_directory(&self, share: &str, path: &str) -> Result<()>;

    /// Closes the session. Errors on close are the transport's to log;
    /// the core treats close as infallible.
    async fn close(self: Box<Self>);
}

/// An authenticated session plus the connection metadata the negotiator
/// settled on.
///
/// Owned exclusively by whichever caller opened it and closed
/// deterministically on that caller's exit path, including on error.
pub struct Session {
    port: u16,
    protocol: ProtocolVersion,
    server_name: String,
    transport: Box<dyn SmbSession>,
}

impl Session {
    /// Wraps an open transport session with its negotiated metadata.
    #[must_use]
    pub fn new(port: u16, server_name: impl Into<String>, transport: Box<dyn SmbSession>) -> Self {
        let protocol = transport.protocol_version();
        Self {
            port,
            protocol,
            server_name: server_name.into(),
            transport,
        }
    }

    /// Port the session was actually opened on. Callers may persist this
    /// as the new default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Dialect family the server negotiated.
    #[must_use]
    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    /// Remote server name the session authenticated against.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The underlying transport session.
    #[must_use]
    pub fn transport(&self) -> &dyn SmbSession {
        self.transport.as_ref()
    }

    /// Closes the session, consuming it.
    pub async fn close(self) {
        self.transport.close().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}
