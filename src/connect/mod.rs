//! Connection negotiation: host resolution plus port and server-name
//! fallback.
//!
//! SMB servers are reachable either over direct TCP framing on port 445
//! or through the NetBIOS session service on port 139, and may insist on
//! being addressed by their NetBIOS name rather than the wildcard. The
//! negotiator tries the candidate (port, name) pairs in a fixed order and
//! settles on the first pair that authenticates, keeping one error string
//! per failed attempt so total failure is diagnosable.
//!
//! # Candidate order
//!
//! Ports: the caller-supplied port first, with 139 appended when that
//! port is 445; `[445, 139]` when no port was supplied. Names: the answer
//! of a short NetBIOS name query first when there is one, then always the
//! `*SMBSERVER` wildcard. Ports iterate outer, names inner.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::smb::{ConnectParams, Session, SmbTransport};

/// Well-known port for direct TCP framing.
pub const DIRECT_TCP_PORT: u16 = 445;

/// Well-known port for the NetBIOS session service.
pub const NETBIOS_SESSION_PORT: u16 = 139;

/// Wildcard server name every negotiation falls back to.
pub const WILDCARD_SERVER_NAME: &str = "*SMBSERVER";

/// NetBIOS names are limited to 15 characters.
const NETBIOS_NAME_MAX: usize = 15;

/// Timeout for the NetBIOS name query.
const NAME_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-attempt session-open timeout.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client name used when the machine name cannot be determined.
const FALLBACK_CLIENT_NAME: &str = "SMBClient";

/// One failed (port, server name) attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    /// Port that was dialed.
    pub port: u16,
    /// Server name candidate used.
    pub server_name: String,
    /// Transport-reported failure text.
    pub error: String,
}

impl std::fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {} ({}): {}", self.port, self.server_name, self.error)
    }
}

/// Error type for connection negotiation.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Every (port, server name) candidate pair failed.
    #[error("unable to connect to {host}: {}", format_attempts(.attempts))]
    Exhausted {
        /// Host (resolved address or original input) that was dialed.
        host: String,
        /// Per-attempt diagnostics in attempt order.
        attempts: Vec<FailedAttempt>,
    },
}

impl ConnectError {
    /// The per-attempt diagnostics, in the order the attempts were made.
    #[must_use]
    pub fn attempts(&self) -> &[FailedAttempt] {
        match self {
            Self::Exhausted { attempts, .. } => attempts,
        }
    }
}

fn format_attempts(attempts: &[FailedAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What the caller wants to connect to.
#[derive(Debug, Clone)]
pub struct NegotiationRequest {
    /// IP literal or hostname.
    pub host: String,
    /// Preferred port; `None` tries both well-known ports.
    pub port: Option<u16>,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Builds the ordered candidate port list.
#[must_use]
pub fn candidate_ports(preferred: Option<u16>) -> Vec<u16> {
    match preferred {
        Some(DIRECT_TCP_PORT) => vec![DIRECT_TCP_PORT, NETBIOS_SESSION_PORT],
        Some(port) => vec![port],
        None => vec![DIRECT_TCP_PORT, NETBIOS_SESSION_PORT],
    }
}

/// Derives the NetBIOS client name from the machine name: first DNS
/// label, truncated to 15 characters, `SMBClient` when unavailable.
#[must_use]
pub fn client_name() -> String {
    let raw = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_default();
    trim_client_name(&raw)
}

fn trim_client_name(raw: &str) -> String {
    let label = raw.split('.').next().unwrap_or_default().trim();
    if label.is_empty() {
        return FALLBACK_CLIENT_NAME.to_string();
    }
    label.chars().take(NETBIOS_NAME_MAX).collect()
}

/// Resolves a hostname to an IP address string.
///
/// IP literals pass through untouched. Resolution failure is non-fatal:
/// the original string is returned and the transport gets to try it.
#[instrument(level = "debug")]
pub async fn resolve_host(host: &str) -> String {
    if host.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }
    match tokio::net::lookup_host((host, DIRECT_TCP_PORT)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => {
                let ip = addr.ip().to_string();
                debug!(host, %ip, "resolved hostname");
                ip
            }
            None => host.to_string(),
        },
        Err(error) => {
            warn!(host, %error, "hostname resolution failed, using input as-is");
            host.to_string()
        }
    }
}

/// Builds the ordered candidate server-name list for an address: the
/// NetBIOS query answer first when the service responds, then always the
/// wildcard.
async fn candidate_server_names(transport: &dyn SmbTransport, addr: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if let Some(name) = transport.query_server_name(addr, NAME_QUERY_TIMEOUT).await {
        debug!(addr, %name, "NetBIOS name query answered");
        if name != WILDCARD_SERVER_NAME {
            names.push(name);
        }
    }
    names.push(WILDCARD_SERVER_NAME.to_string());
    names
}

/// Negotiates a live authenticated [`Session`].
///
/// Tries each (port, server name) candidate pair in order and stops at
/// the first success. The returned session carries the port, protocol
/// version, and server name that actually worked, so callers can persist
/// the port as the new default.
///
/// Does not mutate configuration; persisting the winning port is the
/// caller's responsibility.
///
/// # Errors
///
/// Returns [`ConnectError::Exhausted`] with per-attempt diagnostics when
/// every candidate pair fails.
#[instrument(level = "info", skip(transport, request), fields(host = %request.host))]
pub async fn negotiate(
    transport: &dyn SmbTransport,
    request: &NegotiationRequest,
) -> Result<Session, ConnectError> {
    let addr = resolve_host(&request.host).await;
    let ports = candidate_ports(request.port);
    let names = candidate_server_names(transport, &addr).await;
    let client = client_name();

    let mut attempts = Vec::new();
    for port in ports {
        for name in &names {
            debug!(%addr, port, server_name = %name, "attempting session");
            let params = ConnectParams {
                host: addr.clone(),
                port,
                username: request.username.clone(),
                password: request.password.clone(),
                client_name: client.clone(),
                server_name: name.clone(),
                direct_transport: port == DIRECT_TCP_PORT,
                timeout: ATTEMPT_TIMEOUT,
            };
            match transport.connect(&params).await {
                Ok(session) => {
                    let session = Session::new(port, name.clone(), session);
                    info!(
                        %addr,
                        port,
                        server_name = %name,
                        protocol = %session.protocol(),
                        "session established"
                    );
                    return Ok(session);
                }
                Err(error) => {
                    attempts.push(FailedAttempt {
                        port,
                        server_name: name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }
    }

    warn!(%addr, attempts = attempts.len(), "all connection attempts exhausted");
    Err(ConnectError::Exhausted {
        host: addr,
        attempts,
    })
}
