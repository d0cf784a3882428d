//! Scanfetch Core Library
//!
//! This library provides the core functionality for the scan-share fetch
//! client: it connects to a remote SMB/CIFS file share, lets an external
//! presentation layer browse folders, and automates periodic discovery,
//! download, and optional deletion of files from a configured source
//! path, skipping files already fetched that day.
//!
//! The SMB/CIFS wire protocol itself is not implemented here; the
//! deployment supplies it behind the [`smb::SmbTransport`] capability
//! trait.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`smb`] - remote capability traits, sessions, listing adapter
//! - [`connect`] - connection negotiation (port and server-name fallback)
//! - [`transfer`] - download/delete engine with batch accounting
//! - [`history`] - per-day download-history ledger
//! - [`config`] - persisted configuration and automation snapshots
//! - [`automation`] - the perpetual polling loop
//! - [`bridge`] - the command surface for the interactive UI path

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod automation;
pub mod bridge;
pub mod config;
pub mod connect;
pub mod history;
pub mod smb;
pub mod transfer;

// Re-export commonly used types
pub use automation::{CycleOutcome, Scheduler};
pub use bridge::Bridge;
pub use config::{AppConfig, AutomationConfig, ConfigError, SourcePath, snapshot_channel};
pub use connect::{ConnectError, NegotiationRequest, negotiate};
pub use history::HistoryLedger;
pub use smb::{
    ConnectParams, ProtocolVersion, RemoteEntry, RemoteError, Session, ShareInfo, SmbSession,
    SmbTransport,
};
pub use transfer::{ActionKind, BatchReport, TransferError, TransferOutcome};
