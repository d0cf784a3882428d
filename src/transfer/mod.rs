//! Transfer engine: download, delete, and combined operations.
//!
//! # Overview
//!
//! - [`engine`] - single-item and batch operations against a session
//! - [`BatchReport`] - partial-failure accounting for batch operations
//! - [`ActionKind`] - the closed set of batch actions
//! - [`TransferError`] - operation error types

pub mod engine;

mod error;
mod report;

pub use engine::{
    ActionKind, delete_directory_recursive, delete_file, download_directory, download_file,
    download_then_delete, execute_batch, remote_join,
};
pub use error::TransferError;
pub use report::{BatchReport, ItemFailure, SUMMARY_FAILURE_LIMIT, TransferOutcome};
