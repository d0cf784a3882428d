//! Shared in-memory fake SMB server for integration tests.
//!
//! Implements the `SmbTransport`/`SmbSession` capability over an
//! in-memory share tree, records every connect attempt and mutating
//! operation in order, and can inject failures: refused connects,
//! mid-stream read failures, per-path delete failures.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use scanfetch_core::smb::{
    ConnectParams, ProtocolVersion, RemoteEntry, RemoteError, Result as SmbResult, ShareInfo,
    SmbSession, SmbTransport,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Installs a test subscriber once so `RUST_LOG=debug cargo test` shows
/// the engine's traces.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct ServerState {
    /// share -> path-within-share -> node. Directories are explicit.
    shares: BTreeMap<String, BTreeMap<String, Node>>,
    special_shares: BTreeSet<String>,
    netbios_name: Option<String>,
    /// Refuse this many connect attempts before accepting.
    refuse_connects: usize,
    /// When set, only these ports accept connections.
    accepted_ports: Option<Vec<u16>>,
    /// (share, path) pairs whose reads fail after half the bytes.
    read_failures: BTreeSet<(String, String)>,
    /// (share, path) pairs whose deletes fail.
    delete_failures: BTreeSet<(String, String)>,
    /// Emit `.`/`..` pseudo-entries in listings, like real servers do.
    emit_pseudo_entries: bool,
    /// Every (port, server_name) connect attempt, in order.
    connect_log: Vec<(u16, String)>,
    /// Every session operation, in order ("list scans/pending",
    /// "delete_file scans/pending/a.pdf", "close", ...).
    op_log: Vec<String>,
}

/// The fake server. Clone-cheap; hand [`FakeServer::transport`] to the
/// code under test and keep a copy for assertions.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    /// The transport handle the code under test consumes.
    pub fn transport(&self) -> Arc<dyn SmbTransport> {
        Arc::new(self.clone())
    }

    pub fn add_share(&self, name: &str) {
        self.lock().shares.entry(name.to_string()).or_default();
    }

    pub fn add_special_share(&self, name: &str) {
        self.add_share(name);
        self.lock().special_shares.insert(name.to_string());
    }

    /// Adds a file, creating the share and intermediate directories.
    pub fn add_file(&self, share: &str, path: &str, bytes: &[u8]) {
        let mut state = self.lock();
        let tree = state.shares.entry(share.to_string()).or_default();
        add_parents(tree, path);
        tree.insert(path.to_string(), Node::File(bytes.to_vec()));
    }

    /// Adds an empty directory, creating intermediates.
    pub fn add_dir(&self, share: &str, path: &str) {
        let mut state = self.lock();
        let tree = state.shares.entry(share.to_string()).or_default();
        add_parents(tree, path);
        tree.insert(path.to_string(), Node::Dir);
    }

    pub fn set_netbios_name(&self, name: &str) {
        self.lock().netbios_name = Some(name.to_string());
    }

    pub fn refuse_connects(&self, attempts: usize) {
        self.lock().refuse_connects = attempts;
    }

    pub fn only_accept_ports(&self, ports: &[u16]) {
        self.lock().accepted_ports = Some(ports.to_vec());
    }

    /// Make reads of this path fail after writing half the bytes.
    pub fn fail_reads_on(&self, share: &str, path: &str) {
        self.lock()
            .read_failures
            .insert((share.to_string(), path.to_string()));
    }

    /// Make deletes of this path fail.
    pub fn fail_deletes_on(&self, share: &str, path: &str) {
        self.lock()
            .delete_failures
            .insert((share.to_string(), path.to_string()));
    }

    pub fn emit_pseudo_entries(&self) {
        self.lock().emit_pseudo_entries = true;
    }

    pub fn has_file(&self, share: &str, path: &str) -> bool {
        self.lock()
            .shares
            .get(share)
            .is_some_and(|tree| matches!(tree.get(path), Some(Node::File(_))))
    }

    pub fn has_dir(&self, share: &str, path: &str) -> bool {
        self.lock()
            .shares
            .get(share)
            .is_some_and(|tree| matches!(tree.get(path), Some(Node::Dir)))
    }

    pub fn connect_log(&self) -> Vec<(u16, String)> {
        self.lock().connect_log.clone()
    }

    pub fn op_log(&self) -> Vec<String> {
        self.lock().op_log.clone()
    }
}

fn add_parents(tree: &mut BTreeMap<String, Node>, path: &str) {
    let mut prefix = String::new();
    for segment in path.split('/').collect::<Vec<_>>() {
        if prefix.is_empty() {
            prefix = segment.to_string();
        } else {
            prefix = format!("{prefix}/{segment}");
        }
        if prefix != path {
            tree.entry(prefix.clone()).or_insert(Node::Dir);
        }
    }
}

#[async_trait]
impl SmbTransport for FakeServer {
    async fn connect(&self, params: &ConnectParams) -> SmbResult<Box<dyn SmbSession>> {
        let mut state = self.lock();
        state
            .connect_log
            .push((params.port, params.server_name.clone()));
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(RemoteError::connect(
                &params.host,
                params.port,
                "authentication failed",
            ));
        }
        if let Some(ports) = &state.accepted_ports {
            if !ports.contains(&params.port) {
                return Err(RemoteError::connect(
                    &params.host,
                    params.port,
                    "connection refused",
                ));
            }
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }

    async fn query_server_name(&self, _addr: &str, _timeout: Duration) -> Option<String> {
        self.lock().netbios_name.clone()
    }
}

struct FakeSession {
    state: Arc<Mutex<ServerState>>,
}

impl FakeSession {
    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl SmbSession for FakeSession {
    fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::Smb2
    }

    async fn list_shares(&self) -> SmbResult<Vec<ShareInfo>> {
        let mut state = self.lock();
        state.op_log.push("list_shares".to_string());
        Ok(state
            .shares
            .keys()
            .map(|name| ShareInfo {
                name: name.clone(),
                special: state.special_shares.contains(name),
            })
            .collect())
    }

    async fn list_path(&self, share: &str, path: &str) -> SmbResult<Vec<RemoteEntry>> {
        let mut state = self.lock();
        state.op_log.push(format!("list {share}/{path}"));
        let tree = state
            .shares
            .get(share)
            .ok_or_else(|| RemoteError::list(share, path, "no such share"))?;
        if !path.is_empty() && !matches!(tree.get(path), Some(Node::Dir)) {
            return Err(RemoteError::list(share, path, "not a directory"));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries = Vec::new();
        if state.emit_pseudo_entries {
            entries.push(RemoteEntry::directory("."));
            entries.push(RemoteEntry::directory(".."));
        }
        for (child, node) in tree.range(prefix.clone()..) {
            let Some(rest) = child.strip_prefix(&prefix) else {
                break;
            };
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            entries.push(match node {
                Node::File(bytes) => RemoteEntry::file(rest, bytes.len() as u64),
                Node::Dir => RemoteEntry::directory(rest),
            });
        }
        Ok(entries)
    }

    async fn stat(&self, share: &str, path: &str) -> SmbResult<RemoteEntry> {
        let state = self.lock();
        let tree = state
            .shares
            .get(share)
            .ok_or_else(|| RemoteError::not_found(share, path))?;
        match tree.get(path) {
            Some(Node::File(bytes)) => Ok(RemoteEntry::file(last_segment(path), bytes.len() as u64)),
            Some(Node::Dir) => Ok(RemoteEntry::directory(last_segment(path))),
            None => Err(RemoteError::not_found(share, path)),
        }
    }

    async fn retrieve_file(
        &self,
        share: &str,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> SmbResult<u64> {
        let (bytes, fail_midway) = {
            let mut state = self.lock();
            state.op_log.push(format!("retrieve {share}/{path}"));
            let fail = state
                .read_failures
                .contains(&(share.to_string(), path.to_string()));
            let tree = state
                .shares
                .get(share)
                .ok_or_else(|| RemoteError::not_found(share, path))?;
            match tree.get(path) {
                Some(Node::File(bytes)) => (bytes.clone(), fail),
                Some(Node::Dir) => {
                    return Err(RemoteError::read(share, path, "is a directory"));
                }
                None => return Err(RemoteError::not_found(share, path)),
            }
        };

        if fail_midway {
            let half = &bytes[..bytes.len() / 2];
            sink.write_all(half)
                .await
                .map_err(|e| RemoteError::read(share, path, e.to_string()))?;
            return Err(RemoteError::read(share, path, "connection reset"));
        }
        sink.write_all(&bytes)
            .await
            .map_err(|e| RemoteError::read(share, path, e.to_string()))?;
        Ok(bytes.len() as u64)
    }

    async fn delete_file(&self, share: &str, path: &str) -> SmbResult<()> {
        let mut state = self.lock();
        state.op_log.push(format!("delete_file {share}/{path}"));
        if state
            .delete_failures
            .contains(&(share.to_string(), path.to_string()))
        {
            return Err(RemoteError::delete(share, path, "access denied"));
        }
        let tree = state
            .shares
            .get_mut(share)
            .ok_or_else(|| RemoteError::not_found(share, path))?;
        match tree.get(path) {
            Some(Node::File(_)) => {
                tree.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(RemoteError::delete(share, path, "is a directory")),
            None => Err(RemoteError::not_found(share, path)),
        }
    }

    async fn delete_directory(&self, share: &str, path: &str) -> SmbResult<()> {
        let mut state = self.lock();
        state.op_log.push(format!("delete_dir {share}/{path}"));
        let tree = state
            .shares
            .get_mut(share)
            .ok_or_else(|| RemoteError::not_found(share, path))?;
        match tree.get(path) {
            Some(Node::Dir) => {
                let prefix = format!("{path}/");
                if tree.keys().any(|k| k.starts_with(&prefix)) {
                    return Err(RemoteError::delete(share, path, "directory not empty"));
                }
                tree.remove(path);
                Ok(())
            }
            Some(Node::File(_)) => Err(RemoteError::delete(share, path, "not a directory")),
            None => Err(RemoteError::not_found(share, path)),
        }
    }

    async fn close(self: Box<Self>) {
        self.lock().op_log.push("close".to_string());
    }
}
