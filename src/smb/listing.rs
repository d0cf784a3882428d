//! Thin typed view over remote listing results.
//!
//! Every call re-queries the server; listings must reflect concurrent
//! remote mutation, so nothing here is cached.

use tracing::instrument;

use super::{RemoteEntry, Result, Session, ShareInfo};

/// The `.` and `..` pseudo-entries servers include in directory listings.
fn is_pseudo_entry(name: &str) -> bool {
    name == "." || name == ".."
}

/// Lists a directory within a share, dropping the `.`/`..` pseudo-entries.
///
/// # Errors
///
/// Returns [`super::RemoteError`] on transport or permission failure.
#[instrument(level = "debug", skip(session), fields(share = %share, path = %path))]
pub async fn list_entries(session: &Session, share: &str, path: &str) -> Result<Vec<RemoteEntry>> {
    let entries = session.transport().list_path(share, path).await?;
    Ok(entries
        .into_iter()
        .filter(|e| !is_pseudo_entry(&e.name))
        .collect())
}

/// Lists browsable shares, dropping special shares and administrative
/// shares (names containing `$`).
///
/// # Errors
///
/// Returns [`super::RemoteError`] on transport failure.
#[instrument(level = "debug", skip(session))]
pub async fn list_shares(session: &Session) -> Result<Vec<ShareInfo>> {
    let shares = session.transport().list_shares().await?;
    Ok(shares
        .into_iter()
        .filter(|s| !s.special && !s.name.contains('$'))
        .collect())
}
