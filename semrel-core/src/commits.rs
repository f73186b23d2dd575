//! Collection of the commits made since the last release.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{Commit, SourceControl};
use crate::release::LastRelease;

/// Returns the commits since `last_release`, oldest first.
///
/// Without a recorded source position every commit on HEAD is returned.
///
/// # Errors
///
/// Returns [`Error::NotInHistory`] if the last release's commit is not an
/// ancestor of HEAD, and propagates history read failures.
pub async fn collect(
    config: &Config,
    repo: &dyn SourceControl,
    last_release: &LastRelease,
) -> Result<Vec<Commit>> {
    let from = last_release.git_head.as_deref();

    if let Some(hash) = from {
        if !repo.is_ancestor(hash).await? {
            return Err(Error::NotInHistory {
                hash: hash.to_string(),
                branch: config.branch.clone(),
            });
        }
    }

    let commits = repo.commits_since(from).await?;
    tracing::debug!(
        count = commits.len(),
        since = from.unwrap_or("beginning of history"),
        "collected commits"
    );
    Ok(commits)
}
