//! Classification of a commit range into a release type.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Commit;
use crate::plugin::{AnalyzeCommits, AnalyzeContext};
use crate::release::{LastRelease, ReleaseType};

/// Asks the analyzer what kind of release `commits` warrant.
///
/// A package without a previous version always gets an initial release, no
/// matter what the analyzer reports.
///
/// # Errors
///
/// Returns [`Error::NoRelevantChanges`] when the analyzer finds nothing
/// release-worthy, and propagates analyzer failures.
pub async fn classify(
    analyzer: &dyn AnalyzeCommits,
    config: &Config,
    commits: &[Commit],
    last_release: &LastRelease,
) -> Result<ReleaseType> {
    let ctx = AnalyzeContext {
        config,
        commits,
        last_release,
    };

    let Some(bump) = analyzer.analyze(&ctx).await? else {
        return Err(Error::NoRelevantChanges);
    };

    if last_release.is_initial() {
        tracing::debug!(detected = %bump, "no previous release, using initial release");
        return Ok(ReleaseType::Initial);
    }

    Ok(bump.into())
}
