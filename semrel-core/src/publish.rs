//! Release-notes generation and publication to the hosting service.

use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::SourceControl;
use crate::github::ReleaseApi;
use crate::plugin::{GenerateNotes, NotesContext};
use crate::repository::parse_repository_url;

/// Dist-tag whose releases are marked as pre-releases.
pub const PRERELEASE_TAG: &str = "next";

/// A release as sent to the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotes {
    pub owner: String,
    pub repo: String,
    pub name: String,
    pub tag_name: String,
    pub target_commitish: String,
    pub draft: bool,
    pub body: String,
    pub prerelease: bool,
}

/// Result of [`ReleasePublisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// `false` when the notes were only generated (debug mode without a
    /// hosting token).
    pub published: bool,
    pub release: ReleaseNotes,
}

/// Generates release notes and creates the hosted release.
pub struct ReleasePublisher {
    config: Arc<Config>,
    notes: Arc<dyn GenerateNotes>,
    repo: Arc<dyn SourceControl>,
    api: Arc<dyn ReleaseApi>,
}

impl ReleasePublisher {
    pub fn new(
        config: Arc<Config>,
        notes: Arc<dyn GenerateNotes>,
        repo: Arc<dyn SourceControl>,
        api: Arc<dyn ReleaseApi>,
    ) -> Self {
        Self {
            config,
            notes,
            repo,
            api,
        }
    }

    /// Publishes release notes for `version`.
    ///
    /// In debug mode without a hosting token the fully built release is
    /// returned unpublished and the hosting API is not contacted.
    ///
    /// # Errors
    ///
    /// Returns an error if notes generation fails, HEAD cannot be resolved,
    /// the repository URL cannot be parsed, or the hosting API rejects the
    /// release.
    pub async fn publish(&self, version: &Version) -> Result<PublishOutcome> {
        let body = self.generate_body(version).await?;
        let head = self.repo.head().await?;

        let repository_url = self
            .config
            .repository_url
            .as_deref()
            .ok_or_else(|| {
                Error::Config(vec!["No \"repository\" found in package.json.".to_string()])
            })?;
        let repository = parse_repository_url(repository_url)?;

        let release = ReleaseNotes {
            owner: repository.owner,
            repo: repository.repo,
            name: version.to_string(),
            tag_name: format!("v{}", version),
            target_commitish: head,
            draft: self.config.debug,
            body,
            prerelease: self.config.github_prerelease || self.config.tag == PRERELEASE_TAG,
        };

        if self.config.debug && self.config.github_token.is_none() {
            tracing::info!("Debug mode without a GitHub token, not publishing release notes");
            return Ok(PublishOutcome {
                published: false,
                release,
            });
        }

        self.api
            .create_release(&release, self.config.github_token.as_deref())
            .await?;
        tracing::info!(tag = %release.tag_name, "Published release notes");

        Ok(PublishOutcome {
            published: true,
            release,
        })
    }

    /// Generates the notes body for `version` from the commits since the
    /// closest lower release tag, buffering the whole stream.
    async fn generate_body(&self, version: &Version) -> Result<String> {
        let previous = self
            .repo
            .version_tags()
            .await?
            .into_iter()
            .filter(|tag| tag.version < *version)
            .max_by(|a, b| a.version.cmp(&b.version));

        let commits = self
            .repo
            .commits_since(previous.as_ref().map(|tag| tag.hash.as_str()))
            .await?;

        let ctx = NotesContext {
            config: &self.config,
            version,
            previous_version: previous.as_ref().map(|tag| &tag.version),
            commits: &commits,
        };

        let mut stream = self.notes.generate(&ctx).await?;
        let mut body = String::new();
        stream.read_to_string(&mut body).await?;
        Ok(body)
    }
}
