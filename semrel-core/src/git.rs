//! Source-control access for commit ranges, HEAD and release tags.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{Repository, Sort};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A commit in the range being released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    /// Author timestamp in seconds since the Unix epoch.
    pub author_date: i64,
}

impl Commit {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}

/// A release tag (`v<semver>`) and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub version: Version,
    pub hash: String,
}

/// Read-only view of the repository history.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Hash of the commit HEAD points at.
    async fn head(&self) -> Result<String>;

    /// Commits reachable from HEAD but not from `from`, oldest first.
    ///
    /// With `from == None` the whole history is returned.
    async fn commits_since(&self, from: Option<&str>) -> Result<Vec<Commit>>;

    /// Whether `hash` is HEAD or one of its ancestors.
    ///
    /// Unknown revisions are reported as `false`.
    async fn is_ancestor(&self, hash: &str) -> Result<bool>;

    /// All `v<semver>` tags in the repository.
    async fn version_tags(&self) -> Result<Vec<VersionTag>>;
}

/// [`SourceControl`] backed by a local git repository.
///
/// libgit2 calls are blocking, so each query runs on the blocking pool with
/// its own repository handle.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Points at the repository containing `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::discover(&path)?;
            f(&repo)
        })
        .await
        .map_err(|e| Error::Git(format!("git worker failed: {}", e)))?
    }
}

#[async_trait]
impl SourceControl for GitRepository {
    async fn head(&self) -> Result<String> {
        self.with_repo(|repo| Ok(repo.head()?.peel_to_commit()?.id().to_string()))
            .await
    }

    async fn commits_since(&self, from: Option<&str>) -> Result<Vec<Commit>> {
        let from = from.map(str::to_string);
        self.with_repo(move |repo| {
            let mut walk = repo.revwalk()?;
            walk.push_head()?;
            if let Some(from) = &from {
                let base = repo.revparse_single(from)?.peel_to_commit()?;
                walk.hide(base.id())?;
            }
            walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

            let mut commits = Vec::new();
            for oid in walk {
                let commit = repo.find_commit(oid?)?;
                commits.push(Commit {
                    hash: commit.id().to_string(),
                    message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                    author_date: commit.author().when().seconds(),
                });
            }
            Ok(commits)
        })
        .await
    }

    async fn is_ancestor(&self, hash: &str) -> Result<bool> {
        let hash = hash.to_string();
        self.with_repo(move |repo| {
            let head = repo.head()?.peel_to_commit()?.id();
            let Ok(target) = repo
                .revparse_single(&hash)
                .and_then(|object| object.peel_to_commit())
            else {
                return Ok(false);
            };
            if target.id() == head {
                return Ok(true);
            }
            Ok(repo.graph_descendant_of(head, target.id())?)
        })
        .await
    }

    async fn version_tags(&self) -> Result<Vec<VersionTag>> {
        self.with_repo(|repo| {
            let names = repo.tag_names(None)?;
            let mut tags = Vec::new();
            for name in names.iter().flatten() {
                let Some(version) = name
                    .strip_prefix('v')
                    .and_then(|v| Version::parse(v).ok())
                else {
                    continue;
                };
                let commit = repo.revparse_single(name)?.peel_to_commit()?;
                tags.push(VersionTag {
                    version,
                    hash: commit.id().to_string(),
                });
            }
            Ok(tags)
        })
        .await
    }
}
