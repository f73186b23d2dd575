//! Fakes shared by the pipeline and publisher tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use semrel_core::git::VersionTag;
use semrel_core::plugin::{
    AnalyzeCommits, AnalyzeContext, GenerateNotes, GetLastRelease, NotesContext, NotesStream,
    Verify, VerifyContext,
};
use semrel_core::plugin_registry::Plugins;
use semrel_core::release::{BumpType, LastRelease};
use semrel_core::{Commit, Config, Error, Result, SourceControl};
use semver::Version;

pub fn commit(hash: &str, message: &str) -> Commit {
    Commit {
        hash: hash.to_string(),
        message: message.to_string(),
        author_date: 1_700_000_000,
    }
}

/// In-memory history: `commits` oldest first, HEAD is the last one.
#[derive(Default)]
pub struct FakeRepo {
    pub commits: Vec<Commit>,
    pub tags: Vec<VersionTag>,
    pub history_reads: AtomicUsize,
}

impl FakeRepo {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self {
            commits,
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, version: &str, hash: &str) -> Self {
        self.tags.push(VersionTag {
            version: Version::parse(version).unwrap(),
            hash: hash.to_string(),
        });
        self
    }

    pub fn reads(&self) -> usize {
        self.history_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceControl for FakeRepo {
    async fn head(&self) -> Result<String> {
        self.commits
            .last()
            .map(|c| c.hash.clone())
            .ok_or_else(|| Error::Git("empty history".to_string()))
    }

    async fn commits_since(&self, from: Option<&str>) -> Result<Vec<Commit>> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);
        let start = match from {
            Some(hash) => self
                .commits
                .iter()
                .position(|c| c.hash == hash)
                .map(|i| i + 1)
                .ok_or_else(|| Error::Git(format!("unknown revision {}", hash)))?,
            None => 0,
        };
        Ok(self.commits[start..].to_vec())
    }

    async fn is_ancestor(&self, hash: &str) -> Result<bool> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.commits.iter().any(|c| c.hash == hash))
    }

    async fn version_tags(&self) -> Result<Vec<VersionTag>> {
        Ok(self.tags.clone())
    }
}

pub struct FixedLastRelease {
    pub release: LastRelease,
    pub calls: AtomicUsize,
}

impl FixedLastRelease {
    pub fn new(version: Option<&str>, git_head: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            release: LastRelease {
                version: version.map(|v| Version::parse(v).unwrap()),
                git_head: git_head.map(str::to_string),
                tag: "latest".to_string(),
            },
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GetLastRelease for FixedLastRelease {
    async fn last_release(&self, _config: &Config) -> Result<LastRelease> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.release.clone())
    }
}

/// Reports a fixed bump for any non-empty range and remembers the commits it
/// was shown.
pub struct FixedAnalyzer {
    pub bump: Option<BumpType>,
    pub seen: Mutex<Vec<String>>,
}

impl FixedAnalyzer {
    pub fn new(bump: Option<BumpType>) -> Arc<Self> {
        Arc::new(Self {
            bump,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AnalyzeCommits for FixedAnalyzer {
    async fn analyze(&self, ctx: &AnalyzeContext<'_>) -> Result<Option<BumpType>> {
        self.seen
            .lock()
            .unwrap()
            .extend(ctx.commits.iter().map(|c| c.hash.clone()));
        if ctx.commits.is_empty() {
            return Ok(None);
        }
        Ok(self.bump)
    }
}

/// Records every call; fails with `message` when set.
#[derive(Default)]
pub struct RecordingVerifier {
    pub fail_with: Option<String>,
    pub calls: Mutex<Vec<Option<String>>>,
}

impl RecordingVerifier {
    pub fn passing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Verify for RecordingVerifier {
    async fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        let version = ctx
            .release
            .map(|release| release.next_release.version.to_string());
        self.calls.lock().unwrap().push(version);
        match &self.fail_with {
            Some(message) => Err(Error::Verification {
                plugin: "recording".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Renders one line per commit subject.
pub struct SubjectNotes;

#[async_trait]
impl GenerateNotes for SubjectNotes {
    async fn generate(&self, ctx: &NotesContext<'_>) -> Result<NotesStream> {
        let mut body = format!(
            "{} since {}\n",
            ctx.version,
            ctx.previous_version
                .map(Version::to_string)
                .unwrap_or_else(|| "the beginning".to_string())
        );
        for commit in ctx.commits {
            body.push_str(commit.subject());
            body.push('\n');
        }
        Ok(Box::pin(Cursor::new(body.into_bytes())))
    }
}

pub fn plugins(
    last_release: Arc<FixedLastRelease>,
    analyzer: Arc<FixedAnalyzer>,
    verify_conditions: Arc<RecordingVerifier>,
    verify_release: Arc<RecordingVerifier>,
) -> Plugins {
    Plugins {
        analyze_commits: analyzer,
        get_last_release: last_release,
        verify_conditions,
        verify_release,
        generate_notes: Arc::new(SubjectNotes),
    }
}

pub fn config(debug: bool) -> Config {
    Config {
        package_name: "pkg".to_string(),
        repository_url: Some("https://github.com/acme/pkg.git".to_string()),
        debug,
        ..Config::default()
    }
}
