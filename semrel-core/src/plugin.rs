//! Strategy traits for every pluggable pipeline stage.
//!
//! Each stage is a single-method async trait. Built-in strategies and
//! strategies registered by embedding crates are interchangeable behind these
//! traits; [`crate::plugin_registry::PluginRegistry`] binds them to their
//! configured options once at startup.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncRead;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Commit;
use crate::release::{BumpType, LastRelease, NextRelease};

/// Pipeline stages that accept a strategy override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AnalyzeCommits,
    GetLastRelease,
    VerifyConditions,
    VerifyRelease,
    GenerateNotes,
}

impl Stage {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AnalyzeCommits => "analyzeCommits",
            Stage::GetLastRelease => "getLastRelease",
            Stage::VerifyConditions => "verifyConditions",
            Stage::VerifyRelease => "verifyRelease",
            Stage::GenerateNotes => "generateNotes",
        }
    }

    /// Identifier of the built-in strategy used when nothing is configured.
    pub fn default_plugin(&self) -> &'static str {
        match self {
            Stage::AnalyzeCommits => "commit-analyzer",
            Stage::GetLastRelease => "last-release-npm",
            Stage::VerifyConditions => "condition-ci",
            Stage::VerifyRelease => "noop",
            Stage::GenerateNotes => "release-notes",
        }
    }

    /// Only verification stages may be configured with an ordered list.
    pub fn accepts_list(&self) -> bool {
        matches!(self, Stage::VerifyConditions | Stage::VerifyRelease)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy-specific options bound to a plugin at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginOptions(Map<String, Value>);

impl PluginOptions {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The identifier an inline specification points at.
    pub fn path(&self) -> Option<&str> {
        self.0.get("path").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserializes the options into a strategy's typed option struct.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPluginOptions`] if the options do not match `T`.
    pub fn parse<T: DeserializeOwned>(&self, plugin: &str) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            Error::InvalidPluginOptions {
                name: plugin.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// How a stage is configured in the manifest's `release` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSpec {
    /// A bare strategy identifier, bound to empty options.
    Name(String),
    /// An object carrying `path` plus strategy options; the whole object is
    /// bound as options.
    Inline(PluginOptions),
    /// Ordered specs for verification stages; all must pass. A `null` entry
    /// runs the no-op strategy.
    List(Vec<Option<PluginSpec>>),
}

/// Per-stage plugin specifications, as read from the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze_commits: Option<PluginSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_last_release: Option<PluginSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_conditions: Option<PluginSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_release: Option<PluginSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_notes: Option<PluginSpec>,
}

impl PluginConfig {
    pub fn get(&self, stage: Stage) -> Option<&PluginSpec> {
        match stage {
            Stage::AnalyzeCommits => self.analyze_commits.as_ref(),
            Stage::GetLastRelease => self.get_last_release.as_ref(),
            Stage::VerifyConditions => self.verify_conditions.as_ref(),
            Stage::VerifyRelease => self.verify_release.as_ref(),
            Stage::GenerateNotes => self.generate_notes.as_ref(),
        }
    }
}

/// Input handed to a commit analyzer.
pub struct AnalyzeContext<'a> {
    pub config: &'a Config,
    pub commits: &'a [Commit],
    pub last_release: &'a LastRelease,
}

/// Input handed to verification strategies.
///
/// `release` is only present for `verifyRelease`.
pub struct VerifyContext<'a> {
    pub config: &'a Config,
    pub release: Option<ReleaseContext<'a>>,
}

/// Everything known once the next release has been computed.
#[derive(Clone, Copy)]
pub struct ReleaseContext<'a> {
    pub commits: &'a [Commit],
    pub last_release: &'a LastRelease,
    pub next_release: &'a NextRelease,
}

/// Input handed to release-notes generators.
pub struct NotesContext<'a> {
    pub config: &'a Config,
    pub version: &'a semver::Version,
    pub previous_version: Option<&'a semver::Version>,
    pub commits: &'a [Commit],
}

/// A release-notes body that may be produced incrementally.
pub type NotesStream = Pin<Box<dyn AsyncRead + Send>>;

/// Classifies a commit range into a version bump.
#[async_trait]
pub trait AnalyzeCommits: Send + Sync {
    /// Returns `None` when nothing in the range is release-worthy.
    async fn analyze(&self, ctx: &AnalyzeContext<'_>) -> Result<Option<BumpType>>;
}

/// Finds the most recently published release.
#[async_trait]
pub trait GetLastRelease: Send + Sync {
    async fn last_release(&self, config: &Config) -> Result<LastRelease>;
}

/// Pre-flight or post-computation check that may veto a release.
#[async_trait]
pub trait Verify: Send + Sync {
    async fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()>;
}

/// Produces release notes for a version.
#[async_trait]
pub trait GenerateNotes: Send + Sync {
    async fn generate(&self, ctx: &NotesContext<'_>) -> Result<NotesStream>;
}
