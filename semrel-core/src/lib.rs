//! Core library for automated, commit-driven package releases.

pub mod classify;
pub mod commits;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod graph;
pub mod last_release;
pub mod manifest;
pub mod pipeline;
pub mod plugin;
pub mod plugin_registry;
pub mod publish;
pub mod registry;
pub mod release;
pub mod release_reporter;
pub mod repository;
pub mod verify;

pub use config::{Config, Environment, ReleaseOptions};
pub use error::{Error, Result};
pub use git::{Commit, GitRepository, SourceControl, VersionTag};
pub use github::{GitHubClient, ReleaseApi};
pub use graph::{TaskGraph, TaskInputs};
pub use last_release::NpmLastRelease;
pub use manifest::Manifest;
pub use pipeline::{PreOutcome, PreparedRelease, ReleasePipeline};
pub use plugin::{
    AnalyzeCommits, AnalyzeContext, GenerateNotes, GetLastRelease, NotesContext, NotesStream,
    PluginConfig, PluginOptions, PluginSpec, ReleaseContext, Stage, Verify, VerifyContext,
};
pub use plugin_registry::{PluginRegistry, Plugins, VerifyChain};
pub use publish::{PublishOutcome, ReleaseNotes, ReleasePublisher};
pub use registry::{HttpRegistryClient, PackageMetadata, RegistryClient, VersionMetadata};
pub use release::{next_release, BumpType, LastRelease, NextRelease, ReleaseType};
pub use release_reporter::ReleaseReporter;
pub use repository::{parse_repository_url, RepositoryRef};
pub use semver::Version;
