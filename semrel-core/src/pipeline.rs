//! The `pre` phase: decide, verify and persist the next release.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classify::classify;
use crate::commits;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{Commit, SourceControl};
use crate::graph::{TaskGraph, TaskInputs};
use crate::manifest;
use crate::plugin::ReleaseContext;
use crate::plugin_registry::Plugins;
use crate::release::{next_release, LastRelease, NextRelease, ReleaseType};
use crate::release_reporter::ReleaseReporter;
use crate::verify::{verify_conditions, verify_release};

const LAST_RELEASE: &str = "lastRelease";
const COMMITS: &str = "commits";
const TYPE: &str = "type";

#[derive(Debug, Clone)]
enum StepOutput {
    LastRelease(LastRelease),
    Commits(Vec<Commit>),
    Type(ReleaseType),
}

fn missing(step: &str) -> Error {
    Error::TaskGraph(format!("Result of step '{}' is missing", step))
}

impl StepOutput {
    fn into_last_release(output: Option<Self>) -> Result<LastRelease> {
        match output {
            Some(StepOutput::LastRelease(release)) => Ok(release),
            _ => Err(missing(LAST_RELEASE)),
        }
    }

    fn into_commits(output: Option<Self>) -> Result<Vec<Commit>> {
        match output {
            Some(StepOutput::Commits(commits)) => Ok(commits),
            _ => Err(missing(COMMITS)),
        }
    }

    fn into_type(output: Option<Self>) -> Result<ReleaseType> {
        match output {
            Some(StepOutput::Type(release_type)) => Ok(release_type),
            _ => Err(missing(TYPE)),
        }
    }
}

/// Everything the `pre` phase determined.
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    pub last_release: LastRelease,
    pub commits: Vec<Commit>,
    pub next_release: NextRelease,
}

/// What [`ReleasePipeline::run_pre`] did.
#[derive(Debug, Clone)]
pub enum PreOutcome {
    /// Debug mode: the release was computed and verified but nothing was written.
    DryRun(NextRelease),
    /// The version was written to the listed files.
    Written {
        release: NextRelease,
        files: Vec<PathBuf>,
    },
}

/// Runs the release decision for one package.
pub struct ReleasePipeline {
    config: Arc<Config>,
    plugins: Plugins,
    repo: Arc<dyn SourceControl>,
    reporter: Box<dyn ReleaseReporter>,
}

impl ReleasePipeline {
    pub fn new<R>(
        config: Arc<Config>,
        plugins: Plugins,
        repo: Arc<dyn SourceControl>,
        reporter: R,
    ) -> Self
    where
        R: ReleaseReporter + 'static,
    {
        Self {
            config,
            plugins,
            repo,
            reporter: Box::new(reporter),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Determines and verifies the next release.
    ///
    /// Pre-flight verification runs first; then the last release, the
    /// commits since it and their classification are resolved in dependency
    /// order; finally the next version is computed and `verifyRelease` runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRelevantChanges`] when there is nothing to release,
    /// and the first failure of any step otherwise.
    pub async fn prepare(&self) -> Result<PreparedRelease> {
        verify_conditions(self.plugins.verify_conditions.as_ref(), &self.config).await?;

        let graph = {
            let config = Arc::clone(&self.config);
            let plugin = Arc::clone(&self.plugins.get_last_release);
            let last_release_step = move |_: TaskInputs<StepOutput>| async move {
                plugin
                    .last_release(&config)
                    .await
                    .map(StepOutput::LastRelease)
            };

            let config = Arc::clone(&self.config);
            let repo = Arc::clone(&self.repo);
            let commits_step = move |mut inputs: TaskInputs<StepOutput>| async move {
                let last_release = StepOutput::into_last_release(inputs.take(LAST_RELEASE))?;
                commits::collect(&config, repo.as_ref(), &last_release)
                    .await
                    .map(StepOutput::Commits)
            };

            let config = Arc::clone(&self.config);
            let analyzer = Arc::clone(&self.plugins.analyze_commits);
            let type_step = move |mut inputs: TaskInputs<StepOutput>| async move {
                let commits = StepOutput::into_commits(inputs.take(COMMITS))?;
                let last_release = StepOutput::into_last_release(inputs.take(LAST_RELEASE))?;
                classify(analyzer.as_ref(), &config, &commits, &last_release)
                    .await
                    .map(StepOutput::Type)
            };

            TaskGraph::new()
                .task(LAST_RELEASE, &[], last_release_step)
                .task(COMMITS, &[LAST_RELEASE], commits_step)
                .task(TYPE, &[COMMITS, LAST_RELEASE], type_step)
        };

        let mut results = graph.run().await?;
        let last_release = StepOutput::into_last_release(results.remove(LAST_RELEASE))?;
        let commits = StepOutput::into_commits(results.remove(COMMITS))?;
        let release_type = StepOutput::into_type(results.remove(TYPE))?;

        let next = next_release(release_type, &last_release)?;
        tracing::debug!(
            "Determined version {} as \"{}\"",
            next.version,
            self.config.tag
        );

        verify_release(
            self.plugins.verify_release.as_ref(),
            &self.config,
            ReleaseContext {
                commits: &commits,
                last_release: &last_release,
                next_release: &next,
            },
        )
        .await?;

        self.reporter.report_next_release(&self.config.tag, &next);

        Ok(PreparedRelease {
            last_release,
            commits,
            next_release: next,
        })
    }

    /// Prepares the release and writes the new version into the manifest
    /// and lockfiles in `project_dir`.
    ///
    /// Nothing is written in debug mode or when any step fails.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ReleasePipeline::prepare`] or from writing
    /// the files.
    pub async fn run_pre(&self, project_dir: &Path) -> Result<PreOutcome> {
        let prepared = self.prepare().await?;
        let release = prepared.next_release;

        if self.config.debug {
            return Ok(PreOutcome::DryRun(release));
        }

        let version = release.version.to_string();
        let files = manifest::write_version(project_dir, &version)?;
        for file in &files {
            self.reporter.report_version_written(file, &version);
        }

        Ok(PreOutcome::Written { release, files })
    }
}
