use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use semrel_core::manifest::write_npmrc;
use semrel_core::{Environment, GitRepository, PreOutcome, ReleasePipeline};

use super::release_reporter::CliReleaseReporter;
use super::setup;
use crate::output::{print_summary_box, print_warning};

pub async fn cmd_pre(cwd: &Path, env: &Environment, debug: bool) -> Result<ExitCode> {
    let setup = setup(cwd, env, debug)?;
    let config = Arc::clone(&setup.config);

    if config.debug {
        tracing::debug!("Debug mode, leaving .npmrc untouched");
    } else {
        match dirs::home_dir() {
            Some(home) => {
                let path = write_npmrc(&home, &config.registry).with_context(|| {
                    format!("Failed to update {}", home.join(".npmrc").display())
                })?;
                tracing::debug!("Wrote registry credentials reference to {}", path.display());
            }
            None => print_warning("No home directory found, not writing .npmrc"),
        }
    }

    let repo = Arc::new(GitRepository::new(cwd));
    let pipeline = ReleasePipeline::new(config, setup.plugins, repo, CliReleaseReporter);

    match pipeline.run_pre(cwd).await? {
        PreOutcome::DryRun(release) => {
            eprintln!(
                "{} Not publishing in debug mode {}",
                "pre".yellow().bold(),
                serde_json::to_string(&release)?
            );
            Ok(ExitCode::FAILURE)
        }
        PreOutcome::Written { release, files } => {
            let version = release.version.to_string();
            let files = files
                .iter()
                .filter_map(|f| f.file_name())
                .map(|f| f.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            print_summary_box(
                "Release",
                &[
                    ("Package", setup.manifest.package().name.as_deref().unwrap_or_default()),
                    ("Type", release.release_type.as_str()),
                    ("Version", version.as_str()),
                    ("Updated", files.as_str()),
                ],
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
