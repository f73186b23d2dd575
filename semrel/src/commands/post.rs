use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use owo_colors::OwoColorize;
use semrel_core::{Environment, GitHubClient, GitRepository, Manifest, ReleasePublisher, Version};

use super::setup;
use crate::output::print_key_value;

fn manifest_version(manifest: &Manifest) -> Result<Version> {
    let raw = manifest
        .package()
        .version
        .as_deref()
        .ok_or_else(|| anyhow!("No \"version\" in package.json. Run `semrel pre` first."))?;
    Version::parse(raw).with_context(|| format!("Invalid version \"{}\" in package.json", raw))
}

pub async fn cmd_post(cwd: &Path, env: &Environment, debug: bool) -> Result<ExitCode> {
    let setup = setup(cwd, env, debug)?;
    let config = Arc::clone(&setup.config);
    let version = manifest_version(&setup.manifest)?;

    let api = GitHubClient::new(
        config.github_url.as_deref(),
        config.github_api_path_prefix.as_deref(),
    )?;
    let publisher = ReleasePublisher::new(
        Arc::clone(&config),
        setup.plugins.generate_notes,
        Arc::new(GitRepository::new(cwd)),
        Arc::new(api),
    );

    let outcome = publisher
        .publish(&version)
        .await
        .context("Failed to publish release notes")?;

    if outcome.published {
        println!(
            "{} release {}",
            "Published".green().bold(),
            outcome.release.tag_name
        );
        print_key_value(
            "Repository",
            &format!("{}/{}", outcome.release.owner, outcome.release.repo),
        );
    } else {
        println!("{} release notes (not published):", "Generated".yellow().bold());
        println!("{}", serde_json::to_string_pretty(&outcome.release)?);
    }

    Ok(ExitCode::SUCCESS)
}
