//! Release reporter implementation for CLI.

use std::path::Path;

use owo_colors::OwoColorize;
use semrel_core::release::NextRelease;
use semrel_core::release_reporter::ReleaseReporter;

/// CLI implementation of ReleaseReporter.
pub struct CliReleaseReporter;

impl ReleaseReporter for CliReleaseReporter {
    fn report_next_release(&self, tag: &str, release: &NextRelease) {
        println!(
            "Determined version {} as \"{}\" ({} release)",
            release.version.to_string().bold().green(),
            tag,
            release.release_type
        );
    }

    fn report_version_written(&self, path: &Path, version: &str) {
        println!(
            "Wrote version {} to {}",
            version.bold(),
            path.display().bright_black()
        );
    }
}
