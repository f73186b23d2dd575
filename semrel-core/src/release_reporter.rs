//! Trait for reporting release operations.

use std::path::Path;

use crate::release::NextRelease;

/// Reports what a release run decided and wrote.
///
/// This lets the core library report progress without writing to
/// stdout/stderr itself.
pub trait ReleaseReporter: Send + Sync {
    /// Reports the computed next release.
    fn report_next_release(&self, tag: &str, release: &NextRelease);

    /// Reports a file whose version field was rewritten.
    fn report_version_written(&self, path: &Path, version: &str);
}

/// Reporter that discards everything.
pub struct SilentReporter;

impl ReleaseReporter for SilentReporter {
    fn report_next_release(&self, _tag: &str, _release: &NextRelease) {}

    fn report_version_written(&self, _path: &Path, _version: &str) {}
}
