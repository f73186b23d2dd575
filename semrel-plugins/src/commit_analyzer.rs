//! Built-in `analyzeCommits` strategy for conventional commits.

use std::collections::HashMap;

use async_trait::async_trait;
use semrel_core::error::{Error, Result};
use semrel_core::plugin::{AnalyzeCommits, AnalyzeContext, PluginOptions};
use semrel_core::release::BumpType;
use serde::Deserialize;

use crate::conventional;

pub const NAME: &str = "commit-analyzer";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Options {
    /// Commit type → bump, merged over the defaults.
    #[serde(default)]
    release_rules: HashMap<String, String>,
}

/// Maps conventional commit types to version bumps.
///
/// Breaking changes are major, `feat` is minor, `fix` and `perf` are patch.
/// The highest bump across all commits wins.
#[derive(Debug, Clone)]
pub struct CommitAnalyzer {
    rules: HashMap<String, BumpType>,
}

impl Default for CommitAnalyzer {
    fn default() -> Self {
        Self {
            rules: HashMap::from([
                ("feat".to_string(), BumpType::Minor),
                ("fix".to_string(), BumpType::Patch),
                ("perf".to_string(), BumpType::Patch),
            ]),
        }
    }
}

impl CommitAnalyzer {
    /// Builds an analyzer from plugin options.
    ///
    /// # Errors
    ///
    /// Returns an error if a release rule names an unknown bump.
    pub fn from_options(options: &PluginOptions) -> Result<Self> {
        let options: Options = options.parse(NAME)?;
        let mut analyzer = Self::default();
        for (kind, bump) in options.release_rules {
            let bump = BumpType::from_str(&bump).ok_or_else(|| Error::InvalidPluginOptions {
                name: NAME.to_string(),
                message: format!(
                    "release rule for '{}' must be major, minor or patch, got '{}'",
                    kind, bump
                ),
            })?;
            analyzer.rules.insert(kind.to_lowercase(), bump);
        }
        Ok(analyzer)
    }

    /// Bump warranted by a single commit message.
    pub fn bump_for(&self, message: &str) -> Option<BumpType> {
        let commit = conventional::parse(message)?;
        if commit.breaking.is_some() {
            return Some(BumpType::Major);
        }
        self.rules.get(&commit.kind).copied()
    }
}

#[async_trait]
impl AnalyzeCommits for CommitAnalyzer {
    async fn analyze(&self, ctx: &AnalyzeContext<'_>) -> Result<Option<BumpType>> {
        let bump = ctx
            .commits
            .iter()
            .filter_map(|commit| {
                let bump = self.bump_for(&commit.message);
                tracing::trace!(hash = commit.short_hash(), bump = ?bump, "analyzed commit");
                bump
            })
            .max();
        tracing::debug!(commits = ctx.commits.len(), bump = ?bump, "analyzed commits");
        Ok(bump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let analyzer = CommitAnalyzer::default();
        assert_eq!(analyzer.bump_for("feat: add thing"), Some(BumpType::Minor));
        assert_eq!(analyzer.bump_for("fix(core): oops"), Some(BumpType::Patch));
        assert_eq!(analyzer.bump_for("perf: faster"), Some(BumpType::Patch));
        assert_eq!(analyzer.bump_for("docs: typo"), None);
        assert_eq!(analyzer.bump_for("feat!: new api"), Some(BumpType::Major));
        assert_eq!(analyzer.bump_for("Merge branch 'x'"), None);
    }

    #[test]
    fn test_release_rules_override() {
        let options: PluginOptions = serde_json::from_str(
            r#"{"path": "commit-analyzer", "releaseRules": {"docs": "patch", "feat": "major"}}"#,
        )
        .unwrap();
        let analyzer = CommitAnalyzer::from_options(&options).unwrap();
        assert_eq!(analyzer.bump_for("docs: typo"), Some(BumpType::Patch));
        assert_eq!(analyzer.bump_for("feat: thing"), Some(BumpType::Major));
    }

    #[test]
    fn test_invalid_release_rule() {
        let options: PluginOptions =
            serde_json::from_str(r#"{"releaseRules": {"docs": "huge"}}"#).unwrap();
        let err = CommitAnalyzer::from_options(&options).unwrap_err();
        assert_eq!(err.code(), "EPLUGINOPTIONS");
    }
}
