use std::sync::Arc;

use async_trait::async_trait;
use semrel_core::plugin::{AnalyzeContext, NotesContext, PluginConfig, Stage, VerifyContext};
use semrel_core::registry::{PackageMetadata, RegistryClient};
use semrel_core::release::{BumpType, LastRelease};
use semrel_core::{Commit, Config, Error, Result};
use semrel_plugins::{default_registry, LAST_RELEASE_NPM};
use semver::Version;
use serde_json::json;
use tokio::io::AsyncReadExt;

struct StaticRegistry;

#[async_trait]
impl RegistryClient for StaticRegistry {
    async fn package_metadata(&self, _url: &str, _token: Option<&str>) -> Result<PackageMetadata> {
        Ok(serde_json::from_value(json!({
            "dist-tags": { "latest": "1.4.2" },
            "versions": { "1.4.2": { "gitHead": "abc123" } }
        }))?)
    }
}

fn commit(hash: &str, message: &str) -> Commit {
    Commit {
        hash: hash.to_string(),
        message: message.to_string(),
        author_date: 0,
    }
}

#[test]
fn test_every_stage_has_builtins() {
    let registry = default_registry(Arc::new(StaticRegistry));

    assert_eq!(registry.registered(Stage::AnalyzeCommits), vec!["commit-analyzer"]);
    assert_eq!(registry.registered(Stage::GetLastRelease), vec![LAST_RELEASE_NPM]);
    assert_eq!(
        registry.registered(Stage::VerifyConditions),
        vec!["condition-ci", "noop"]
    );
    assert_eq!(registry.registered(Stage::GenerateNotes), vec!["release-notes"]);
}

#[tokio::test]
async fn test_default_plugins_drive_a_release() {
    let registry = default_registry(Arc::new(StaticRegistry));
    let plugins = registry.resolve_all(&PluginConfig::default()).unwrap();
    let config = Config {
        package_name: "pkg".to_string(),
        ..Config::default()
    };

    let last_release = plugins.get_last_release.last_release(&config).await.unwrap();
    assert_eq!(last_release.version, Some(Version::new(1, 4, 2)));
    assert_eq!(last_release.git_head.as_deref(), Some("abc123"));

    let commits = vec![
        commit("1111111aaaa", "fix(parser): handle tabs"),
        commit("2222222bbbb", "feat: add --json flag"),
        commit("3333333cccc", "docs: explain flags"),
    ];
    let bump = plugins
        .analyze_commits
        .analyze(&AnalyzeContext {
            config: &config,
            commits: &commits,
            last_release: &last_release,
        })
        .await
        .unwrap();
    assert_eq!(bump, Some(BumpType::Minor));

    // Not on CI, so the default pre-flight check refuses.
    let err = plugins
        .verify_conditions
        .verify(&VerifyContext {
            config: &config,
            release: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Verification { ref plugin, .. } if plugin == "condition-ci"));

    let version = Version::new(1, 5, 0);
    let mut stream = plugins
        .generate_notes
        .generate(&NotesContext {
            config: &config,
            version: &version,
            previous_version: last_release.version.as_ref(),
            commits: &commits,
        })
        .await
        .unwrap();
    let mut notes = String::new();
    stream.read_to_string(&mut notes).await.unwrap();

    assert_eq!(
        notes,
        "## 1.5.0\n\
         \n### Features\n\n\
         * add --json flag (2222222)\n\
         \n### Bug Fixes\n\n\
         * **parser:** handle tabs (1111111)\n"
    );
}

#[tokio::test]
async fn test_configured_options_reach_the_strategy() {
    let registry = default_registry(Arc::new(StaticRegistry));
    let config: PluginConfig = serde_json::from_value(json!({
        "analyzeCommits": { "path": "commit-analyzer", "releaseRules": { "docs": "patch" } },
        "verifyConditions": ["noop"]
    }))
    .unwrap();
    let plugins = registry.resolve_all(&config).unwrap();
    let release_config = Config::default();
    let last_release = LastRelease::none("latest");

    let bump = plugins
        .analyze_commits
        .analyze(&AnalyzeContext {
            config: &release_config,
            commits: &[commit("4444444dddd", "docs: fix typo")],
            last_release: &last_release,
        })
        .await
        .unwrap();

    assert_eq!(bump, Some(BumpType::Patch));
    plugins
        .verify_conditions
        .verify(&VerifyContext {
            config: &release_config,
            release: None,
        })
        .await
        .unwrap();
}

#[test]
fn test_invalid_options_fail_at_resolution() {
    let registry = default_registry(Arc::new(StaticRegistry));
    let config: PluginConfig = serde_json::from_value(json!({
        "analyzeCommits": { "path": "commit-analyzer", "releaseRules": { "docs": "huge" } }
    }))
    .unwrap();

    let err = registry.resolve_all(&config).err().unwrap();

    assert_eq!(err.code(), "EPLUGINOPTIONS");
}
