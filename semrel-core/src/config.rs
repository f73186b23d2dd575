//! Invocation configuration assembled from the manifest and the environment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::manifest::{registry_for, Manifest};
use crate::plugin::PluginConfig;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_TAG: &str = "latest";

/// Options from the `release` object of `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOptions {
    #[serde(flatten)]
    pub plugins: PluginConfig,
    /// Alternate dist-tag to consult when the publish tag has no version yet.
    #[serde(default)]
    pub fallback_tags: HashMap<String, String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub github_api_path_prefix: Option<String>,
}

/// Snapshot of the process environment taken once at startup.
///
/// Nothing outside `main` reads the process environment; everything else
/// receives values through [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns a variable's value, treating empty values as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn is_true(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// npm configuration exported as `npm_config_*` variables, keyed without
    /// the prefix (e.g. `registry`, `@scope:registry`).
    pub fn npm_config(&self) -> HashMap<String, String> {
        self.vars
            .iter()
            .filter_map(|(key, value)| {
                let lower = key.to_lowercase();
                lower
                    .strip_prefix("npm_config_")
                    .filter(|_| !value.is_empty())
                    .map(|k| (k.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Immutable configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub package_name: String,
    pub repository_url: Option<String>,
    /// Branch releases are made from.
    pub branch: String,
    /// Dry-run: compute and verify, but do not persist or publish.
    pub debug: bool,
    pub ci: bool,
    pub ci_branch: Option<String>,
    pub pull_request: bool,
    pub npm_token: Option<String>,
    pub github_token: Option<String>,
    pub github_url: Option<String>,
    pub github_api_path_prefix: Option<String>,
    pub github_prerelease: bool,
    /// Registry base URL, always ending in `/`.
    pub registry: String,
    /// Dist-tag the package is published under.
    pub tag: String,
    pub fallback_tags: HashMap<String, String>,
    pub plugins: PluginConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            repository_url: None,
            branch: DEFAULT_BRANCH.to_string(),
            debug: false,
            ci: false,
            ci_branch: None,
            pull_request: false,
            npm_token: None,
            github_token: None,
            github_url: None,
            github_api_path_prefix: None,
            github_prerelease: false,
            registry: DEFAULT_REGISTRY.to_string(),
            tag: DEFAULT_TAG.to_string(),
            fallback_tags: default_fallback_tags(),
            plugins: PluginConfig::default(),
        }
    }
}

fn default_fallback_tags() -> HashMap<String, String> {
    HashMap::from([("next".to_string(), "latest".to_string())])
}

impl Config {
    /// Builds the configuration for one run.
    ///
    /// `debug` is the explicit dry-run switch from the command line; the
    /// manifest's `release.debug` can also enable it. A registry that is not
    /// a valid URL is kept as given and reported by
    /// [`verify_config`](crate::verify::verify_config).
    pub fn new(manifest: &Manifest, env: &Environment, debug: bool) -> Self {
        let package = manifest.package();
        let options = package.release.clone().unwrap_or_default();

        let raw_registry = registry_for(package, &env.npm_config());
        let registry = normalize_registry(&raw_registry).unwrap_or(raw_registry);
        let tag = package
            .publish_config
            .as_ref()
            .and_then(|p| p.tag.clone())
            .unwrap_or_else(|| DEFAULT_TAG.to_string());

        let mut fallback_tags = default_fallback_tags();
        fallback_tags.extend(options.fallback_tags);

        let pull_request = env
            .get("TRAVIS_PULL_REQUEST")
            .map(|v| v != "false")
            .unwrap_or(false)
            || env
                .get("GITHUB_EVENT_NAME")
                .map(|v| v.starts_with("pull_request"))
                .unwrap_or(false);

        Self {
            package_name: package.name.clone().unwrap_or_default(),
            repository_url: package.repository_url().map(str::to_string),
            branch: env.get("SR_BRANCH").unwrap_or(DEFAULT_BRANCH).to_string(),
            debug: debug || options.debug,
            ci: env.is_true("CI"),
            ci_branch: ["GITHUB_REF_NAME", "TRAVIS_BRANCH", "CI_COMMIT_BRANCH"]
                .iter()
                .find_map(|key| env.get(key))
                .map(str::to_string),
            pull_request,
            npm_token: env.get("NPM_TOKEN").map(str::to_string),
            github_token: env
                .get("GH_TOKEN")
                .or_else(|| env.get("GITHUB_TOKEN"))
                .map(str::to_string),
            github_url: env.get("GH_URL").map(str::to_string),
            github_api_path_prefix: options.github_api_path_prefix,
            github_prerelease: env.is_true("GH_RELEASE_PRERELEASE"),
            registry,
            tag,
            fallback_tags,
            plugins: options.plugins,
        }
    }

    /// URL of the package document in the registry.
    pub fn package_url(&self) -> String {
        format!("{}{}", self.registry, self.package_name.replace('/', "%2F"))
    }
}

fn normalize_registry(registry: &str) -> Option<String> {
    let mut normalized = reqwest::Url::parse(registry).ok()?.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Some(normalized)
}
