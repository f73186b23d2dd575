//! Built-in strategies for every pluggable release stage.

pub mod commit_analyzer;
pub mod condition_ci;
pub mod conventional;
pub mod noop;
pub mod release_notes;

use std::sync::Arc;

use semrel_core::last_release::NpmLastRelease;
use semrel_core::plugin_registry::PluginRegistry;
use semrel_core::registry::RegistryClient;

pub use commit_analyzer::CommitAnalyzer;
pub use condition_ci::ConditionCi;
pub use noop::Noop;
pub use release_notes::ReleaseNotesGenerator;

/// Identifier of the npm-backed `getLastRelease` strategy.
pub const LAST_RELEASE_NPM: &str = "last-release-npm";

/// Registers every built-in strategy under its identifier.
pub fn register_builtins(registry: &mut PluginRegistry, client: Arc<dyn RegistryClient>) {
    registry.register_analyzer(commit_analyzer::NAME, |options| {
        Ok(Arc::new(CommitAnalyzer::from_options(options)?))
    });
    registry.register_last_release(LAST_RELEASE_NPM, move |_| {
        Ok(Arc::new(NpmLastRelease::new(Arc::clone(&client))))
    });
    registry.register_verifier(condition_ci::NAME, |_| Ok(Arc::new(ConditionCi)));
    registry.register_verifier(noop::NAME, |_| Ok(Arc::new(Noop)));
    registry.register_notes(release_notes::NAME, |options| {
        Ok(Arc::new(ReleaseNotesGenerator::from_options(options)?))
    });
}

/// A registry with every built-in strategy.
pub fn default_registry(client: Arc<dyn RegistryClient>) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    register_builtins(&mut registry, client);
    registry
}
