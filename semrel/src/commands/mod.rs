//! Command implementations for the CLI.

mod post;
mod pre;
mod release_reporter;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use semrel_core::plugin_registry::{PluginRegistry, Plugins};
use semrel_core::verify::ensure_config;
use semrel_core::{Config, Environment, HttpRegistryClient, Manifest};

pub use post::cmd_post;
pub use pre::cmd_pre;

/// Everything both phases need: the manifest, the checked configuration and
/// the resolved plugins.
struct Setup {
    manifest: Manifest,
    config: Arc<Config>,
    plugins: Plugins,
}

fn setup(cwd: &Path, env: &Environment, debug: bool) -> Result<Setup> {
    let manifest = Manifest::load(cwd)?;
    let config = Config::new(&manifest, env, debug);
    ensure_config(&config)?;

    let registry = plugin_registry()?;
    let plugins = registry
        .resolve_all(&config.plugins)
        .context("Failed to resolve plugins")?;

    Ok(Setup {
        manifest,
        config: Arc::new(config),
        plugins,
    })
}

fn plugin_registry() -> Result<PluginRegistry> {
    let client = HttpRegistryClient::new()?;
    Ok(semrel_plugins::default_registry(Arc::new(client)))
}
