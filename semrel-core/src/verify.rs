//! Configuration checks and the two verification points of a release.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::plugin::{ReleaseContext, Verify, VerifyContext};

/// Checks the configuration before anything touches the network.
///
/// Every problem is reported, not just the first.
pub fn verify_config(config: &Config) -> Vec<String> {
    let mut errors = Vec::new();

    if config.package_name.is_empty() {
        errors.push("No \"name\" found in package.json.".to_string());
    }

    if config.repository_url.is_none() {
        errors.push("No \"repository\" found in package.json.".to_string());
    }

    if reqwest::Url::parse(&config.registry).is_err() {
        errors.push(format!("Invalid registry URL \"{}\".", config.registry));
    }

    if config.debug {
        return errors;
    }

    if config.ci && config.npm_token.is_none() {
        errors.push("No npm token specified.".to_string());
    }

    errors
}

/// Like [`verify_config`], but as a single error.
///
/// # Errors
///
/// Returns [`Error::Config`] listing every problem found.
pub fn ensure_config(config: &Config) -> Result<()> {
    let errors = verify_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(errors))
    }
}

/// Runs the pre-flight `verifyConditions` strategy.
///
/// In debug mode a failure is logged as a warning and the release continues.
///
/// # Errors
///
/// Outside debug mode, returns the strategy's failure.
pub async fn verify_conditions(plugin: &dyn Verify, config: &Config) -> Result<()> {
    let ctx = VerifyContext {
        config,
        release: None,
    };

    match plugin.verify(&ctx).await {
        Ok(()) => Ok(()),
        Err(e) if config.debug => {
            tracing::warn!("Pre-flight verification failed, continuing in debug mode: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Runs the `verifyRelease` strategy once the next release is known.
///
/// Failures are fatal in every mode.
///
/// # Errors
///
/// Returns the strategy's failure.
pub async fn verify_release(
    plugin: &dyn Verify,
    config: &Config,
    release: ReleaseContext<'_>,
) -> Result<()> {
    let ctx = VerifyContext {
        config,
        release: Some(release),
    };
    plugin.verify(&ctx).await
}
