//! Resolution of the last published release from registry dist-tags.

use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::plugin::GetLastRelease;
use crate::registry::RegistryClient;
use crate::release::LastRelease;

/// Built-in `getLastRelease` strategy backed by the npm registry.
pub struct NpmLastRelease {
    client: Arc<dyn RegistryClient>,
}

impl NpmLastRelease {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    /// Resolves the version currently published under `config.tag`.
    ///
    /// A package that is not in the registry yet yields a [`LastRelease`]
    /// without a version. When the tag has no version, the tag's entry in
    /// `config.fallback_tags` is consulted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDistTag`] if neither the tag nor its fallback has a
    /// version, and propagates any other registry error.
    pub async fn resolve(&self, config: &Config) -> Result<LastRelease> {
        let url = config.package_url();
        tracing::debug!(%url, tag = %config.tag, "fetching package metadata");

        let metadata = match self
            .client
            .package_metadata(&url, config.npm_token.as_deref())
            .await
        {
            Ok(metadata) => metadata,
            Err(e) if e.is_not_found() => {
                tracing::info!("No published version of {} found", config.package_name);
                return Ok(LastRelease::none(&config.tag));
            }
            Err(e) => return Err(e),
        };

        let tag = &config.tag;
        let version = metadata.dist_tags.get(tag).or_else(|| {
            let fallback = config.fallback_tags.get(tag)?;
            let version = metadata.dist_tags.get(fallback)?;
            tracing::debug!(%tag, %fallback, "using fallback dist-tag");
            Some(version)
        });

        let Some(raw) = version else {
            return Err(Error::NoDistTag { tag: tag.clone() });
        };

        let parsed = Version::parse(raw).map_err(|e| Error::InvalidVersion {
            version: raw.clone(),
            message: e.to_string(),
        })?;
        let git_head = metadata
            .versions
            .get(raw)
            .and_then(|v| v.git_head.clone());

        tracing::debug!(version = %parsed, git_head = ?git_head, "resolved last release");
        Ok(LastRelease {
            version: Some(parsed),
            git_head,
            tag: tag.clone(),
        })
    }
}

#[async_trait]
impl GetLastRelease for NpmLastRelease {
    async fn last_release(&self, config: &Config) -> Result<LastRelease> {
        self.resolve(config).await
    }
}
