//! npm registry client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The parts of a registry package document used for release resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    #[serde(default)]
    pub versions: HashMap<String, VersionMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    #[serde(default)]
    pub git_head: Option<String>,
}

/// Fetches package documents from a registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetches the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] for transport failures and non-success
    /// statuses; a missing package carries status 404.
    async fn package_metadata(&self, url: &str, token: Option<&str>) -> Result<PackageMetadata>;
}

/// [`RegistryClient`] over HTTP.
pub struct HttpRegistryClient {
    client: Client,
}

impl HttpRegistryClient {
    /// Creates a new registry client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("semrel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Registry {
                status: None,
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn package_metadata(&self, url: &str, token: Option<&str>) -> Result<PackageMetadata> {
        let mut builder = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| Error::Registry {
            status: e.status().map(|s| s.as_u16()),
            message: format!("Request to {} failed: {}", url, e),
        })?;

        match response.status() {
            status if status.is_success() => {
                response.json().await.map_err(|e| Error::Registry {
                    status: Some(status.as_u16()),
                    message: format!("Invalid package document from {}: {}", url, e),
                })
            }
            StatusCode::NOT_FOUND => Err(Error::Registry {
                status: Some(404),
                message: format!("Package not found at {}", url),
            }),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::Registry {
                    status: Some(status.as_u16()),
                    message: text,
                })
            }
        }
    }
}
