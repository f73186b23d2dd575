//! GitHub release API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Error, Result};
use crate::publish::ReleaseNotes;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Creates releases on a hosting service.
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Creates `release` authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseApi`] if the request fails or is rejected.
    async fn create_release(&self, release: &ReleaseNotes, token: Option<&str>) -> Result<()>;
}

/// [`ReleaseApi`] for GitHub and GitHub Enterprise.
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client for `https://api.github.com`, or for `url` joined with
    /// `path_prefix` (GitHub Enterprise).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: Option<&str>, path_prefix: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("semrel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ReleaseApi {
                status: None,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let base_url = match url {
            Some(url) => format!(
                "{}/{}",
                url.trim_end_matches('/'),
                path_prefix.unwrap_or_default().trim_matches('/')
            )
            .trim_end_matches('/')
            .to_string(),
            None => DEFAULT_API_URL.to_string(),
        };

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/releases", self.base_url, owner, repo)
    }
}

#[async_trait]
impl ReleaseApi for GitHubClient {
    async fn create_release(&self, release: &ReleaseNotes, token: Option<&str>) -> Result<()> {
        let url = self.releases_url(&release.owner, &release.repo);
        let mut builder = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(release);
        if let Some(token) = token {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        let response = builder.send().await.map_err(|e| Error::ReleaseApi {
            status: e.status().map(|s| s.as_u16()),
            message: format!("Request to {} failed: {}", url, e),
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%url, "release created");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Error::ReleaseApi {
                status: Some(status.as_u16()),
                message: text,
            })
        }
    }
}
