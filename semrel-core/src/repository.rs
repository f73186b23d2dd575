//! Parsing hosted repository URLs into owner and name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// A hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

static SCP_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^@/]+@)?(?P<host>[^:/]+):(?P<path>[^/].*)$").expect("valid regex")
});

static SHORTCUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<provider>github|gitlab|bitbucket):)?(?P<owner>[\w.-]+)/(?P<repo>[\w.-]+)$")
        .expect("valid regex")
});

/// Parses the forms npm accepts in `repository`:
/// `https://host/owner/repo(.git)`, `git+https://…`, `git://…`, `ssh://…`,
/// `git@host:owner/repo.git`, `github:owner/repo` and `owner/repo`.
///
/// # Errors
///
/// Returns [`Error::InvalidRepositoryUrl`] if no owner and name can be found.
pub fn parse_repository_url(url: &str) -> Result<RepositoryRef> {
    let trimmed = url.trim();
    let invalid = || Error::InvalidRepositoryUrl(url.to_string());

    if let Some(caps) = SHORTCUT.captures(trimmed) {
        let host = match caps.name("provider").map(|m| m.as_str()) {
            Some("gitlab") => "gitlab.com",
            Some("bitbucket") => "bitbucket.org",
            _ => "github.com",
        };
        return Ok(RepositoryRef {
            host: host.to_string(),
            owner: caps["owner"].to_string(),
            repo: strip_git_suffix(&caps["repo"]).to_string(),
        });
    }

    let (host, path) = if trimmed.contains("://") {
        let without_prefix = trimmed.strip_prefix("git+").unwrap_or(trimmed);
        let parsed = reqwest::Url::parse(without_prefix).map_err(|_| invalid())?;
        let host = parsed.host_str().ok_or_else(invalid)?.to_string();
        (host, parsed.path().to_string())
    } else if let Some(caps) = SCP_LIKE.captures(trimmed) {
        (caps["host"].to_string(), caps["path"].to_string())
    } else {
        return Err(invalid());
    };

    let mut segments = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().map(strip_git_suffix).ok_or_else(invalid)?;
    if repo.is_empty() {
        return Err(invalid());
    }

    Ok(RepositoryRef {
        host,
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_repo(url: &str) -> (String, String) {
        let r = parse_repository_url(url).unwrap();
        (r.owner, r.repo)
    }

    #[test]
    fn test_url_forms() {
        let expected = ("octo".to_string(), "widget".to_string());
        for url in [
            "https://github.com/octo/widget",
            "https://github.com/octo/widget.git",
            "git+https://github.com/octo/widget.git",
            "git://github.com/octo/widget.git",
            "ssh://git@github.com/octo/widget.git",
            "git+ssh://git@github.com/octo/widget.git",
            "git@github.com:octo/widget.git",
            "github:octo/widget",
            "octo/widget",
        ] {
            assert_eq!(owner_repo(url), expected, "{}", url);
        }
    }

    #[test]
    fn test_enterprise_host() {
        let r = parse_repository_url("git@git.corp.example:team/app.git").unwrap();
        assert_eq!(r.host, "git.corp.example");
        assert_eq!(r.owner, "team");
        assert_eq!(r.repo, "app");
    }

    #[test]
    fn test_invalid_urls() {
        for url in ["", "https://github.com/", "https://github.com/octo", "just-a-name"] {
            let err = parse_repository_url(url).unwrap_err();
            assert_eq!(err.code(), "EREPOSITORYURL", "{}", url);
        }
    }
}
