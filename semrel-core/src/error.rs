//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {context}: {error}")]
    Json {
        error: serde_json::Error,
        context: String,
    },

    #[error("Invalid configuration:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Config(Vec<String>),

    #[error("Manifest not found: {0}. Expected 'package.json' in the project directory.")]
    ManifestNotFound(PathBuf),

    #[error("No plugin '{name}' registered for {stage}. Available plugins: {available}")]
    PluginNotFound {
        stage: String,
        name: String,
        available: String,
    },

    #[error("Stage {stage} does not accept a list of plugins")]
    PluginListNotAllowed { stage: String },

    #[error("Invalid options for plugin '{name}': {message}")]
    InvalidPluginOptions { name: String, message: String },

    #[error("Registry request failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    Registry {
        status: Option<u16>,
        message: String,
    },

    #[error("There is no release with the dist-tag \"{tag}\" yet. Tag a version manually or define \"fallbackTags\".")]
    NoDistTag { tag: String },

    #[error("Invalid version {version}: {message}")]
    InvalidVersion { version: String, message: String },

    #[error("Git error: {0}")]
    Git(String),

    #[error("Commit {hash} is not in the history of branch \"{branch}\". The last release was probably made from another branch or the history was rewritten.")]
    NotInHistory { hash: String, branch: String },

    #[error("There are no relevant changes, so no new version is released.")]
    NoRelevantChanges,

    #[error("Verification failed in {plugin}: {message}")]
    Verification { plugin: String, message: String },

    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Release API request failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    ReleaseApi {
        status: Option<u16>,
        message: String,
    },

    #[error("Task not found: {name}. Required by: {required_by}")]
    TaskNotFound { name: String, required_by: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Task graph error: {0}")]
    TaskGraph(String),
}

impl Error {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "EIO",
            Error::Json { .. } => "EJSON",
            Error::Config(_) => "ECONFIG",
            Error::ManifestNotFound(_) => "ENOMANIFEST",
            Error::PluginNotFound { .. } => "EPLUGINNOTFOUND",
            Error::PluginListNotAllowed { .. } => "EPLUGINLIST",
            Error::InvalidPluginOptions { .. } => "EPLUGINOPTIONS",
            Error::Registry { .. } => "EREGISTRY",
            Error::NoDistTag { .. } => "ENODISTTAG",
            Error::InvalidVersion { .. } => "EINVALIDVERSION",
            Error::Git(_) => "EGIT",
            Error::NotInHistory { .. } => "ENOTINHISTORY",
            Error::NoRelevantChanges => "ENOCHANGE",
            Error::Verification { .. } => "EVERIFY",
            Error::InvalidRepositoryUrl(_) => "EREPOSITORYURL",
            Error::ReleaseApi { .. } => "ERELEASEAPI",
            Error::TaskNotFound { .. } => "ETASKNOTFOUND",
            Error::CircularDependency(_) => "ECYCLE",
            Error::TaskGraph(_) => "ETASKGRAPH",
        }
    }

    /// Returns `true` if a registry lookup failed because the package does not exist.
    ///
    /// Covers both an explicit 404 and transports that only report a
    /// "not found" message.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Registry { status, message } => {
                *status == Some(404) || message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }

    /// Returns `true` for the expected "nothing to release" outcome.
    pub fn is_no_relevant_changes(&self) -> bool {
        matches!(self, Error::NoRelevantChanges)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            error,
            context: "package.json".to_string(),
        }
    }
}

impl From<git2::Error> for Error {
    fn from(error: git2::Error) -> Self {
        Error::Git(error.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
