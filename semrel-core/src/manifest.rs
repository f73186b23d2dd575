//! Reading and rewriting `package.json` and its companions.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::{ReleaseOptions, DEFAULT_REGISTRY};
use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "package.json";

/// Lockfiles whose `version` field mirrors the manifest's.
pub const LOCKFILES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

/// The fields of `package.json` this tool reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub publish_config: Option<PublishConfig>,
    #[serde(default)]
    pub release: Option<ReleaseOptions>,
}

impl PackageJson {
    pub fn repository_url(&self) -> Option<&str> {
        match self.repository.as_ref()? {
            Repository::Url(url) => Some(url.as_str()),
            Repository::Object { url } => url.as_deref(),
        }
        .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Repository {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
}

/// A loaded `package.json`.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    package: PackageJson,
}

impl Manifest {
    /// Loads `package.json` from a project directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestNotFound`] if the file is missing and
    /// [`Error::Json`] if it cannot be parsed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        if !path.exists() {
            return Err(Error::ManifestNotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        let package = serde_json::from_str(&content).map_err(|error| Error::Json {
            error,
            context: path.display().to_string(),
        })?;
        Ok(Self { path, package })
    }

    pub fn from_package(path: impl Into<PathBuf>, package: PackageJson) -> Self {
        Self {
            path: path.into(),
            package,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> &PackageJson {
        &self.package
    }
}

/// Picks the registry for a package: `publishConfig.registry`, then the
/// scope's registry, then the configured default.
pub fn registry_for(package: &PackageJson, npm_config: &HashMap<String, String>) -> String {
    if let Some(registry) = package
        .publish_config
        .as_ref()
        .and_then(|p| p.registry.as_ref())
    {
        return registry.clone();
    }

    let name = package.name.as_deref().unwrap_or_default();
    if name.starts_with('@') {
        if let Some(scope) = name.split('/').next() {
            if let Some(registry) = npm_config.get(&format!("{}:registry", scope)) {
                return registry.clone();
            }
        }
    }

    npm_config
        .get("registry")
        .cloned()
        .unwrap_or_else(|| DEFAULT_REGISTRY.to_string())
}

/// Writes `version` into `package.json` and any lockfile next to it.
///
/// Returns the paths that were rewritten, `package.json` first. Every file is
/// read, updated and staged in a temporary file before any of them is renamed
/// into place, so a malformed lockfile leaves the directory untouched.
///
/// # Errors
///
/// Returns an error if a file cannot be read, parsed, or written.
pub fn write_version(dir: impl AsRef<Path>, version: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let manifest = dir.join(MANIFEST_FILE);
    if !manifest.exists() {
        return Err(Error::ManifestNotFound(manifest));
    }

    let mut staged = Vec::new();
    for name in std::iter::once(&MANIFEST_FILE).chain(LOCKFILES.iter()) {
        let path = dir.join(name);
        if !path.exists() {
            tracing::debug!("Couldn't find {}", name);
            continue;
        }
        let contents = with_version(&path, version)?;
        staged.push((stage(&path, contents.as_bytes())?, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        file.persist(&path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Wrote version {} to {}", version, path.display());
        written.push(path);
    }

    Ok(written)
}

fn with_version(path: &Path, version: &str) -> Result<String> {
    let content = fs::read_to_string(path)?;
    let mut json: Value = serde_json::from_str(&content).map_err(|error| Error::Json {
        error,
        context: path.display().to_string(),
    })?;

    let object = json.as_object_mut().ok_or_else(|| Error::Json {
        error: serde::de::Error::custom("expected a JSON object"),
        context: path.display().to_string(),
    })?;
    object.insert("version".to_string(), Value::String(version.to_string()));

    let mut output = serde_json::to_string_pretty(&json)?;
    output.push('\n');
    Ok(output)
}

/// Writes `contents` to a synced temporary file beside `path`.
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    Ok(file)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    stage(path, contents)?
        .persist(path)
        .map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Normalizes a registry URL into the key npm uses for per-registry
/// credentials: no scheme, auth, query or fragment, and the path cut back to
/// its last `/`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `registry` is not a valid URL.
pub fn nerf_dart(registry: &str) -> Result<String> {
    let url = reqwest::Url::parse(registry)
        .map_err(|e| Error::Config(vec![format!("Invalid registry URL {}: {}", registry, e)]))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(vec![format!("Registry URL has no host: {}", registry)]))?;
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let path = url.path();
    let dir = &path[..path.rfind('/').map(|i| i + 1).unwrap_or(path.len())];
    Ok(format!("//{}{}{}", host, port, dir))
}

/// Sets the registry auth line in `<home>/.npmrc`.
///
/// An existing auth line for the same registry is replaced; every other line
/// is kept. The token is referenced as `${NPM_TOKEN}` so the secret itself
/// never touches disk.
///
/// # Errors
///
/// Returns an error if the registry URL is invalid or the file cannot be
/// read or written.
pub fn write_npmrc(home: impl AsRef<Path>, registry: &str) -> Result<PathBuf> {
    let path = home.as_ref().join(".npmrc");
    let key = format!("{}:_authToken=", nerf_dart(registry)?);
    let auth_line = format!("{}${{NPM_TOKEN}}", key);

    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut replaced = false;
    let mut lines: Vec<&str> = Vec::new();
    for line in existing.lines() {
        if !line.trim_start().starts_with(&key) {
            lines.push(line);
        } else if !replaced {
            lines.push(auth_line.as_str());
            replaced = true;
        }
    }
    if !replaced {
        lines.push(auth_line.as_str());
    }

    let mut output = lines.join("\n");
    output.push('\n');
    write_atomic(&path, output.as_bytes())?;
    Ok(path)
}
