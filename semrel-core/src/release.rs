//! Release data model and next-version computation.

use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Version assigned when a package has never been released.
pub const INITIAL_VERSION: Version = Version::new(1, 0, 0);

/// The most recently published release for a dist-tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRelease {
    /// `None` means the package has never been published.
    pub version: Option<Version>,
    /// Commit the release was built from, if the registry recorded it.
    pub git_head: Option<String>,
    pub tag: String,
}

impl LastRelease {
    /// A last release for a package that has never been published.
    pub fn none(tag: impl Into<String>) -> Self {
        Self {
            version: None,
            git_head: None,
            tag: tag.into(),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.version.is_none()
    }
}

/// Type of semantic version bump reported by a commit analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// Patch version bump (1.0.0 -> 1.0.1).
    Patch,
    /// Minor version bump (1.0.0 -> 1.1.0).
    Minor,
    /// Major version bump (1.0.0 -> 2.0.0).
    Major,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Major => "major",
            BumpType::Minor => "minor",
            BumpType::Patch => "patch",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "major" => Some(BumpType::Major),
            "minor" => Some(BumpType::Minor),
            "patch" => Some(BumpType::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of release being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// First release of the package.
    Initial,
    Major,
    Minor,
    Patch,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Initial => "initial",
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
        }
    }
}

impl From<BumpType> for ReleaseType {
    fn from(bump: BumpType) -> Self {
        match bump {
            BumpType::Major => ReleaseType::Major,
            BumpType::Minor => ReleaseType::Minor,
            BumpType::Patch => ReleaseType::Patch,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The release this run will make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRelease {
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub version: Version,
}

/// Computes the next release from the change type and the last release.
///
/// An initial release, or any release without a previous version, is
/// [`INITIAL_VERSION`].
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the bump would overflow a version
/// component.
pub fn next_release(release_type: ReleaseType, last: &LastRelease) -> Result<NextRelease> {
    let version = match (&last.version, release_type) {
        (None, _) | (_, ReleaseType::Initial) => INITIAL_VERSION,
        (Some(current), ReleaseType::Major) => increment(current, BumpType::Major)?,
        (Some(current), ReleaseType::Minor) => increment(current, BumpType::Minor)?,
        (Some(current), ReleaseType::Patch) => increment(current, BumpType::Patch)?,
    };

    let release_type = if last.version.is_none() {
        ReleaseType::Initial
    } else {
        release_type
    };

    Ok(NextRelease {
        release_type,
        version,
    })
}

/// Increments a version the way npm's `semver.inc` does.
///
/// A pre-release is promoted to its release when the components the bump
/// would reset are already zero, so `2.0.0-rc.1` bumped by major is `2.0.0`.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the bumped component is already
/// `u64::MAX`.
pub fn increment(current: &Version, bump: BumpType) -> Result<Version> {
    let bumped = |component: u64| {
        component.checked_add(1).ok_or_else(|| Error::InvalidVersion {
            version: current.to_string(),
            message: format!("cannot apply a {} bump without overflowing", bump),
        })
    };

    let promote = !current.pre.is_empty();
    let mut next = match bump {
        BumpType::Major if promote && current.minor == 0 && current.patch == 0 => {
            Version::new(current.major, 0, 0)
        }
        BumpType::Major => Version::new(bumped(current.major)?, 0, 0),
        BumpType::Minor if promote && current.patch == 0 => {
            Version::new(current.major, current.minor, 0)
        }
        BumpType::Minor => Version::new(current.major, bumped(current.minor)?, 0),
        BumpType::Patch if promote => Version::new(current.major, current.minor, current.patch),
        BumpType::Patch => Version::new(current.major, current.minor, bumped(current.patch)?),
    };
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}
