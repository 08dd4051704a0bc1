//! Version arithmetic.
//!
//! A [`Version`] is a plain `major.minor.patch` triple. The next version is
//! always derived from scratch out of the categories that are currently
//! pending; nothing here keeps state between calls.

pub mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commit::CommitCategory;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid semver: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// Pre-release or build metadata was present.
    #[error("unsupported version `{0}`: pre-release and build metadata are not modelled")]
    Unsupported(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level.
///
/// Ordered by precedence, so the highest level among pending commits is
/// simply the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Patch release (x.y.Z).
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl BumpLevel {
    /// Uppercase impact label (`MAJOR`, `MINOR`, `PATCH`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::Patch => "PATCH",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A `major.minor.patch` version triple.
///
/// Ordering is lexicographic on `(major, minor, patch)`, which is what the
/// field order gives the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
}

impl Version {
    /// The version every fresh project starts from.
    pub const INITIAL: Self = Self::new(0, 1, 0);

    /// Create a new version.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Apply a bump level to this version, or `None` if the bumped
    /// component would overflow.
    #[must_use]
    pub const fn checked_bump(self, level: BumpLevel) -> Option<Self> {
        match level {
            BumpLevel::Patch => match self.patch.checked_add(1) {
                Some(patch) => Some(Self::new(self.major, self.minor, patch)),
                None => None,
            },
            BumpLevel::Minor => match self.minor.checked_add(1) {
                Some(minor) => Some(Self::new(self.major, minor, 0)),
                None => None,
            },
            BumpLevel::Major => match self.major.checked_add(1) {
                Some(major) => Some(Self::new(major, 0, 0)),
                None => None,
            },
        }
    }

    /// Apply a bump level to this version.
    ///
    /// A component already at `u64::MAX` stays there. Persisted state in
    /// that position is rejected on load, see [`checked_bump`](Self::checked_bump).
    #[must_use]
    pub const fn bump(self, level: BumpLevel) -> Self {
        match level {
            BumpLevel::Patch => Self::new(self.major, self.minor, self.patch.saturating_add(1)),
            BumpLevel::Minor => Self::new(self.major, self.minor.saturating_add(1), 0),
            BumpLevel::Major => Self::new(self.major.saturating_add(1), 0, 0),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

impl From<Version> for semver::Version {
    fn from(v: Version) -> Self {
        Self::new(v.major, v.minor, v.patch)
    }
}

/// Parse a version string, stripping an optional `v` prefix.
///
/// Pre-release and build metadata parse as valid semver but are rejected.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let parsed = semver::Version::parse(trimmed)?;
    if !parsed.pre.is_empty() || !parsed.build.is_empty() {
        return Err(VersionError::Unsupported(s.to_string()));
    }
    Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
}

/// Highest bump level among a set of categories, if any is impactful.
///
/// Only presence matters: three `fix` commits are still one patch bump.
pub fn highest_impact<I>(categories: I) -> Option<BumpLevel>
where
    I: IntoIterator<Item = CommitCategory>,
{
    categories.into_iter().filter_map(CommitCategory::impact).max()
}

/// Compute the version that releasing `categories` on top of `current`
/// would produce.
///
/// `breaking` beats `feat`, which beats `fix`. With nothing impactful the
/// current version is returned unchanged.
pub fn next_version<I>(current: Version, categories: I) -> Version
where
    I: IntoIterator<Item = CommitCategory>,
{
    highest_impact(categories).map_or(current, |level| current.bump(level))
}
