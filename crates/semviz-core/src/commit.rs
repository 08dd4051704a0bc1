//! Commit categories, identifiers and the commit record itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::{self, Timestamp};
use crate::version::{BumpLevel, Version};

/// Category of a simulated commit.
///
/// Only `breaking`, `feat` and `fix` move the version; the other five are
/// informational.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CommitCategory {
    /// Breaking change (major bump).
    #[value(alias = "b")]
    Breaking,
    /// New feature (minor bump).
    #[value(alias = "f")]
    Feat,
    /// Bug fix (patch bump).
    #[value(alias = "x")]
    Fix,
    /// Documentation only.
    #[value(alias = "d")]
    Docs,
    /// Formatting, whitespace.
    #[value(alias = "s")]
    Style,
    /// Internal restructuring.
    #[value(alias = "r")]
    Refactor,
    /// Tests only.
    #[value(alias = "t")]
    Test,
    /// Tooling, dependencies, housekeeping.
    #[value(alias = "c")]
    Chore,
}

impl CommitCategory {
    /// Every category, impactful ones first.
    pub const ALL: [Self; 8] = [
        Self::Breaking,
        Self::Feat,
        Self::Fix,
        Self::Docs,
        Self::Style,
        Self::Refactor,
        Self::Test,
        Self::Chore,
    ];

    /// The version bump this category causes, if any.
    pub const fn impact(self) -> Option<BumpLevel> {
        match self {
            Self::Breaking => Some(BumpLevel::Major),
            Self::Feat => Some(BumpLevel::Minor),
            Self::Fix => Some(BumpLevel::Patch),
            Self::Docs | Self::Style | Self::Refactor | Self::Test | Self::Chore => None,
        }
    }

    /// Keyboard shortcut used by interactive front-ends.
    pub const fn shortcut(self) -> char {
        match self {
            Self::Breaking => 'B',
            Self::Feat => 'F',
            Self::Fix => 'X',
            Self::Docs => 'D',
            Self::Style => 'S',
            Self::Refactor => 'R',
            Self::Test => 'T',
            Self::Chore => 'C',
        }
    }

    /// Resolve a shortcut key (case-insensitive).
    pub fn from_shortcut(key: char) -> Option<Self> {
        let key = key.to_ascii_uppercase();
        Self::ALL.into_iter().find(|c| c.shortcut() == key)
    }

    /// Short human description.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Breaking => "Breaking change",
            Self::Feat => "New feature",
            Self::Fix => "Bug fix",
            Self::Docs => "Docs",
            Self::Style => "Style",
            Self::Refactor => "Refactor",
            Self::Test => "Tests",
            Self::Chore => "Chore",
        }
    }

    /// Lowercase name as used in commit messages and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breaking => "breaking",
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Chore => "chore",
        }
    }
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(category) = Self::ALL.into_iter().find(|c| c.as_str() == s) {
            return Ok(category);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => Self::from_shortcut(key),
            _ => None,
        }
        .ok_or_else(|| format!("unknown commit category `{s}`"))
    }
}

/// Opaque identifier of a commit or release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the leading digits, used to reseed an [`IdSequence`].
    fn leading_number(&self) -> Option<u64> {
        let digits: String = self.0.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strictly increasing id source.
///
/// Ids are millisecond clock readings, bumped past the previous value when
/// two are requested within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// Next id for the given clock reading.
    pub fn next_at(&mut self, now_millis: u64) -> CommitId {
        self.last = now_millis.max(self.last.saturating_add(1));
        CommitId(self.last.to_string())
    }

    /// Next id using the wall clock.
    pub fn next(&mut self) -> CommitId {
        let millis = u64::try_from(clock::now().timestamp_millis()).unwrap_or_default();
        self.next_at(millis)
    }

    /// Make sure future ids sort after every id in `existing`.
    pub fn reseed<'a>(&mut self, existing: impl IntoIterator<Item = &'a CommitId>) {
        let max = existing
            .into_iter()
            .filter_map(CommitId::leading_number)
            .max()
            .unwrap_or_default();
        self.last = self.last.max(max);
    }
}

/// One simulated change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Unique id.
    pub id: CommitId,
    /// Category, serialized as `type`.
    #[serde(rename = "type")]
    pub category: CommitCategory,
    /// Conventional-commit style message, e.g. `"feat: add user dashboard"`.
    pub message: String,
    /// Author display name.
    pub author: String,
    /// Creation time.
    #[serde(with = "crate::clock::iso")]
    pub timestamp: Timestamp,
    /// Current version when the commit was recorded.
    #[serde(with = "crate::version::text")]
    pub version_before: Version,
    /// Version the commit shipped in; set once, by the release engine.
    #[serde(
        default,
        with = "crate::version::text::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub version_after: Option<Version>,
    /// Whether the commit has been released.
    #[serde(default)]
    pub released: bool,
}

impl Commit {
    /// Whether the commit is still pending.
    pub const fn is_pending(&self) -> bool {
        !self.released
    }

    /// Flip to released. Only the first call has an effect.
    pub(crate) fn mark_released(&mut self, version: Version) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.version_after = Some(version);
        true
    }
}
