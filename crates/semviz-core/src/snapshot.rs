//! The persisted and exported JSON document.
//!
//! Every top-level field is optional on the way in. Older or partial
//! documents load with defaults for whatever is missing; the consistency
//! checks in [`reconcile`] then decide whether the pieces fit together.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::clock::{self, Timestamp};
use crate::commit::{Commit, CommitId};
use crate::release::Release;
use crate::settings::AnimationSpeed;
use crate::version::{self, BumpLevel, Version};

/// Errors produced while decoding or validating a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Not JSON, or not the expected shape. Bad version and timestamp
    /// strings surface here too.
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The same commit id appears twice in the history.
    #[error("duplicate commit id `{0}`")]
    DuplicateCommit(CommitId),

    /// The same release id appears twice.
    #[error("duplicate release id `{0}`")]
    DuplicateRelease(CommitId),

    /// An entry of `unreleasedCommits` is marked released.
    #[error("commit `{0}` is listed as unreleased but marked released")]
    PendingMarkedReleased(CommitId),

    /// A pending commit appears inside a release.
    #[error("commit `{0}` is pending but already shipped in a release")]
    PendingInRelease(CommitId),

    /// A released commit is in no release, or in more than one.
    #[error("released commit `{id}` appears in {count} releases (expected exactly 1)")]
    ReleaseMembership {
        /// The commit.
        id: CommitId,
        /// How many releases list it.
        count: usize,
    },

    /// A released commit disagrees with its release about the version.
    #[error("commit `{id}` says it shipped in {found}, but its release is {expected}")]
    VersionMismatch {
        /// The commit.
        id: CommitId,
        /// The release's version.
        expected: Version,
        /// The commit's `versionAfter`.
        found: Version,
    },

    /// The pending commits call for a bump the current version cannot take.
    #[error("version {version} cannot take a {bump} bump")]
    VersionOverflow {
        /// The stored current version.
        version: Version,
        /// The bump the pending commits require.
        bump: BumpLevel,
    },
}

/// Result type alias using [`SnapshotError`].
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// JSON document for persistence and export.
///
/// `currentVersion` is an object; versions inside commits and releases are
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Current version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<Version>,
    /// Commit history, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_commits: Option<Vec<Commit>>,
    /// Pending subset of the history, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unreleased_commits: Option<Vec<Commit>>,
    /// Releases, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases: Option<Vec<Release>>,
    /// Dark theme preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    /// Sound preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    /// Auto-commit speed preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<AnimationSpeed>,
    /// Set on exported documents only.
    #[serde(
        default,
        with = "crate::clock::iso::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub export_date: Option<Timestamp>,
}

impl Snapshot {
    /// Compact JSON, as persisted.
    pub fn to_json(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, as exported.
    pub fn to_json_pretty(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document.
    pub fn from_json(raw: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// File name for an export made at `at`: `semver-history-YYYY-MM-DD.json`.
pub fn export_file_name(at: &Timestamp) -> String {
    format!("semver-history-{}.json", clock::date_stamp(at))
}

/// Consistent state assembled from snapshot parts.
#[derive(Debug)]
pub(crate) struct Reconciled {
    pub current: Version,
    /// Newest first.
    pub commits: Vec<Commit>,
    /// Newest first.
    pub releases: Vec<Release>,
}

/// Normalize and cross-check the pieces of a snapshot.
///
/// Commits embedded in releases are forced to `released` with the release's
/// version. `unreleased` entries missing from `commits` are added at the
/// front of the history.
pub(crate) fn reconcile(
    current: Version,
    mut commits: Vec<Commit>,
    unreleased: Vec<Commit>,
    mut releases: Vec<Release>,
) -> SnapshotResult<Reconciled> {
    // Which release each shipped commit belongs to.
    let mut release_ids = HashSet::new();
    let mut shipped: HashMap<CommitId, Vec<Version>> = HashMap::new();
    for release in &mut releases {
        if !release_ids.insert(release.id.clone()) {
            return Err(SnapshotError::DuplicateRelease(release.id.clone()));
        }
        for commit in &mut release.commits {
            commit.released = true;
            commit.version_after = Some(release.version);
            shipped
                .entry(commit.id.clone())
                .or_default()
                .push(release.version);
        }
    }

    let mut seen = HashSet::new();
    for commit in &commits {
        if !seen.insert(commit.id.clone()) {
            return Err(SnapshotError::DuplicateCommit(commit.id.clone()));
        }
    }

    let mut missing = Vec::new();
    for commit in unreleased {
        if commit.released {
            return Err(SnapshotError::PendingMarkedReleased(commit.id));
        }
        match commits.iter().find(|c| c.id == commit.id) {
            Some(known) if known.released => {
                return Err(SnapshotError::PendingMarkedReleased(commit.id));
            }
            Some(_) => {}
            None if seen.insert(commit.id.clone()) => missing.push(commit),
            None => return Err(SnapshotError::DuplicateCommit(commit.id)),
        }
    }
    if !missing.is_empty() {
        debug!(count = missing.len(), "pending commits absent from history restored");
        missing.append(&mut commits);
        commits = missing;
    }

    for commit in &mut commits {
        let versions = shipped.get(&commit.id).map(Vec::as_slice).unwrap_or_default();
        if !commit.released {
            if !versions.is_empty() {
                return Err(SnapshotError::PendingInRelease(commit.id.clone()));
            }
            continue;
        }
        let [expected] = versions else {
            return Err(SnapshotError::ReleaseMembership {
                id: commit.id.clone(),
                count: versions.len(),
            });
        };
        match commit.version_after {
            Some(found) if found != *expected => {
                return Err(SnapshotError::VersionMismatch {
                    id: commit.id.clone(),
                    expected: *expected,
                    found,
                });
            }
            Some(_) => {}
            None => commit.version_after = Some(*expected),
        }
    }

    let pending = commits.iter().filter(|c| !c.released).map(|c| c.category);
    if let Some(bump) = version::highest_impact(pending) {
        if current.checked_bump(bump).is_none() {
            return Err(SnapshotError::VersionOverflow {
                version: current,
                bump,
            });
        }
    }

    Ok(Reconciled {
        current,
        commits,
        releases,
    })
}
