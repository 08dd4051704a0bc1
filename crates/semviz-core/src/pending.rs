//! Pending-set aggregation.
//!
//! [`PendingSummary::derive`] is the only way a summary is produced. The
//! project calls it after every mutation and after loading, and never
//! trusts counts that came from disk.

use serde::{Deserialize, Serialize};

use crate::commit::{Commit, CommitCategory};
use crate::version::{BumpLevel, Version, highest_impact, next_version};

/// Counts of impactful categories among pending commits.
///
/// Counts are informational: the next version depends only on which of
/// them are non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChanges {
    /// Pending breaking changes.
    pub breaking: usize,
    /// Pending features.
    pub feat: usize,
    /// Pending fixes.
    pub fix: usize,
}

impl PendingChanges {
    /// Tally categories.
    pub fn tally<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = CommitCategory>,
    {
        categories
            .into_iter()
            .fold(Self::default(), |mut acc, category| {
                match category {
                    CommitCategory::Breaking => acc.breaking += 1,
                    CommitCategory::Feat => acc.feat += 1,
                    CommitCategory::Fix => acc.fix += 1,
                    _ => {}
                }
                acc
            })
    }

    /// Whether nothing impactful is pending.
    pub const fn is_empty(&self) -> bool {
        self.breaking == 0 && self.feat == 0 && self.fix == 0
    }
}

/// Everything derived from the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSummary {
    /// Impactful category counts.
    pub changes: PendingChanges,
    /// Total pending commits, impactful or not.
    pub pending: usize,
    /// Highest bump among pending commits.
    pub bump: Option<BumpLevel>,
    /// Version a release would produce right now.
    pub next_version: Version,
}

impl PendingSummary {
    /// Summary of an empty pending set.
    pub const fn empty(current: Version) -> Self {
        Self {
            changes: PendingChanges {
                breaking: 0,
                feat: 0,
                fix: 0,
            },
            pending: 0,
            bump: None,
            next_version: current,
        }
    }

    /// Derive the summary for `pending` on top of `current`.
    pub fn derive<'a, I>(current: Version, pending: I) -> Self
    where
        I: IntoIterator<Item = &'a Commit>,
    {
        let categories: Vec<CommitCategory> = pending.into_iter().map(|c| c.category).collect();
        Self {
            changes: PendingChanges::tally(categories.iter().copied()),
            pending: categories.len(),
            bump: highest_impact(categories.iter().copied()),
            next_version: next_version(current, categories),
        }
    }
}
