//! The commit ledger: every commit recorded, newest first.
//!
//! The pending set is not stored separately. It is the ledger filtered on
//! `released == false`, which is what keeps it from ever disagreeing with
//! the commits' own flags.

use std::collections::VecDeque;

use tracing::debug;

use crate::clock::{self, Timestamp};
use crate::commit::{Commit, CommitCategory, CommitId, IdSequence};
use crate::version::Version;

/// Default number of commits kept in the history view.
pub const DEFAULT_RETENTION: usize = 100;

/// Append-only commit log.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Newest first.
    commits: VecDeque<Commit>,
    ids: IdSequence,
    retention: usize,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl Ledger {
    /// Empty ledger keeping at most `retention` commits in its history.
    ///
    /// A retention of zero is treated as one.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            commits: VecDeque::new(),
            ids: IdSequence::default(),
            retention: retention.max(1),
        }
    }

    /// Rebuild a ledger from persisted commits (newest first).
    pub(crate) fn from_commits(commits: Vec<Commit>, retention: usize) -> Self {
        let mut ledger = Self::with_retention(retention);
        ledger.ids.reseed(commits.iter().map(|c| &c.id));
        ledger.commits = commits.into();
        ledger.enforce_retention();
        ledger
    }

    /// Record a new pending commit against `current`.
    pub fn record(
        &mut self,
        category: CommitCategory,
        message: String,
        author: String,
        current: Version,
    ) -> &Commit {
        self.record_at(category, message, author, current, clock::now())
    }

    pub(crate) fn record_at(
        &mut self,
        category: CommitCategory,
        message: String,
        author: String,
        current: Version,
        timestamp: Timestamp,
    ) -> &Commit {
        let millis = u64::try_from(timestamp.timestamp_millis()).unwrap_or_default();
        let commit = Commit {
            id: self.ids.next_at(millis),
            category,
            message,
            author,
            timestamp,
            version_before: current,
            version_after: None,
            released: false,
        };
        debug!(id = %commit.id, %category, "commit recorded");
        self.commits.push_front(commit);
        self.enforce_retention();
        &self.commits[0]
    }

    /// All retained commits, newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Commit> + ExactSizeIterator {
        self.commits.iter()
    }

    /// Pending commits in creation order (oldest first).
    pub fn unreleased(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter().rev().filter(|c| c.is_pending())
    }

    /// Number of pending commits.
    pub fn unreleased_len(&self) -> usize {
        self.commits.iter().filter(|c| c.is_pending()).count()
    }

    /// Look a commit up by id.
    pub fn get(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.iter().find(|c| &c.id == id)
    }

    /// Number of retained commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the ledger holds no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Configured retention.
    pub const fn retention(&self) -> usize {
        self.retention
    }

    /// Mark one pending commit as released in `version`.
    ///
    /// Returns a copy of the updated commit, or `None` if the id is unknown
    /// or already released.
    pub(crate) fn mark_released(&mut self, id: &CommitId, version: Version) -> Option<Commit> {
        let commit = self.commits.iter_mut().find(|c| &c.id == id)?;
        commit.mark_released(version).then(|| commit.clone())
    }

    /// Drop released commits beyond the retention limit.
    ///
    /// Pending commits are never evicted, so the history may temporarily
    /// exceed the limit while more than `retention` commits are pending.
    pub(crate) fn enforce_retention(&mut self) {
        let mut excess = self.commits.len().saturating_sub(self.retention);
        if excess == 0 {
            return;
        }
        let before = self.commits.len();
        let mut idx = self.commits.len();
        while excess > 0 && idx > 0 {
            idx -= 1;
            if self.commits[idx].released {
                self.commits.remove(idx);
                excess -= 1;
            }
        }
        debug!(
            evicted = before - self.commits.len(),
            retained = self.commits.len(),
            "history trimmed"
        );
    }

    /// Forget everything. Ids keep increasing.
    pub fn clear(&mut self) {
        self.commits.clear();
    }

    /// Snapshot of the retained commits, newest first.
    pub(crate) fn to_vec(&self) -> Vec<Commit> {
        self.commits.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ledger: &mut Ledger, category: CommitCategory) -> CommitId {
        ledger
            .record(
                category,
                format!("{category}: something"),
                "Tom Brown".into(),
                Version::INITIAL,
            )
            .id
            .clone()
    }

    #[test]
    fn record_prepends_and_stays_pending() {
        let mut ledger = Ledger::default();
        let first = record(&mut ledger, CommitCategory::Fix);
        let second = record(&mut ledger, CommitCategory::Feat);

        let ids: Vec<_> = ledger.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![second.clone(), first.clone()]);
        let (a, b): (u64, u64) = (first.as_str().parse().unwrap(), second.as_str().parse().unwrap());
        assert!(a < b);

        let pending: Vec<_> = ledger.unreleased().map(|c| c.id.clone()).collect();
        assert_eq!(pending, vec![first, second], "creation order");
        assert_eq!(ledger.unreleased_len(), 2);
    }

    #[test]
    fn record_captures_version_before() {
        let mut ledger = Ledger::default();
        let commit = ledger.record(
            CommitCategory::Docs,
            "docs: update API documentation".into(),
            "Lisa Anderson".into(),
            Version::new(4, 5, 6),
        );
        assert_eq!(commit.version_before, Version::new(4, 5, 6));
        assert!(!commit.released);
        assert!(commit.version_after.is_none());
    }

    #[test]
    fn retention_evicts_only_released() {
        let mut ledger = Ledger::with_retention(3);
        let a = record(&mut ledger, CommitCategory::Fix);
        let b = record(&mut ledger, CommitCategory::Fix);
        ledger.mark_released(&a, Version::new(0, 1, 1));
        ledger.mark_released(&b, Version::new(0, 1, 1));

        for _ in 0..3 {
            record(&mut ledger, CommitCategory::Chore);
        }
        assert_eq!(ledger.len(), 3);
        assert!(ledger.get(&a).is_none());
        assert!(ledger.get(&b).is_none());

        // Pending commits survive even past the limit.
        record(&mut ledger, CommitCategory::Chore);
        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger.unreleased_len(), 4);
    }

    #[test]
    fn mark_released_once() {
        let mut ledger = Ledger::default();
        let id = record(&mut ledger, CommitCategory::Feat);
        let released = ledger.mark_released(&id, Version::new(0, 2, 0)).unwrap();
        assert!(released.released);
        assert_eq!(released.version_after, Some(Version::new(0, 2, 0)));
        assert!(ledger.mark_released(&id, Version::new(0, 3, 0)).is_none());
        assert_eq!(ledger.unreleased().count(), 0);
    }

    #[test]
    fn ids_keep_increasing_after_clear() {
        let mut ledger = Ledger::default();
        let before = record(&mut ledger, CommitCategory::Fix);
        ledger.clear();
        assert!(ledger.is_empty());
        let after = record(&mut ledger, CommitCategory::Fix);
        let before: u64 = before.as_str().parse().unwrap();
        let after: u64 = after.as_str().parse().unwrap();
        assert!(after > before);
    }
}
