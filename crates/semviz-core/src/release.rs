//! Release records and the release state machine.
//!
//! # Two-phase release
//!
//! 1. **Begin** ([`ReleaseEngine::begin`]) — `Idle → Releasing`. Freezes the
//!    produced version and the ids of the commits pending at that instant.
//! 2. **Complete** ([`ReleaseEngine::complete`]) — marks exactly those
//!    commits released, builds the [`Release`] record and returns to `Idle`.
//!
//! Front-ends that animate a release call the two halves with a delay in
//! between. Commits recorded in that window are not part of the ticket and
//! stay pending for the next release.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::clock::{self, Timestamp};
use crate::commit::{Commit, CommitId, IdSequence};
use crate::ledger::Ledger;
use crate::pending::PendingSummary;
use crate::version::{BumpLevel, Version};

/// One completed release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Unique id.
    pub id: CommitId,
    /// Version produced by this release.
    #[serde(with = "crate::version::text")]
    pub version: Version,
    /// When the release completed.
    #[serde(with = "crate::clock::iso")]
    pub timestamp: Timestamp,
    /// Commits shipped, in creation order.
    pub commits: Vec<Commit>,
}

impl Release {
    /// Whether `id` shipped in this release.
    pub fn contains(&self, id: &CommitId) -> bool {
        self.commits.iter().any(|c| &c.id == id)
    }
}

/// Why a release request was not accepted.
///
/// Neither case is a failure; callers typically just report it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRejected {
    /// There is nothing pending.
    #[error("nothing to release: no pending commits")]
    NothingPending,

    /// A release is already in flight.
    #[error("a release is already in progress")]
    InFlight,
}

/// The frozen part of an in-flight release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseTicket {
    /// Version being released from.
    pub previous: Version,
    /// Version the release will produce.
    pub version: Version,
    /// Highest bump level in the frozen set.
    pub bump: Option<BumpLevel>,
    /// Commits included, in creation order.
    pub commits: Vec<CommitId>,
}

/// Release state machine phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReleasePhase {
    /// No release in flight.
    #[default]
    Idle,
    /// A release has begun and not yet completed.
    Releasing(ReleaseTicket),
}

/// `Idle → Releasing → Idle`.
#[derive(Debug, Clone, Default)]
pub struct ReleaseEngine {
    phase: ReleasePhase,
    ids: IdSequence,
}

impl ReleaseEngine {
    /// Current phase.
    pub const fn phase(&self) -> &ReleasePhase {
        &self.phase
    }

    /// Whether a release is in flight.
    pub const fn is_releasing(&self) -> bool {
        matches!(self.phase, ReleasePhase::Releasing(_))
    }

    /// Make future release ids sort after the existing ones.
    pub(crate) fn reseed<'a>(&mut self, existing: impl IntoIterator<Item = &'a Release>) {
        self.ids.reseed(existing.into_iter().map(|r| &r.id));
    }

    /// Start a release of everything pending in `ledger`.
    ///
    /// `summary` must be the summary derived from `ledger` on top of
    /// `current`; its next version becomes the produced version.
    #[instrument(skip_all, fields(%current))]
    pub fn begin(
        &mut self,
        current: Version,
        summary: &PendingSummary,
        ledger: &Ledger,
    ) -> Result<&ReleaseTicket, ReleaseRejected> {
        if self.is_releasing() {
            debug!("release already in flight");
            return Err(ReleaseRejected::InFlight);
        }
        let commits: Vec<CommitId> = ledger.unreleased().map(|c| c.id.clone()).collect();
        if commits.is_empty() {
            debug!("nothing pending");
            return Err(ReleaseRejected::NothingPending);
        }

        info!(
            version = %summary.next_version,
            commits = commits.len(),
            "release started"
        );
        self.phase = ReleasePhase::Releasing(ReleaseTicket {
            previous: current,
            version: summary.next_version,
            bump: summary.bump,
            commits,
        });
        match &self.phase {
            ReleasePhase::Releasing(ticket) => Ok(ticket),
            ReleasePhase::Idle => Err(ReleaseRejected::NothingPending),
        }
    }

    /// Finish the in-flight release, if any.
    pub fn complete(&mut self, ledger: &mut Ledger) -> Option<Release> {
        self.complete_at(ledger, clock::now())
    }

    pub(crate) fn complete_at(&mut self, ledger: &mut Ledger, now: Timestamp) -> Option<Release> {
        let ReleasePhase::Releasing(ticket) = std::mem::take(&mut self.phase) else {
            return None;
        };

        let commits: Vec<Commit> = ticket
            .commits
            .iter()
            .filter_map(|id| ledger.mark_released(id, ticket.version))
            .collect();
        ledger.enforce_retention();

        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let release = Release {
            id: self.ids.next_at(millis),
            version: ticket.version,
            timestamp: now,
            commits,
        };
        info!(
            id = %release.id,
            version = %release.version,
            commits = release.commits.len(),
            "release completed"
        );
        Some(release)
    }

    /// Drop any in-flight release without applying it.
    pub fn abort(&mut self) -> Option<ReleaseTicket> {
        match std::mem::take(&mut self.phase) {
            ReleasePhase::Releasing(ticket) => {
                info!(version = %ticket.version, "in-flight release abandoned");
                Some(ticket)
            }
            ReleasePhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitCategory;

    fn record(ledger: &mut Ledger, category: CommitCategory, current: Version) -> CommitId {
        ledger
            .record(category, format!("{category}: x"), "Sarah Johnson".into(), current)
            .id
            .clone()
    }

    fn summary(ledger: &Ledger, current: Version) -> PendingSummary {
        PendingSummary::derive(current, ledger.unreleased())
    }

    #[test]
    fn empty_pending_is_rejected() {
        let ledger = Ledger::default();
        let mut engine = ReleaseEngine::default();
        let current = Version::INITIAL;
        assert_eq!(
            engine.begin(current, &summary(&ledger, current), &ledger),
            Err(ReleaseRejected::NothingPending)
        );
        assert_eq!(engine.phase(), &ReleasePhase::Idle);
    }

    #[test]
    fn second_begin_is_rejected_while_in_flight() {
        let mut ledger = Ledger::default();
        let current = Version::INITIAL;
        record(&mut ledger, CommitCategory::Fix, current);
        let mut engine = ReleaseEngine::default();
        let s = summary(&ledger, current);
        assert!(engine.begin(current, &s, &ledger).is_ok());
        assert_eq!(
            engine.begin(current, &s, &ledger),
            Err(ReleaseRejected::InFlight)
        );
    }

    #[test]
    fn complete_marks_frozen_commits_only() {
        let mut ledger = Ledger::default();
        let current = Version::new(1, 2, 3);
        let a = record(&mut ledger, CommitCategory::Fix, current);
        let b = record(&mut ledger, CommitCategory::Feat, current);

        let mut engine = ReleaseEngine::default();
        let ticket = engine
            .begin(current, &summary(&ledger, current), &ledger)
            .unwrap()
            .clone();
        assert_eq!(ticket.version, Version::new(1, 3, 0));
        assert_eq!(ticket.commits, vec![a.clone(), b.clone()]);

        // Arrives mid-release: must wait for the next one.
        let late = record(&mut ledger, CommitCategory::Breaking, current);

        let release = engine.complete(&mut ledger).unwrap();
        assert!(!engine.is_releasing());
        assert_eq!(release.version, Version::new(1, 3, 0));
        let shipped: Vec<_> = release.commits.iter().map(|c| c.id.clone()).collect();
        assert_eq!(shipped, vec![a.clone(), b]);
        assert!(release.commits.iter().all(|c| c.released
            && c.version_after == Some(Version::new(1, 3, 0))));

        let still_pending: Vec<_> = ledger.unreleased().map(|c| c.id.clone()).collect();
        assert_eq!(still_pending, vec![late]);
        assert!(ledger.get(&a).unwrap().released);
    }

    #[test]
    fn complete_without_begin_is_none() {
        let mut ledger = Ledger::default();
        let mut engine = ReleaseEngine::default();
        assert!(engine.complete(&mut ledger).is_none());
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut ledger = Ledger::default();
        let current = Version::INITIAL;
        record(&mut ledger, CommitCategory::Docs, current);
        let mut engine = ReleaseEngine::default();
        engine
            .begin(current, &summary(&ledger, current), &ledger)
            .unwrap();
        assert!(engine.abort().is_some());
        assert!(!engine.is_releasing());
        assert!(engine.complete(&mut ledger).is_none());
        assert_eq!(ledger.unreleased_len(), 1);
    }

    #[test]
    fn release_ids_increase() {
        let mut ledger = Ledger::default();
        let mut engine = ReleaseEngine::default();
        let mut current = Version::INITIAL;
        let mut ids = Vec::new();
        for _ in 0..3 {
            record(&mut ledger, CommitCategory::Fix, current);
            engine
                .begin(current, &summary(&ledger, current), &ledger)
                .unwrap();
            let release = engine.complete(&mut ledger).unwrap();
            current = release.version;
            ids.push(release.id.as_str().parse::<u64>().unwrap());
        }
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(current, Version::new(0, 1, 3));
    }
}
