//! The state container.
//!
//! [`Project`] owns every piece of mutable state: the current version, the
//! ledger, the release list, the release engine and the preferences. Its
//! methods are the only mutation surface. After each one the pending
//! summary is re-derived from the ledger, so readers always see counts and a
//! next version that match the pending commits.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::clock::{self, Timestamp};
use crate::commit::{Commit, CommitCategory};
use crate::generator::Draft;
use crate::ledger::{DEFAULT_RETENTION, Ledger};
use crate::pending::{PendingChanges, PendingSummary};
use crate::release::{Release, ReleaseEngine, ReleasePhase, ReleaseRejected, ReleaseTicket};
use crate::settings::Preferences;
use crate::snapshot::{self, Snapshot, SnapshotResult};
use crate::version::{BumpLevel, Version};

/// Read-only view of the figures a front-end displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Current version.
    pub current_version: Version,
    /// Version the pending commits would produce.
    pub next_version: Version,
    /// Bump level of the pending commits.
    pub bump: Option<BumpLevel>,
    /// Impactful pending counts.
    pub pending_changes: PendingChanges,
    /// All pending commits.
    pub pending_commits: usize,
    /// Whether a release is in flight.
    pub releasing: bool,
    /// Number of releases so far.
    pub releases: usize,
    /// Preferences.
    pub preferences: Preferences,
}

/// What [`Project::import`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Commits now in the history.
    pub commits: usize,
    /// Releases now in the list.
    pub releases: usize,
    /// Pending commits from the file that were dropped.
    pub discarded_pending: usize,
    /// Current version after import.
    pub current_version: Version,
}

/// Single owner of all simulator state.
#[derive(Debug, Clone)]
pub struct Project {
    current: Version,
    ledger: Ledger,
    /// Newest first.
    releases: Vec<Release>,
    engine: ReleaseEngine,
    preferences: Preferences,
    summary: PendingSummary,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl Project {
    /// Fresh project at [`Version::INITIAL`].
    pub fn new(retention: usize) -> Self {
        Self::starting_at(Version::INITIAL, retention)
    }

    /// Fresh project at an arbitrary baseline.
    pub fn starting_at(version: Version, retention: usize) -> Self {
        Self {
            current: version,
            ledger: Ledger::with_retention(retention),
            releases: Vec::new(),
            engine: ReleaseEngine::default(),
            preferences: Preferences::default(),
            summary: PendingSummary::empty(version),
        }
    }

    // ── Accessors ──

    /// Current version.
    pub const fn current_version(&self) -> Version {
        self.current
    }

    /// Version a release would produce now.
    pub const fn next_version(&self) -> Version {
        self.summary.next_version
    }

    /// Derived pending summary.
    pub const fn summary(&self) -> &PendingSummary {
        &self.summary
    }

    /// Commit history.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Pending commits, oldest first.
    pub fn unreleased(&self) -> impl Iterator<Item = &Commit> {
        self.ledger.unreleased()
    }

    /// Releases, newest first.
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    /// Release engine phase.
    pub const fn release_phase(&self) -> &ReleasePhase {
        self.engine.phase()
    }

    /// Preferences.
    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Snapshot of the displayed figures.
    pub fn dashboard(&self) -> Dashboard {
        Dashboard {
            current_version: self.current,
            next_version: self.summary.next_version,
            bump: self.summary.bump,
            pending_changes: self.summary.changes,
            pending_commits: self.summary.pending,
            releasing: self.engine.is_releasing(),
            releases: self.releases.len(),
            preferences: self.preferences,
        }
    }

    // ── Mutations ──

    /// Record a commit against the current version.
    #[instrument(skip_all, fields(category = %draft.category))]
    pub fn record_commit(&mut self, draft: Draft) -> Commit {
        self.record_commit_at(draft, clock::now())
    }

    pub(crate) fn record_commit_at(&mut self, draft: Draft, timestamp: Timestamp) -> Commit {
        let Draft {
            category,
            message,
            author,
        } = draft;
        let commit = self
            .ledger
            .record_at(category, message, author, self.current, timestamp)
            .clone();
        self.refresh();
        info!(id = %commit.id, next = %self.summary.next_version, pending = self.summary.pending, "commit added");
        commit
    }

    /// Shorthand for recording a commit with explicit content.
    pub fn commit(
        &mut self,
        category: CommitCategory,
        message: impl Into<String>,
        author: impl Into<String>,
    ) -> Commit {
        self.record_commit(Draft {
            category,
            message: message.into(),
            author: author.into(),
        })
    }

    /// `Idle → Releasing`: freeze the pending set.
    pub fn request_release(&mut self) -> Result<&ReleaseTicket, ReleaseRejected> {
        self.engine.begin(self.current, &self.summary, &self.ledger)
    }

    /// `Releasing → Idle`: apply the frozen release.
    ///
    /// Returns `None` when no release is in flight.
    pub fn finish_release(&mut self) -> Option<&Release> {
        let release = self.engine.complete(&mut self.ledger)?;
        self.current = release.version;
        self.releases.insert(0, release);
        self.refresh();
        self.releases.first()
    }

    /// Abandon the in-flight release. Its commits stay pending.
    pub fn cancel_release(&mut self) -> Option<ReleaseTicket> {
        self.engine.abort()
    }

    /// Begin and finish a release in one step.
    pub fn release_now(&mut self) -> Result<&Release, ReleaseRejected> {
        self.request_release()?;
        self.finish_release().ok_or(ReleaseRejected::NothingPending)
    }

    /// Reset to a fresh project, keeping preferences and retention.
    #[instrument(skip_all)]
    pub fn clear(&mut self) {
        self.engine.abort();
        self.ledger.clear();
        self.releases.clear();
        self.current = Version::INITIAL;
        self.refresh();
        info!("all data cleared");
    }

    /// Replace preferences.
    pub const fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    /// Re-derive the pending summary from the ledger.
    fn refresh(&mut self) {
        self.summary = PendingSummary::derive(self.current, self.ledger.unreleased());
    }

    // ── Snapshots ──

    /// Full persisted state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_version: Some(self.current),
            all_commits: Some(self.ledger.to_vec()),
            unreleased_commits: Some(self.ledger.iter().filter(|c| c.is_pending()).cloned().collect()),
            releases: Some(self.releases.clone()),
            dark_mode: Some(self.preferences.dark_mode),
            sound_enabled: Some(self.preferences.sound_enabled),
            animation_speed: Some(self.preferences.animation_speed),
            export_date: None,
        }
    }

    /// Export document: history only, stamped with the export time.
    pub fn export(&self) -> Snapshot {
        self.export_at(clock::now())
    }

    pub(crate) fn export_at(&self, now: Timestamp) -> Snapshot {
        Snapshot {
            current_version: Some(self.current),
            all_commits: Some(self.ledger.to_vec()),
            unreleased_commits: None,
            releases: Some(self.releases.clone()),
            dark_mode: None,
            sound_enabled: None,
            animation_speed: None,
            export_date: Some(now),
        }
    }

    /// Rebuild a project from persisted state.
    ///
    /// Absent fields take their defaults. Derived figures are recomputed,
    /// never read from the snapshot.
    #[instrument(skip_all)]
    pub fn restore(snapshot: Snapshot, retention: usize) -> SnapshotResult<Self> {
        let defaults = Preferences::default();
        let preferences = Preferences {
            dark_mode: snapshot.dark_mode.unwrap_or(defaults.dark_mode),
            sound_enabled: snapshot.sound_enabled.unwrap_or(defaults.sound_enabled),
            animation_speed: snapshot.animation_speed.unwrap_or(defaults.animation_speed),
        };
        let parts = snapshot::reconcile(
            snapshot.current_version.unwrap_or(Version::INITIAL),
            snapshot.all_commits.unwrap_or_default(),
            snapshot.unreleased_commits.unwrap_or_default(),
            snapshot.releases.unwrap_or_default(),
        )?;
        Ok(Self::assemble(parts, preferences, retention))
    }

    /// Replace history with an imported document.
    ///
    /// Fields present in the document replace the current ones; absent ones
    /// are kept. Pending commits are discarded either way. On error `self`
    /// is left untouched.
    #[instrument(skip_all)]
    pub fn import(&mut self, document: Snapshot) -> SnapshotResult<ImportSummary> {
        let current = document.current_version.unwrap_or(self.current);
        let mut commits = document.all_commits.unwrap_or_else(|| self.ledger.to_vec());
        let before = commits.len();
        commits.retain(|c| c.released);
        let discarded_pending = before - commits.len();
        let releases = document.releases.unwrap_or_else(|| self.releases.clone());

        let parts = snapshot::reconcile(current, commits, Vec::new(), releases)?;
        let retention = self.ledger.retention();
        *self = Self::assemble(parts, self.preferences, retention);

        if discarded_pending > 0 {
            warn!(discarded_pending, "pending commits dropped on import");
        }
        let summary = ImportSummary {
            commits: self.ledger.len(),
            releases: self.releases.len(),
            discarded_pending,
            current_version: self.current,
        };
        info!(?summary, "history imported");
        Ok(summary)
    }

    fn assemble(parts: snapshot::Reconciled, preferences: Preferences, retention: usize) -> Self {
        let mut engine = ReleaseEngine::default();
        engine.reseed(&parts.releases);
        let mut project = Self {
            current: parts.current,
            ledger: Ledger::from_commits(parts.commits, retention),
            releases: parts.releases,
            engine,
            preferences,
            summary: PendingSummary::empty(parts.current),
        };
        project.refresh();
        project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AnimationSpeed;
    use CommitCategory::*;

    fn add(project: &mut Project, category: CommitCategory) {
        project.commit(category, format!("{category}: change"), "Mike Wilson");
    }

    #[test]
    fn scenario_a_feat_then_release() {
        let mut project = Project::default();
        assert_eq!(project.current_version(), Version::new(0, 1, 0));

        add(&mut project, Feat);
        assert_eq!(project.next_version(), Version::new(0, 2, 0));

        let release = project.release_now().unwrap().clone();
        assert_eq!(release.version, Version::new(0, 2, 0));
        assert_eq!(release.commits.len(), 1);
        assert_eq!(project.current_version(), Version::new(0, 2, 0));
        assert_eq!(project.releases().len(), 1);
        assert_eq!(project.unreleased().count(), 0);
        assert_eq!(project.summary().changes, PendingChanges::default());
    }

    #[test]
    fn scenario_b_breaking_dominates() {
        let mut project = Project::starting_at(Version::new(1, 2, 3), DEFAULT_RETENTION);
        add(&mut project, Fix);
        add(&mut project, Breaking);
        assert_eq!(project.next_version(), Version::new(2, 0, 0));
        project.release_now().unwrap();
        assert_eq!(project.current_version(), Version::new(2, 0, 0));
    }

    #[test]
    fn scenario_c_counts_without_magnitude() {
        let mut project = Project::default();
        for _ in 0..3 {
            add(&mut project, Fix);
        }
        assert_eq!(
            project.summary().changes,
            PendingChanges {
                breaking: 0,
                feat: 0,
                fix: 3
            }
        );
        assert_eq!(project.next_version(), Version::new(0, 1, 1));
    }

    #[test]
    fn scenario_d_empty_release_is_ignored() {
        let mut project = Project::default();
        assert_eq!(
            project.release_now().map(|r| r.version),
            Err(ReleaseRejected::NothingPending)
        );
        assert!(project.releases().is_empty());
        assert_eq!(project.current_version(), Version::INITIAL);
    }

    #[test]
    fn release_invariant_holds() {
        let mut project = Project::default();
        add(&mut project, Fix);
        add(&mut project, Docs);
        add(&mut project, Feat);
        let pending: Vec<_> = project.unreleased().map(|c| c.id.clone()).collect();

        let version = project.release_now().unwrap().version;
        assert_eq!(project.current_version(), version);
        assert_eq!(project.unreleased().count(), 0);
        for id in &pending {
            let commit = project.ledger().get(id).unwrap();
            assert!(commit.released);
            assert_eq!(commit.version_after, Some(version));
        }
        let shipped: Vec<_> = project.releases()[0]
            .commits
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(shipped, pending);
    }

    #[test]
    fn commits_during_release_wait_for_the_next_one() {
        let mut project = Project::default();
        add(&mut project, Feat);
        let ticket = project.request_release().unwrap().clone();
        assert_eq!(ticket.version, Version::new(0, 2, 0));
        assert!(project.dashboard().releasing);
        assert_eq!(project.request_release(), Err(ReleaseRejected::InFlight));

        add(&mut project, Fix);
        // Still computed against the pre-release version until it lands.
        assert_eq!(project.unreleased().count(), 2);

        let release = project.finish_release().unwrap();
        assert_eq!(release.version, Version::new(0, 2, 0));
        assert_eq!(release.commits.len(), 1);

        assert_eq!(project.current_version(), Version::new(0, 2, 0));
        assert_eq!(project.unreleased().count(), 1);
        assert_eq!(project.next_version(), Version::new(0, 2, 1));
        assert_eq!(project.summary().changes.fix, 1);
    }

    #[test]
    fn non_impactful_release_keeps_version() {
        let mut project = Project::starting_at(Version::new(1, 0, 0), DEFAULT_RETENTION);
        add(&mut project, Docs);
        let release = project.release_now().unwrap();
        assert_eq!(release.version, Version::new(1, 0, 0));
        assert_eq!(project.current_version(), Version::new(1, 0, 0));
    }

    #[test]
    fn clear_resets_everything_but_preferences() {
        let mut project = Project::default();
        project.set_preferences(Preferences {
            dark_mode: false,
            sound_enabled: true,
            animation_speed: AnimationSpeed::Fast,
        });
        add(&mut project, Breaking);
        project.release_now().unwrap();
        add(&mut project, Fix);
        project.request_release().unwrap();

        project.clear();
        assert_eq!(project.current_version(), Version::INITIAL);
        assert!(project.ledger().is_empty());
        assert!(project.releases().is_empty());
        assert!(!project.dashboard().releasing);
        assert_eq!(project.next_version(), Version::INITIAL);
        assert_eq!(project.preferences().animation_speed, AnimationSpeed::Fast);
    }

    #[test]
    fn restore_recomputes_derived_state() {
        let mut project = Project::default();
        add(&mut project, Fix);
        project.release_now().unwrap();
        add(&mut project, Feat);
        add(&mut project, Chore);

        let restored = Project::restore(project.snapshot(), DEFAULT_RETENTION).unwrap();
        assert_eq!(restored.current_version(), Version::new(0, 1, 1));
        assert_eq!(restored.next_version(), Version::new(0, 2, 0));
        assert_eq!(restored.summary(), project.summary());
        assert_eq!(restored.releases(), project.releases());
        assert_eq!(restored.ledger().to_vec(), project.ledger().to_vec());
    }

    #[test]
    fn import_discards_pending_and_keeps_preferences() {
        let mut source = Project::default();
        add(&mut source, Feat);
        source.release_now().unwrap();
        add(&mut source, Fix);
        let document = source.export();

        let mut target = Project::default();
        target.set_preferences(Preferences {
            dark_mode: false,
            ..Preferences::default()
        });
        add(&mut target, Breaking);

        let summary = target.import(document).unwrap();
        assert_eq!(summary.discarded_pending, 1);
        assert_eq!(summary.commits, 1);
        assert_eq!(summary.releases, 1);
        assert_eq!(target.current_version(), Version::new(0, 2, 0));
        assert_eq!(target.unreleased().count(), 0);
        assert_eq!(target.next_version(), Version::new(0, 2, 0));
        assert!(!target.preferences().dark_mode);
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let mut project = Project::default();
        add(&mut project, Feat);
        let before = project.snapshot();

        // Released commit that no release accounts for.
        let mut bogus = project.export();
        if let Some(commits) = bogus.all_commits.as_mut() {
            commits[0].released = true;
            commits[0].version_after = Some(Version::new(9, 0, 0));
        }
        assert!(project.import(bogus).is_err());
        assert_eq!(project.snapshot(), before);
    }

    #[test]
    fn ids_after_restore_sort_after_existing() {
        let mut project = Project::default();
        add(&mut project, Fix);
        let existing: u64 = project.ledger().iter().next().unwrap().id.as_str().parse().unwrap();

        let mut restored = Project::restore(project.snapshot(), DEFAULT_RETENTION).unwrap();
        add(&mut restored, Fix);
        let newest: u64 = restored.ledger().iter().next().unwrap().id.as_str().parse().unwrap();
        assert!(newest > existing);
    }
}
