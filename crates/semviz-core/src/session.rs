//! The interactive session: one task, several timers.
//!
//! [`Session::run`] owns the [`Project`] and multiplexes, with
//! `tokio::select!`:
//!
//! - user intents arriving on an mpsc channel,
//! - the auto-commit interval (period = base / speed multiplier, none when
//!   paused),
//! - the staged completion of an in-flight release,
//! - the debounced save,
//! - a [`CancellationToken`].
//!
//! Every handler runs to completion before the next event is polled, so the
//! project needs no locking. An [`Intent::Shutdown`] completes an in-flight
//! release without waiting out its delay, then flushes unsaved state.
//! Cancelling the token abandons the release and returns without saving.

use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::commit::{Commit, CommitCategory};
use crate::config::SimulationConfig;
use crate::generator::CommitGenerator;
use crate::project::Project;
use crate::release::{Release, ReleaseRejected, ReleaseTicket};
use crate::settings::{AnimationSpeed, BASE_INTERVAL, Preferences};
use crate::store::StateStore;

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Record a generated commit of this category.
    Commit(CommitCategory),
    /// Start a release of everything pending.
    Release,
    /// Change the auto-commit speed.
    SetSpeed(AnimationSpeed),
    /// Stop, finishing any in-flight release and saving first.
    Shutdown,
}

/// Why the session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// [`Intent::Shutdown`] was received.
    Shutdown,
    /// The cancellation token fired.
    Cancelled,
}

/// Progress reported by a running session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A commit was recorded.
    Committed {
        /// The commit.
        commit: Commit,
        /// Whether the auto-commit timer produced it.
        auto: bool,
    },
    /// A release began; it completes after the release delay.
    ReleaseStarted(ReleaseTicket),
    /// A release completed.
    Released(Release),
    /// A release request was not accepted.
    ReleaseIgnored(ReleaseRejected),
    /// An in-flight release was dropped on cancellation.
    ReleaseAbandoned(ReleaseTicket),
    /// The auto-commit speed changed.
    SpeedChanged(AnimationSpeed),
    /// State was written to the store.
    Saved,
    /// Writing state failed; the session keeps running.
    SaveFailed(String),
    /// The loop has ended.
    Stopped(StopReason),
}

/// Timer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Auto-commit period at normal speed.
    pub base_interval: Duration,
    /// Delay between starting and completing a release.
    pub release_delay: Duration,
    /// Quiet period before a save.
    pub save_debounce: Duration,
    /// Replaces the saved speed preference for this session.
    pub speed: Option<AnimationSpeed>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_interval: BASE_INTERVAL,
            release_delay: Duration::from_millis(1000),
            save_debounce: Duration::from_millis(1000),
            speed: None,
        }
    }
}

impl From<&SimulationConfig> for SessionOptions {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            base_interval: config.base_interval(),
            release_delay: config.release_delay(),
            save_debounce: config.save_debounce(),
            speed: config.speed,
        }
    }
}

/// Single-deadline save scheduler.
///
/// Every [`touch`](Self::touch) pushes the deadline out by the debounce
/// delay, so a burst of changes produces one save. Touches are ignored until
/// [`mark_loaded`](Self::mark_loaded); state that has not been loaded yet
/// must never overwrite what is on disk.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    loaded: bool,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    /// Debouncer with the given quiet period, not yet loaded.
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            loaded: false,
            deadline: None,
        }
    }

    /// Allow saves from now on.
    pub const fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Whether [`mark_loaded`](Self::mark_loaded) was called.
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Note a change at `now`. Returns whether a save is now scheduled.
    pub fn touch(&mut self, now: Instant) -> bool {
        if !self.loaded {
            debug!("change before load finished, not scheduling a save");
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// When the pending save is due.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a save is scheduled.
    pub const fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the scheduled save if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the scheduled save, if any.
    pub const fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Owner of the project while the interactive loop runs.
#[derive(Debug)]
pub struct Session<R = StdRng> {
    project: Project,
    generator: CommitGenerator<R>,
    store: Option<StateStore>,
    options: SessionOptions,
    saver: SaveDebouncer,
}

impl<R: Rng> Session<R> {
    /// Session over an already loaded project.
    pub fn new(project: Project, generator: CommitGenerator<R>, options: SessionOptions) -> Self {
        Self {
            project,
            generator,
            store: None,
            saver: SaveDebouncer::new(options.save_debounce),
            options,
        }
    }

    /// Persist to `store`. Without one, nothing is saved.
    #[must_use]
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    /// The project.
    pub const fn project(&self) -> &Project {
        &self.project
    }

    /// Run until shutdown or cancellation and hand the project back.
    #[instrument(skip_all)]
    pub async fn run<F>(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Project
    where
        F: FnMut(SessionEvent),
    {
        if let Some(speed) = self.options.speed {
            self.apply_speed(speed);
        }
        self.saver.mark_loaded();

        let mut ticker = self.ticker();
        let mut release_due: Option<Instant> = None;
        let mut listening = true;
        info!(
            speed = %self.project.preferences().animation_speed,
            version = %self.project.current_version(),
            "session started"
        );

        let reason = loop {
            let save_due = self.saver.deadline();
            tokio::select! {
                biased;

                () = cancel.cancelled() => break StopReason::Cancelled,

                intent = intents.recv(), if listening => match intent {
                    Some(Intent::Shutdown) => break StopReason::Shutdown,
                    Some(Intent::Commit(category)) => {
                        let draft = self.generator.draft(category, None, None);
                        let commit = self.project.record_commit(draft);
                        self.touch();
                        on_event(SessionEvent::Committed { commit, auto: false });
                    }
                    Some(Intent::Release) => match self.project.request_release() {
                        Ok(ticket) => {
                            on_event(SessionEvent::ReleaseStarted(ticket.clone()));
                            release_due = Some(Instant::now() + self.options.release_delay);
                        }
                        Err(rejected) => {
                            debug!(%rejected, "release request ignored");
                            on_event(SessionEvent::ReleaseIgnored(rejected));
                        }
                    },
                    Some(Intent::SetSpeed(speed)) => {
                        self.apply_speed(speed);
                        ticker = self.ticker();
                        self.touch();
                        on_event(SessionEvent::SpeedChanged(speed));
                    }
                    None => {
                        debug!("intent channel closed");
                        listening = false;
                    }
                },

                () = sleep_until_some(release_due) => {
                    release_due = None;
                    if let Some(release) = self.project.finish_release() {
                        let release = release.clone();
                        self.touch();
                        on_event(SessionEvent::Released(release));
                    }
                }

                () = next_tick(&mut ticker) => {
                    if let Some(draft) = self.generator.tick() {
                        let commit = self.project.record_commit(draft);
                        self.touch();
                        on_event(SessionEvent::Committed { commit, auto: true });
                    }
                }

                () = sleep_until_some(save_due) => {
                    if self.saver.take_due(Instant::now()) {
                        self.save(&mut on_event);
                    }
                }
            }
        };

        match reason {
            StopReason::Shutdown => {
                if let Some(release) = self.project.finish_release() {
                    let release = release.clone();
                    self.touch();
                    on_event(SessionEvent::Released(release));
                }
                if self.saver.cancel() {
                    self.save(&mut on_event);
                }
            }
            StopReason::Cancelled => {
                if let Some(ticket) = self.project.cancel_release() {
                    on_event(SessionEvent::ReleaseAbandoned(ticket));
                }
                if self.saver.cancel() {
                    warn!("session cancelled with unsaved changes");
                }
            }
        }
        info!(?reason, "session stopped");
        on_event(SessionEvent::Stopped(reason));
        self.project
    }

    fn apply_speed(&mut self, speed: AnimationSpeed) {
        let preferences = Preferences {
            animation_speed: speed,
            ..*self.project.preferences()
        };
        self.project.set_preferences(preferences);
    }

    fn ticker(&self) -> Option<Interval> {
        let period = self
            .project
            .preferences()
            .animation_speed
            .period(self.options.base_interval)?;
        debug!(?period, "auto-commit timer armed");
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }

    fn touch(&mut self) {
        if self.store.is_some() {
            self.saver.touch(Instant::now());
        }
    }

    fn save<F>(&self, on_event: &mut F)
    where
        F: FnMut(SessionEvent),
    {
        let Some(store) = &self.store else {
            return;
        };
        match store.save(&self.project) {
            Ok(()) => on_event(SessionEvent::Saved),
            Err(e) => {
                warn!(error = %e, "failed to save state");
                on_event(SessionEvent::SaveFailed(e.to_string()));
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
