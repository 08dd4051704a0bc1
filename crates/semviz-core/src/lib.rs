//! Core library for semviz, a semantic-versioning visualizer.
//!
//! Commits of eight conventional categories accumulate in a ledger; the
//! pending ones determine the next version; a release ships them and moves
//! the current version forward. Everything else (persistence, timers,
//! configuration) exists to drive that loop.
//!
//! # Modules
//!
//! - [`version`] - Version arithmetic and bump precedence
//! - [`commit`] - Commit categories, ids and records
//! - [`ledger`] - Commit history and the pending view
//! - [`pending`] - Derived counts and next version
//! - [`release`] - Release records and the two-phase release engine
//! - [`project`] - The state container tying them together
//! - [`snapshot`] - JSON persistence/export document
//! - [`store`] - State file on disk
//! - [`generator`] - Synthetic commit content
//! - [`settings`] - Preferences and simulation speed
//! - [`clock`] - Timestamps and their wire format
//! - [`session`] - Async loop with auto-commit and save timers
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error type
//!
//! # Quick Start
//!
//! ```
//! use semviz_core::{CommitCategory, Project, Version};
//!
//! let mut project = Project::default();
//! project.commit(CommitCategory::Feat, "feat: add user dashboard", "Alex Chen");
//! assert_eq!(project.next_version(), Version::new(0, 2, 0));
//!
//! let release = project.release_now().unwrap();
//! assert_eq!(release.version, Version::new(0, 2, 0));
//! ```
#![deny(unsafe_code)]

pub mod clock;

pub mod commit;

pub mod config;

pub mod error;

pub mod generator;

pub mod ledger;

pub mod pending;

pub mod project;

pub mod release;

pub mod session;

pub mod settings;

pub mod snapshot;

pub mod store;

pub mod version;

pub use commit::{Commit, CommitCategory, CommitId};
pub use config::{Config, ConfigLoader, LogLevel};
pub use error::{ConfigError, ConfigResult};
pub use generator::CommitGenerator;
pub use project::{Dashboard, ImportSummary, Project};
pub use release::{Release, ReleaseRejected};
pub use settings::{AnimationSpeed, Preferences};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::{LoadOrigin, StateStore, StoreError};
pub use version::{BumpLevel, Version};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
