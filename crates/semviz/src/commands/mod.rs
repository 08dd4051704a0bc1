//! Command implementations

pub mod clear;

pub mod commit;

pub mod doctor;

pub mod history;

pub mod info;

pub mod log;

pub mod release;

pub mod settings;

pub mod simulate;

pub mod status;

pub mod transfer;

use anyhow::Context;
use owo_colors::OwoColorize;
use serde::Serialize;

use semviz_core::project::Project;
use semviz_core::store::{LoadOrigin, StateStore};

/// Load the project, telling the user when a corrupt state file was skipped.
pub fn load_project(store: &StateStore) -> anyhow::Result<Project> {
    let outcome = store
        .load()
        .with_context(|| format!("failed to read state from {}", store.path()))?;
    if let LoadOrigin::Recovered { reason } = &outcome.origin {
        eprintln!(
            "{} ignoring unreadable state file {}: {}",
            "warning:".yellow().bold(),
            store.path(),
            reason.dimmed()
        );
    }
    Ok(outcome.project)
}

/// Persist the project.
pub fn save_project(store: &StateStore, project: &Project) -> anyhow::Result<()> {
    store
        .save(project)
        .with_context(|| format!("failed to save state to {}", store.path()))
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
