//! Status command — current and next version, pending commits.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use semviz_core::Dashboard;
use semviz_core::commit::Commit;
use semviz_core::store::StateStore;

use crate::render;

/// Arguments for the `status` subcommand.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Hide the list of pending commits
    #[arg(long)]
    pub summary: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    #[serde(flatten)]
    dashboard: Dashboard,
    state_file: String,
    pending: Vec<&'a Commit>,
}

/// Show the current state.
#[instrument(name = "cmd_status", skip_all)]
pub fn cmd_status(args: StatusArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let project = super::load_project(store)?;
    debug!(pending = project.summary().pending, "executing status command");

    let report = StatusReport {
        dashboard: project.dashboard(),
        state_file: store.path().to_string(),
        pending: project.unreleased().collect(),
    };

    if global_json {
        return super::print_json(&report);
    }

    print!("{}", render::dashboard(&report.dashboard));
    if args.summary {
        return Ok(());
    }
    println!();
    if report.pending.is_empty() {
        println!("  {} {}", "○".dimmed(), "No pending commits".dimmed());
    } else {
        println!("{}", "Pending commits".bold().underline());
        for commit in &report.pending {
            println!("{}", render::commit_line(commit));
        }
    }
    Ok(())
}
