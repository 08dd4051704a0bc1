//! History command — past releases.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::instrument;

use semviz_core::store::StateStore;

use crate::render;

/// Arguments for the `history` subcommand.
#[derive(Args, Debug, Default)]
pub struct HistoryArgs {
    /// Only show the most recent N releases
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Print releases, newest first.
#[instrument(name = "cmd_history", skip_all)]
pub fn cmd_history(args: HistoryArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let project = super::load_project(store)?;
    let releases = project.releases();
    let shown = &releases[..args.limit.unwrap_or(releases.len()).min(releases.len())];

    if global_json {
        return super::print_json(&shown);
    }
    if shown.is_empty() {
        println!("  {} {}", "○".dimmed(), "No releases yet".dimmed());
        return Ok(());
    }
    for release in shown {
        print!("{}", render::release_block(release));
    }
    Ok(())
}
