//! Log command — the commit history, newest first.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::instrument;

use semviz_core::commit::Commit;
use semviz_core::store::StateStore;

use crate::render;

/// Arguments for the `log` subcommand.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Maximum number of commits to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Only show pending commits
    #[arg(long)]
    pub pending: bool,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self {
            limit: 20,
            pending: false,
        }
    }
}

/// Print the commit history.
#[instrument(name = "cmd_log", skip_all, fields(limit = args.limit, pending = args.pending))]
pub fn cmd_log(args: LogArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let project = super::load_project(store)?;
    let commits: Vec<&Commit> = project
        .ledger()
        .iter()
        .filter(|c| !args.pending || c.is_pending())
        .take(args.limit)
        .collect();

    if global_json {
        return super::print_json(&commits);
    }
    if commits.is_empty() {
        println!("  {} {}", "○".dimmed(), "No commits yet".dimmed());
        return Ok(());
    }
    for commit in &commits {
        println!("{}", render::commit_line(commit));
    }
    let total = project.ledger().len();
    if !args.pending && total > commits.len() {
        println!(
            "{}",
            format!("  … {} older commits", total - commits.len()).dimmed()
        );
    }
    Ok(())
}
