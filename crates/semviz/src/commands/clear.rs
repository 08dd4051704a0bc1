//! Clear command — wipe history and the state file.

use std::io::IsTerminal;

use anyhow::{Context, bail};
use clap::Args;
use inquire::Confirm;
use owo_colors::OwoColorize;
use tracing::{info, instrument};

use semviz_core::Project;
use semviz_core::store::StateStore;

/// Arguments for the `clear` subcommand.
#[derive(Args, Debug, Default)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Delete all data after confirmation.
#[instrument(name = "cmd_clear", skip_all, fields(yes = args.yes))]
pub fn cmd_clear(args: ClearArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    if !args.yes {
        if !std::io::stdin().is_terminal() {
            bail!("refusing to clear without confirmation; pass --yes");
        }
        let confirmed = Confirm::new("Delete all commits, releases and the saved state?")
            .with_default(false)
            .with_help_message(&format!("Removes {}", store.path()))
            .prompt()
            .context("confirmation prompt failed")?;
        if !confirmed {
            println!("{}", "Nothing cleared.".yellow());
            return Ok(());
        }
    }

    let (project, removed) = reset(store)?;

    if global_json {
        return super::print_json(&serde_json::json!({
            "cleared": true,
            "currentVersion": project.current_version(),
            "stateFile": store.path().as_str(),
            "removed": removed,
        }));
    }
    println!("{} All data cleared", "✓".green());
    Ok(())
}

/// Reset the stored project and delete its file.
///
/// Preferences go back to their defaults along with the file.
fn reset(store: &StateStore) -> anyhow::Result<(Project, bool)> {
    let mut project = super::load_project(store)?;
    project.clear();
    let removed = store.remove().context("failed to remove state file")?;
    info!(removed, version = %project.current_version(), "state cleared");
    Ok((project, removed))
}
