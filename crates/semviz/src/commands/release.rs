//! Release command — ship every pending commit.

use std::io::IsTerminal;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use semviz_core::config::Config;
use semviz_core::release::{Release, ReleaseRejected, ReleaseTicket};
use semviz_core::store::StateStore;

use crate::render;

/// Arguments for the `release` subcommand.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Show what would be released without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
enum ReleaseReport {
    Released(Release),
    Preview(ReleaseTicket),
    Skipped { reason: String },
}

/// Release pending commits.
///
/// An empty pending set is reported, not treated as an error.
#[instrument(name = "cmd_release", skip_all, fields(dry_run = args.dry_run))]
pub fn cmd_release(
    args: ReleaseArgs,
    global_json: bool,
    config: &Config,
    store: &StateStore,
) -> anyhow::Result<()> {
    let mut project = super::load_project(store)?;

    let ticket = match project.request_release() {
        Ok(ticket) => ticket.clone(),
        Err(rejected) => return report_skipped(rejected, global_json),
    };

    if args.dry_run {
        debug!(version = %ticket.version, "dry run, not releasing");
        if global_json {
            return super::print_json(&ReleaseReport::Preview(ticket));
        }
        println!(
            "{} {} {}",
            "Would release".dimmed(),
            render::transition(ticket.previous, ticket.version),
            render::bump_badge(ticket.bump),
        );
        for commit in project.unreleased() {
            println!("{}", render::commit_line(commit));
        }
        return Ok(());
    }

    if !global_json && std::io::stdout().is_terminal() {
        staged_pause(config.simulation.release_delay(), &ticket);
    }

    let Some(release) = project.finish_release().cloned() else {
        return report_skipped(ReleaseRejected::NothingPending, global_json);
    };
    super::save_project(store, &project)?;
    info!(version = %release.version, commits = release.commits.len(), "released");

    if global_json {
        return super::print_json(&ReleaseReport::Released(release));
    }
    println!(
        "{} Released {}",
        "✓".green().bold(),
        render::transition(ticket.previous, release.version)
    );
    print!("{}", render::release_block(&release));
    Ok(())
}

fn report_skipped(rejected: ReleaseRejected, global_json: bool) -> anyhow::Result<()> {
    debug!(%rejected, "release skipped");
    if global_json {
        return super::print_json(&ReleaseReport::Skipped {
            reason: rejected.to_string(),
        });
    }
    println!("{} {}", "○".yellow(), rejected.to_string().yellow());
    Ok(())
}

fn staged_pause(delay: Duration, ticket: &ReleaseTicket) {
    if delay.is_zero() {
        return;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Releasing v{}...", ticket.version));
    spinner.enable_steady_tick(Duration::from_millis(80));
    std::thread::sleep(delay);
    spinner.finish_and_clear();
}
