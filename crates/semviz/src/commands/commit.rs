//! Commit command — record one or more simulated commits.

use anyhow::bail;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use semviz_core::commit::{Commit, CommitCategory};
use semviz_core::generator::CommitGenerator;
use semviz_core::store::StateStore;
use semviz_core::version::{BumpLevel, Version};

use crate::render;

/// Arguments for the `commit` subcommand.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Commit category (name or shortcut letter: B F X D S R T C)
    #[arg(value_enum, ignore_case = true)]
    pub category: CommitCategory,

    /// Commit message (generated when omitted)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Author name (picked at random when omitted)
    #[arg(short, long)]
    pub author: Option<String>,

    /// Number of commits to record
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitReport {
    commits: Vec<Commit>,
    current_version: Version,
    next_version: Version,
    bump: Option<BumpLevel>,
}

/// Record commits and save.
#[instrument(name = "cmd_commit", skip_all, fields(category = %args.category, count = args.count))]
pub fn cmd_commit(args: CommitArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    if args.count == 0 {
        bail!("--count must be at least 1");
    }
    let mut project = super::load_project(store)?;
    let mut generator = CommitGenerator::from_os_rng();

    let commits: Vec<Commit> = (0..args.count)
        .map(|_| {
            let draft = generator.draft(args.category, args.message.clone(), args.author.clone());
            project.record_commit(draft)
        })
        .collect();
    super::save_project(store, &project)?;
    debug!(recorded = commits.len(), "commits saved");

    let report = CommitReport {
        commits,
        current_version: project.current_version(),
        next_version: project.next_version(),
        bump: project.summary().bump,
    };
    if global_json {
        return super::print_json(&report);
    }

    for commit in &report.commits {
        println!("{}", render::commit_line(commit));
    }
    println!(
        "{}: {} {}",
        "Next version".dimmed(),
        render::transition(report.current_version, report.next_version),
        render::bump_badge(report.bump),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> StateStore {
        StateStore::new(Utf8PathBuf::try_from(dir.path().join("state.json")).unwrap())
    }

    fn args(category: CommitCategory, count: usize) -> CommitArgs {
        CommitArgs {
            category,
            message: None,
            author: None,
            count,
        }
    }

    #[test]
    fn records_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        cmd_commit(args(CommitCategory::Fix, 3), true, &store).unwrap();

        let project = store.load().unwrap().project;
        assert_eq!(project.summary().changes.fix, 3);
        assert_eq!(project.next_version(), Version::new(0, 1, 1));
    }

    #[test]
    fn explicit_message_and_author() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut a = args(CommitCategory::Docs, 1);
        a.message = Some("docs: explain releases".into());
        a.author = Some("Ada".into());
        cmd_commit(a, false, &store).unwrap();

        let project = store.load().unwrap().project;
        let commit = project.unreleased().next().unwrap();
        assert_eq!(commit.message, "docs: explain releases");
        assert_eq!(commit.author, "Ada");
    }

    #[test]
    fn zero_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(cmd_commit(args(CommitCategory::Feat, 0), false, &store(&dir)).is_err());
    }
}
