//! Export and import commands — move history between machines.
//!
//! Exports carry the current version, the commit history, the releases and
//! an export date. Pending commits and preferences stay behind; importing
//! always starts from an empty pending set.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, instrument};

use semviz_core::clock;
use semviz_core::snapshot::{self, Snapshot};
use semviz_core::store::StateStore;

/// Arguments for the `export` subcommand.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Output file (default: `semver-history-<YYYY-MM-DD>.json`)
    #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the document to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

/// Arguments for the `import` subcommand.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Previously exported file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportReport {
    path: String,
    commits: usize,
    releases: usize,
}

/// Write an export document.
#[instrument(name = "cmd_export", skip_all)]
pub fn cmd_export(args: ExportArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let project = super::load_project(store)?;
    let document = project.export();
    let json = document.to_json_pretty()?;

    if args.stdout {
        println!("{json}");
        return Ok(());
    }

    let path = args.output.unwrap_or_else(|| {
        let at = document.export_date.unwrap_or_else(clock::now);
        PathBuf::from(snapshot::export_file_name(&at))
    });
    std::fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "history exported");

    let report = ExportReport {
        path: path.display().to_string(),
        commits: project.ledger().len(),
        releases: project.releases().len(),
    };
    if global_json {
        return super::print_json(&report);
    }
    println!(
        "{} Exported {} commits and {} releases to {}",
        "✓".green(),
        report.commits,
        report.releases,
        report.path.cyan()
    );
    Ok(())
}

/// Replace history with an exported document.
///
/// A file that fails to parse or validate leaves the state untouched.
#[instrument(name = "cmd_import", skip_all, fields(file = %args.file.display()))]
pub fn cmd_import(args: ImportArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let document = Snapshot::from_json(&raw)
        .with_context(|| format!("{} is not a valid history export", args.file.display()))?;

    let mut project = super::load_project(store)?;
    let summary = project
        .import(document)
        .with_context(|| format!("{} is not a consistent history", args.file.display()))?;
    super::save_project(store, &project)?;

    if global_json {
        return super::print_json(&summary);
    }
    println!(
        "{} Imported {} commits and {} releases; current version {}",
        "✓".green(),
        summary.commits,
        summary.releases,
        summary.current_version.to_string().bold()
    );
    if summary.discarded_pending > 0 {
        println!(
            "  {} {} pending commits in the file were dropped",
            "○".yellow(),
            summary.discarded_pending
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use semviz_core::{CommitCategory, Project, Version};
    use tempfile::TempDir;

    fn store(dir: &TempDir, name: &str) -> StateStore {
        StateStore::new(Utf8PathBuf::try_from(dir.path().join(name)).unwrap())
    }

    #[test]
    fn export_then_import_elsewhere() {
        let dir = TempDir::new().unwrap();
        let source = store(&dir, "a.json");
        let mut project = Project::default();
        project.commit(CommitCategory::Feat, "feat: implement dark mode toggle", "Sarah Johnson");
        project.release_now().unwrap();
        project.commit(CommitCategory::Fix, "fix: fix responsive layout on mobile", "Sarah Johnson");
        source.save(&project).unwrap();

        let file = dir.path().join("export.json");
        cmd_export(
            ExportArgs {
                output: Some(file.clone()),
                stdout: false,
            },
            true,
            &source,
        )
        .unwrap();
        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert!(exported.get("exportDate").is_some());
        assert!(exported.get("unreleasedCommits").is_none());
        assert!(exported.get("darkMode").is_none());

        let target = store(&dir, "b.json");
        cmd_import(ImportArgs { file }, false, &target).unwrap();
        let imported = target.load().unwrap().project;
        assert_eq!(imported.current_version(), Version::new(0, 2, 0));
        assert_eq!(imported.releases().len(), 1);
        assert_eq!(imported.unreleased().count(), 0);
    }

    #[test]
    fn bad_import_leaves_state_alone() {
        let dir = TempDir::new().unwrap();
        let target = store(&dir, "state.json");
        let mut project = Project::default();
        project.commit(CommitCategory::Test, "test: update test fixtures", "Tom Brown");
        target.save(&project).unwrap();
        let before = std::fs::read_to_string(target.path()).unwrap();

        let file = dir.path().join("broken.json");
        std::fs::write(&file, "not json at all").unwrap();
        assert!(cmd_import(ImportArgs { file }, false, &target).is_err());
        assert_eq!(std::fs::read_to_string(target.path()).unwrap(), before);
    }
}
