//! Terminal rendering shared by the commands.

use owo_colors::OwoColorize;

use semviz_core::commit::{Commit, CommitCategory};
use semviz_core::pending::PendingChanges;
use semviz_core::release::Release;
use semviz_core::version::{BumpLevel, Version};
use semviz_core::{clock, Dashboard};

/// `MAJOR` / `MINOR` / `PATCH` badge, or a dim dash.
pub fn bump_badge(bump: Option<BumpLevel>) -> String {
    match bump {
        Some(BumpLevel::Major) => BumpLevel::Major.label().red().bold().to_string(),
        Some(BumpLevel::Minor) => BumpLevel::Minor.label().yellow().bold().to_string(),
        Some(BumpLevel::Patch) => BumpLevel::Patch.label().green().bold().to_string(),
        None => "-".dimmed().to_string(),
    }
}

/// Category name padded and colored by impact.
pub fn category(category: CommitCategory) -> String {
    let name = format!("{:<8}", category.as_str());
    match category.impact() {
        Some(BumpLevel::Major) => name.red().to_string(),
        Some(BumpLevel::Minor) => name.yellow().to_string(),
        Some(BumpLevel::Patch) => name.green().to_string(),
        None => name.dimmed().to_string(),
    }
}

/// `0.1.0 → 0.2.0`
pub fn transition(from: Version, to: Version) -> String {
    if from == to {
        format!("{} {}", to.to_string().bold(), "(unchanged)".dimmed())
    } else {
        format!("{} → {}", from.to_string().dimmed(), to.to_string().green().bold())
    }
}

/// One commit per line: status mark, category, message, author, shipped version.
pub fn commit_line(commit: &Commit) -> String {
    let mark = if commit.released {
        "✓".green().to_string()
    } else {
        "●".yellow().to_string()
    };
    let shipped = commit
        .version_after
        .map(|v| format!(" → {v}"))
        .unwrap_or_default();
    format!(
        "  {mark} {} {} {} {}",
        category(commit.category),
        commit.message,
        format!("({})", commit.author).dimmed(),
        format!("[{}{shipped}]", commit.version_before).dimmed(),
    )
}

/// Header line plus the shipped commits of one release.
pub fn release_block(release: &Release) -> String {
    let mut out = format!(
        "{} {} {}\n",
        format!("v{}", release.version).green().bold(),
        clock::to_iso(&release.timestamp).dimmed(),
        format!("({} commits)", release.commits.len()).dimmed(),
    );
    for commit in &release.commits {
        out.push_str(&format!(
            "    {} {}\n",
            category(commit.category),
            commit.message
        ));
    }
    out
}

/// `breaking 1 · feat 0 · fix 3`
pub fn pending_counts(changes: &PendingChanges) -> String {
    format!(
        "{} {} · {} {} · {} {}",
        "breaking".red(),
        changes.breaking,
        "feat".yellow(),
        changes.feat,
        "fix".green(),
        changes.fix
    )
}

/// Multi-line overview used by `status` and `simulate`.
pub fn dashboard(view: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {}\n",
        "Current".dimmed(),
        view.current_version.to_string().bold()
    ));
    out.push_str(&format!(
        "{}: {} {}\n",
        "Next".dimmed(),
        transition(view.current_version, view.next_version),
        bump_badge(view.bump)
    ));
    out.push_str(&format!(
        "{}: {} ({} total)\n",
        "Pending".dimmed(),
        pending_counts(&view.pending_changes),
        view.pending_commits
    ));
    out.push_str(&format!("{}: {}", "Releases".dimmed(), view.releases));
    if view.releasing {
        out.push_str(&format!(" {}", "(release in progress)".yellow()));
    }
    out.push('\n');
    out
}
