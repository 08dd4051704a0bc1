//! Doctor command — diagnose configuration, state file, and environment.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use semviz_core::config;
use semviz_core::store::{LoadOrigin, StateStore};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    directories: DirectoryPaths,
    config: ConfigStatus,
    state: StateStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    data: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Path to loaded config file, if any
    file: Option<String>,
    /// Whether a config file was found
    found: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateStatus {
    path: String,
    exists: bool,
    /// `fresh`, `restored`, `recovered` or `error`
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
    commits: usize,
    pending: usize,
    releases: usize,
    current_version: String,
}

impl StateStatus {
    fn inspect(store: &StateStore) -> Self {
        let mut status = Self {
            path: store.path().to_string(),
            exists: store.exists(),
            status: "fresh",
            problem: None,
            commits: 0,
            pending: 0,
            releases: 0,
            current_version: String::new(),
        };
        match store.load() {
            Ok(outcome) => {
                let project = outcome.project;
                status.status = match outcome.origin {
                    LoadOrigin::Fresh => "fresh",
                    LoadOrigin::Restored => "restored",
                    LoadOrigin::Recovered { reason } => {
                        status.problem = Some(reason);
                        "recovered"
                    }
                };
                status.commits = project.ledger().len();
                status.pending = project.unreleased().count();
                status.releases = project.releases().len();
                status.current_version = project.current_version().to_string();
            }
            Err(err) => {
                status.status = "error";
                status.problem = Some(err.to_string());
            }
        }
        status
    }

    const fn is_healthy(&self) -> bool {
        self.problem.is_none()
    }
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: Option<String>,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

const ENV_VARS: [(&str, &str); 5] = [
    ("XDG_CONFIG_HOME", "Override config directory"),
    ("XDG_DATA_HOME", "Override data directory (state file)"),
    ("RUST_LOG", "Log filter directive"),
    ("SEMVIZ_LOG_PATH", "Explicit log file path"),
    ("SEMVIZ_LOG_DIR", "Log directory"),
];

impl DoctorReport {
    fn gather(cwd: &camino::Utf8Path, store: &StateStore) -> Self {
        let config_file = config::find_project_config(cwd);

        Self {
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                data: config::user_data_dir().map(|p| p.to_string()),
            },
            config: ConfigStatus {
                found: config_file.is_some(),
                file: config_file.map(|p| p.to_string()),
            },
            state: StateStatus::inspect(store),
            environment: EnvironmentInfo {
                cwd: Some(cwd.to_string()),
                env_vars: ENV_VARS
                    .iter()
                    .map(|&(name, description)| EnvVar {
                        name,
                        value: std::env::var(name).ok(),
                        description,
                    })
                    .collect(),
            },
        }
    }
}

/// Run diagnostics and report configuration and state status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `cwd` - Current working directory
/// * `store` - Resolved state file
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    cwd: &camino::Utf8Path,
    store: &StateStore,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(cwd, store);
    spinner.finish_and_clear();

    if global_json {
        return super::print_json(&report);
    }

    println!("{}", "Configuration".bold().underline());
    if report.config.found {
        println!(
            "  {} Config file: {}",
            "✓".green(),
            report.config.file.as_deref().unwrap_or("").cyan()
        );
    } else {
        println!("  {} No config file found", "○".yellow());
        offer_config_creation()?;
    }
    println!();

    println!("{}", "State".bold().underline());
    print_state(&report.state);
    println!();

    println!("{}", "Directories".bold().underline());
    print_dir("  Config", report.directories.config.as_deref());
    print_dir("  Data", report.directories.data.as_deref());
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), cwd.cyan());

    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();

    if set_vars.is_empty() {
        println!("  {} No XDG/logging overrides set", "○".dimmed());
    } else {
        for var in set_vars {
            println!(
                "  {}: {}",
                var.name.dimmed(),
                var.value.as_deref().unwrap_or("").cyan()
            );
        }
    }

    Ok(())
}

fn print_state(state: &StateStatus) {
    println!("  {}: {}", "File".dimmed(), state.path.cyan());
    if !state.exists {
        println!("  {} Not created yet; it appears after the first change", "○".dimmed());
        return;
    }
    if state.is_healthy() {
        println!(
            "  {} {} commits ({} pending), {} releases, version {}",
            "✓".green(),
            state.commits,
            state.pending,
            state.releases,
            state.current_version.bold()
        );
    } else {
        println!(
            "  {} {}: {}",
            "✗".red(),
            state.status,
            state.problem.as_deref().unwrap_or("").dimmed()
        );
    }
}

fn print_dir(label: &str, path: Option<&str>) {
    print!("{}: ", label.dimmed());
    match path {
        Some(p) => println!("{}", p.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
}

/// Offer to create a default config file when none exists.
fn offer_config_creation() -> anyhow::Result<()> {
    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };

    let config_path = config_dir.join("config.yaml");
    if config_path.exists() {
        return Ok(());
    }

    // Don't prompt if running non-interactively
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a default config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    // Declined or interrupted
    if !matches!(create, Ok(true)) {
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let yaml = serde_saphyr::to_string(&config::Config::default())?;
    std::fs::write(&config_path, yaml)?;
    println!("  {} Created {}", "✓".green(), config_path.cyan());

    Ok(())
}
