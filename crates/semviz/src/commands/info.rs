//! Info command — show package, config, and simulation settings.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use semviz_core::config::{self, Config};
use semviz_core::store::StateStore;

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    state_file: String,
    state_exists: bool,
    retention: usize,
}

impl ConfigInfo {
    fn from_config(config: &Config, cwd: &camino::Utf8Path, store: &StateStore) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            state_file: store.path().to_string(),
            state_exists: store.exists(),
            retention: config.history.retention,
        }
    }
}

#[derive(Serialize)]
struct SimulationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<String>,
    base_interval_ms: u64,
    commit_probability: f64,
    release_delay_ms: u64,
    save_debounce_ms: u64,
}

impl SimulationInfo {
    fn from_config(config: &Config) -> Self {
        let sim = &config.simulation;
        Self {
            speed: sim.speed.map(|s| s.to_string()),
            base_interval_ms: sim.base_interval_ms,
            commit_probability: sim.commit_probability,
            release_delay_ms: sim.release_delay_ms,
            save_debounce_ms: sim.save_debounce_ms,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    simulation: SimulationInfo,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory for config discovery
/// * `store` - Resolved state file
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
    store: &StateStore,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, cwd, store),
        simulation: SimulationInfo::from_config(config),
    };

    if global_json {
        return super::print_json(&full_info);
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }
    if !full_info.package.repository.is_empty() {
        println!(
            "{}: {}",
            "Repository".dimmed(),
            full_info.package.repository.cyan()
        );
    }

    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = cfg.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    let state_note = if cfg.state_exists {
        String::new()
    } else {
        format!(" {}", "(not created yet)".dimmed())
    };
    println!(
        "{}: {}{}",
        "State file".dimmed(),
        cfg.state_file.cyan(),
        state_note
    );
    println!("{}: {} commits", "Retention".dimmed(), cfg.retention);

    let sim = &full_info.simulation;
    println!();
    println!("{}", "Simulation".bold().underline());
    println!(
        "{}: {}",
        "Speed".dimmed(),
        sim.speed.as_deref().unwrap_or("saved preference").cyan()
    );
    println!("{}: {} ms", "Base interval".dimmed(), sim.base_interval_ms);
    println!(
        "{}: {:.0}%",
        "Commit chance".dimmed(),
        sim.commit_probability * 100.0
    );
    println!("{}: {} ms", "Release delay".dimmed(), sim.release_delay_ms);
    println!("{}: {} ms", "Save debounce".dimmed(), sim.save_debounce_ms);

    Ok(())
}
