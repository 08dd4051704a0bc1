//! semviz CLI
#![deny(unsafe_code)]

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use semviz::{Cli, Commands, commands};
use semviz_core::config::{self, ConfigLoader};
use semviz_core::store::StateStore;
use tracing::debug;

mod observability;

fn utf8_path(path: std::path::PathBuf, what: &str) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path).map_err(|e| {
        anyhow::anyhow!(
            "{what} is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = utf8_path(cwd, "current directory")?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        loader = loader.with_file(utf8_path(config_path.clone(), "config path")?);
    }
    let config = loader.load().context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging/tracing")?;

    let explicit_state = cli
        .state
        .clone()
        .map(|path| utf8_path(path, "state path"))
        .transpose()?;
    let state_path = config::resolve_state_path(explicit_state.as_deref(), &config)
        .context("failed to locate the state file")?;
    let store = StateStore::new(state_path).with_retention(config.history.retention);

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        state = %store.path(),
        "CLI initialized"
    );

    let json = cli.json;
    let result = match cli.command {
        Commands::Status(args) => commands::status::cmd_status(args, json, &store),
        Commands::Commit(args) => commands::commit::cmd_commit(args, json, &store),
        Commands::Release(args) => commands::release::cmd_release(args, json, &config, &store),
        Commands::Log(args) => commands::log::cmd_log(args, json, &store),
        Commands::History(args) => commands::history::cmd_history(args, json, &store),
        Commands::Export(args) => commands::transfer::cmd_export(args, json, &store),
        Commands::Import(args) => commands::transfer::cmd_import(args, json, &store),
        Commands::Clear(args) => commands::clear::cmd_clear(args, json, &store),
        Commands::Settings(args) => commands::settings::cmd_settings(args, json, &store),
        Commands::Simulate(args) => {
            commands::simulate::cmd_simulate(args, json, &config, &store)
        }
        Commands::Info(args) => commands::info::cmd_info(args, json, &config, &cwd, &store),
        Commands::Doctor(args) => commands::doctor::cmd_doctor(args, json, &cwd, &store),
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
