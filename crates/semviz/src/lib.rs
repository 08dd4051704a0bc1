//! Library interface for the `semviz` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for testing. The actual entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//! - [`render`] - Terminal formatting shared by the commands

pub mod commands;
pub mod render;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG           Log filter (e.g., debug, semviz=trace)
    SEMVIZ_LOG_PATH    Explicit log file path
    SEMVIZ_LOG_DIR     Log directory
";

/// Command-line interface definition for semviz.
#[derive(Parser)]
#[command(name = "semviz")]
#[command(about = "Watch conventional commits turn into semantic versions", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// State file to use (overrides config and the data directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current version, the next version and pending changes
    Status(commands::status::StatusArgs),

    /// Record one or more commits
    Commit(commands::commit::CommitArgs),

    /// Release every pending commit
    Release(commands::release::ReleaseArgs),

    /// Show the commit history
    Log(commands::log::LogArgs),

    /// Show past releases
    History(commands::history::HistoryArgs),

    /// Write the history to a JSON file
    Export(commands::transfer::ExportArgs),

    /// Replace the history with an exported JSON file
    Import(commands::transfer::ImportArgs),

    /// Delete all commits, releases and the saved state
    Clear(commands::clear::ClearArgs),

    /// Show or change preferences
    Settings(commands::settings::SettingsArgs),

    /// Run a live session with auto-generated commits
    Simulate(commands::simulate::SimulateArgs),

    /// Show package information
    Info(commands::info::InfoArgs),

    /// Diagnose configuration and environment
    Doctor(commands::doctor::DoctorArgs),
}

/// Returns the clap command, for help rendering and tests.
pub fn command() -> clap::Command {
    Cli::command()
}
