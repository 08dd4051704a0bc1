//! Simulate command — a live session with auto-commits and staged releases.
//!
//! Lines typed on stdin become intents:
//!
//! | input                         | effect                         |
//! |-------------------------------|--------------------------------|
//! | `b` `f` `x` `d` `s` `r` `t` `c` | commit of that category      |
//! | a category name (`feat`, ...) | same                           |
//! | `release`, `!`                | start a release                |
//! | `speed <paused\|slow\|normal\|fast>` | change the auto-commit speed |
//! | `help`, `?`                   | list the keys                  |
//! | `quit`, `q`, Ctrl+C           | finish any release, save and stop |
//! | a second Ctrl+C               | stop at once without saving    |
//!
//! End of input acts like `quit` unless `--duration` is set. With `--json`
//! every session event is printed as one JSON object per line.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use owo_colors::OwoColorize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use semviz_core::commit::CommitCategory;
use semviz_core::config::Config;
use semviz_core::generator::CommitGenerator;
use semviz_core::session::{Intent, Session, SessionEvent, SessionOptions, StopReason};
use semviz_core::settings::AnimationSpeed;
use semviz_core::store::StateStore;

use crate::render;

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug, Default)]
pub struct SimulateArgs {
    /// Auto-commit speed for this session (overrides config and saved preference)
    #[arg(long, value_enum)]
    pub speed: Option<AnimationSpeed>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Do not read commands from stdin
    #[arg(long)]
    pub no_input: bool,
}

/// One parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Blank,
    Help,
    Intent(Intent),
}

fn parse_line(line: &str) -> Result<Line, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Line::Blank);
    };
    let intent = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Line::Help),
        "release" | "!" => Intent::Release,
        "quit" | "q" | "exit" => Intent::Shutdown,
        "speed" => {
            let value = words
                .next()
                .ok_or_else(|| "speed needs one of: paused, slow, normal, fast".to_string())?;
            Intent::SetSpeed(<AnimationSpeed as ValueEnum>::from_str(value, true)?)
        }
        key => {
            let mut chars = key.chars();
            let category = match (chars.next(), chars.next()) {
                (Some(c), None) => CommitCategory::from_shortcut(c)
                    .ok_or_else(|| format!("unknown key '{c}'; type 'help'"))?,
                _ => <CommitCategory as ValueEnum>::from_str(key, true)
                    .map_err(|_| format!("unknown command '{key}'; type 'help'"))?,
            };
            Intent::Commit(category)
        }
    };
    if let Some(extra) = words.next() {
        return Err(format!("unexpected '{extra}'"));
    }
    Ok(Line::Intent(intent))
}

fn print_help() {
    println!("{}", "Keys".bold().underline());
    for category in CommitCategory::ALL {
        println!(
            "  {}  {}",
            category.shortcut().to_string().cyan(),
            category.description()
        );
    }
    println!("  {}  Release pending commits", "release".cyan());
    println!("  {}  Change auto-commit speed", "speed <s>".cyan());
    println!("  {}  Save and stop", "quit".cyan());
}

/// Forward stdin lines as intents. End of input stops the session when
/// `stop_at_eof` is set.
async fn forward_input(tx: mpsc::Sender<Intent>, stop_at_eof: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Ok(Line::Blank) => {}
                Ok(Line::Help) => print_help(),
                Ok(Line::Intent(intent)) => {
                    debug!(?intent, "input");
                    if tx.send(intent).await.is_err() {
                        return;
                    }
                }
                Err(message) => eprintln!("{} {message}", "?".yellow()),
            },
            Ok(None) => {
                debug!("stdin closed");
                if stop_at_eof {
                    let _ = tx.send(Intent::Shutdown).await;
                }
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to read stdin");
                return;
            }
        }
    }
}

/// First Ctrl+C asks for a graceful shutdown; the second cancels outright.
async fn interrupt_handler(tx: mpsc::Sender<Intent>, cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("interrupted");
    let _ = tx.send(Intent::Shutdown).await;
    interrupt_twice(tokio::signal::ctrl_c(), cancel).await;
}

/// Cancel the session once `signal` resolves.
async fn interrupt_twice<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    if signal.await.is_ok() {
        warn!("interrupted again, stopping without saving");
        cancel.cancel();
    }
}

fn event_json(event: &SessionEvent) -> serde_json::Value {
    match event {
        SessionEvent::Committed { commit, auto } => {
            json!({ "event": "commit", "auto": auto, "commit": commit })
        }
        SessionEvent::ReleaseStarted(ticket) => json!({
            "event": "releaseStarted",
            "from": ticket.previous.to_string(),
            "to": ticket.version.to_string(),
            "commits": ticket.commits.len(),
        }),
        SessionEvent::Released(release) => json!({ "event": "released", "release": release }),
        SessionEvent::ReleaseIgnored(reason) => {
            json!({ "event": "releaseIgnored", "reason": reason.to_string() })
        }
        SessionEvent::ReleaseAbandoned(ticket) => {
            json!({ "event": "releaseAbandoned", "version": ticket.version.to_string() })
        }
        SessionEvent::SpeedChanged(speed) => json!({ "event": "speed", "speed": speed }),
        SessionEvent::Saved => json!({ "event": "saved" }),
        SessionEvent::SaveFailed(error) => json!({ "event": "saveFailed", "error": error }),
        SessionEvent::Stopped(reason) => json!({
            "event": "stopped",
            "reason": match reason {
                StopReason::Shutdown => "shutdown",
                StopReason::Cancelled => "cancelled",
            },
        }),
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Committed { commit, auto } => {
            let tag = if *auto { "auto" } else { "    " };
            println!("{} {}", tag.dimmed(), render::commit_line(commit));
        }
        SessionEvent::ReleaseStarted(ticket) => println!(
            "{} Releasing {} ({} commits)…",
            "⏳".yellow(),
            render::transition(ticket.previous, ticket.version),
            ticket.commits.len()
        ),
        SessionEvent::Released(release) => print!("{}", render::release_block(release)),
        SessionEvent::ReleaseIgnored(reason) => println!("  {} {}", "○".yellow(), reason),
        SessionEvent::ReleaseAbandoned(ticket) => println!(
            "  {} release of {} abandoned; its commits stay pending",
            "○".yellow(),
            ticket.version
        ),
        SessionEvent::SpeedChanged(speed) => {
            println!("  {} speed {}", "→".dimmed(), speed.to_string().cyan());
        }
        SessionEvent::Saved | SessionEvent::Stopped(_) => {}
        SessionEvent::SaveFailed(error) => {
            eprintln!("{} save failed: {error}", "warning:".yellow().bold());
        }
    }
}

/// Run a live session until `quit`, Ctrl+C or `--duration` elapses.
#[instrument(name = "cmd_simulate", skip_all, fields(speed = ?args.speed, duration = ?args.duration))]
pub fn cmd_simulate(
    args: SimulateArgs,
    global_json: bool,
    config: &Config,
    store: &StateStore,
) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let result = runtime.block_on(simulate(args, global_json, config, store.clone()));
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn simulate(
    args: SimulateArgs,
    global_json: bool,
    config: &Config,
    store: StateStore,
) -> anyhow::Result<()> {
    let project = super::load_project(&store)?;
    let mut options = SessionOptions::from(&config.simulation);
    if args.speed.is_some() {
        options.speed = args.speed;
    }
    let generator =
        CommitGenerator::from_os_rng().with_probability(config.simulation.commit_probability);
    let session = Session::new(project, generator, options).with_store(store);

    let (tx, rx) = mpsc::channel(32);
    let cancel = CancellationToken::new();

    tokio::spawn(interrupt_handler(tx.clone(), cancel.clone()));
    if let Some(secs) = args.duration {
        let timeout = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            debug!(secs, "duration elapsed");
            let _ = timeout.send(Intent::Shutdown).await;
        });
    }
    if !args.no_input {
        if !global_json && std::io::stdin().is_terminal() {
            println!(
                "{}",
                "Type a commit key, 'release' or 'quit' ('help' lists keys).".dimmed()
            );
        }
        tokio::spawn(forward_input(tx.clone(), args.duration.is_none()));
    }
    drop(tx);

    let project = session
        .run(rx, cancel, |event| {
            if global_json {
                println!("{}", event_json(&event));
            } else {
                print_event(&event);
            }
        })
        .await;

    if global_json {
        return Ok(());
    }
    println!();
    print!("{}", render::dashboard(&project.dashboard()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shortcuts_and_names() {
        assert_eq!(
            parse_line("f").unwrap(),
            Line::Intent(Intent::Commit(CommitCategory::Feat))
        );
        assert_eq!(
            parse_line("  X ").unwrap(),
            Line::Intent(Intent::Commit(CommitCategory::Fix))
        );
        assert_eq!(
            parse_line("refactor").unwrap(),
            Line::Intent(Intent::Commit(CommitCategory::Refactor))
        );
        assert_eq!(
            parse_line("r").unwrap(),
            Line::Intent(Intent::Commit(CommitCategory::Refactor))
        );
    }

    #[test]
    fn parses_control_words() {
        assert_eq!(parse_line("release").unwrap(), Line::Intent(Intent::Release));
        assert_eq!(parse_line("!").unwrap(), Line::Intent(Intent::Release));
        assert_eq!(parse_line("QUIT").unwrap(), Line::Intent(Intent::Shutdown));
        assert_eq!(
            parse_line("speed fast").unwrap(),
            Line::Intent(Intent::SetSpeed(AnimationSpeed::Fast))
        );
        assert_eq!(parse_line("?").unwrap(), Line::Help);
        assert_eq!(parse_line("   ").unwrap(), Line::Blank);
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse_line("z").is_err());
        assert!(parse_line("deploy").is_err());
        assert!(parse_line("speed").is_err());
        assert!(parse_line("speed warp").is_err());
        assert!(parse_line("release now").is_err());
    }

    #[tokio::test]
    async fn second_interrupt_stops_without_saving() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(dir.path().join("s.json")).unwrap();
        let options = SessionOptions {
            release_delay: Duration::from_secs(60),
            speed: Some(AnimationSpeed::Paused),
            ..SessionOptions::default()
        };
        let session = Session::new(
            semviz_core::Project::default(),
            CommitGenerator::seeded(5).with_probability(0.0),
            options,
        )
        .with_store(StateStore::new(path.clone()));
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let mut events = Vec::new();

        let driver = async {
            tx.send(Intent::Commit(CommitCategory::Feat)).await.unwrap();
            tx.send(Intent::Release).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            interrupt_twice(async { Ok(()) }, cancel.clone()).await;
        };
        let (project, ()) = tokio::join!(
            session.run(rx, cancel.clone(), |e| events.push(e)),
            driver
        );

        assert!(cancel.is_cancelled());
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::ReleaseAbandoned(_))));
        assert!(matches!(
            events.last(),
            Some(SessionEvent::Stopped(StopReason::Cancelled))
        ));
        assert!(project.releases().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn event_json_is_tagged() {
        let value = event_json(&SessionEvent::SpeedChanged(AnimationSpeed::Slow));
        assert_eq!(value["event"], "speed");
        assert_eq!(value["speed"], "slow");
        let value = event_json(&SessionEvent::Stopped(StopReason::Shutdown));
        assert_eq!(value["reason"], "shutdown");
    }
}
