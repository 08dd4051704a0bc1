//! Structured logging.
//!
//! Events are written as JSON lines to a daily-rolling file through a
//! non-blocking appender. Stdout is never used: it carries command output,
//! including `--json` documents. When no log file can be opened, logs go to
//! stderr instead.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "SEMVIZ_LOG_PATH";
const ENV_LOG_DIR: &str = "SEMVIZ_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Where logs should go.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// Name used for the log file and the platform log directory.
    pub service: String,
    /// `log_dir` from configuration.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Config for this binary, with the configured log directory.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

/// Keeps the background log writer alive; drop it last.
pub struct ObservabilityGuard {
    _log_guard: WorkerGuard,
}

/// Install the global subscriber.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let (writer, guard) = match file_writer(&cfg.service, cfg.log_dir.as_deref()) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("warning: {err}; logging to stderr");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(service = %cfg.service, "observability initialized");
    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Filter from CLI flags: `--quiet` > `-v`/`-vv` > `RUST_LOG` > configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 1) => EnvFilter::new("debug"),
        (false, 2..) => EnvFilter::new("trace"),
        (false, 0) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    }
}

fn file_writer(service: &str, config_dir: Option<&Path>) -> Result<(NonBlocking, WorkerGuard)> {
    let target = resolve_log_target_with(
        service,
        std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
        std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        config_dir.map(Path::to_path_buf),
    )
    .map_err(|e| anyhow!(e))?;
    let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// `SEMVIZ_LOG_PATH` > `SEMVIZ_LOG_DIR` > config `log_dir` > platform dirs.
fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<LogTarget, String> {
    if let Some(path) = path_override {
        return target_for_path(&path);
    }
    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    if let Some(dir) = dir_override.or(config_dir) {
        ensure_writable(&dir, &file_name)?;
        return Ok(LogTarget { dir, file_name });
    }

    let platform = directories::ProjectDirs::from("", "", service)
        .map(|dirs| dirs.data_local_dir().join("logs"));
    platform
        .into_iter()
        .chain(std::iter::once(std::env::temp_dir().join(service)))
        .find(|dir| ensure_writable(dir, &file_name).is_ok())
        .map(|dir| LogTarget {
            dir,
            file_name: file_name.clone(),
        })
        .ok_or_else(|| "no writable log directory found".to_string())
}

fn target_for_path(path: &Path) -> Result<LogTarget, String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?
        .to_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    ensure_writable(&dir, &file_name)?;
    Ok(LogTarget { dir, file_name })
}

fn ensure_writable(dir: &Path, file_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
    let path = dir.join(file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map(drop)
        .map_err(|e| format!("cannot open log file {}: {e}", path.display()))
}
