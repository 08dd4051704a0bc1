//! Configuration loading and discovery.
//!
//! Sources are layered with figment, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. User config: `~/.config/semviz/config.<ext>`
//! 3. Project config: `.semviz.<ext>` or `semviz.<ext>` in the start
//!    directory or a parent, stopping at a `.git` boundary
//! 4. Files passed explicitly (`--config`), in order
//!
//! `<ext>` is one of `toml`, `yaml`, `yml`, `json`.
//!
//! ```toml
//! log_level = "debug"
//! state_file = "/tmp/semviz/state.json"
//!
//! [history]
//! retention = 250
//!
//! [simulation]
//! speed = "fast"
//! commit_probability = 0.5
//! release_delay_ms = 500
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::generator::DEFAULT_COMMIT_PROBABILITY;
use crate::ledger::DEFAULT_RETENTION;
use crate::settings::{AnimationSpeed, BASE_INTERVAL};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level (`debug`, `info`, `warn`, `error`).
    pub log_level: LogLevel,
    /// Directory for JSONL log files; platform default when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// State file; `<data dir>/state.json` when unset.
    pub state_file: Option<Utf8PathBuf>,
    /// Commit history settings.
    pub history: HistoryConfig,
    /// Timers and randomness of the interactive simulation.
    pub simulation: SimulationConfig,
}

/// `[history]`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Commits kept in the history (pending commits are never dropped).
    pub retention: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
        }
    }
}

/// `[simulation]`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Overrides the saved speed preference when set.
    pub speed: Option<AnimationSpeed>,
    /// Auto-commit period at normal speed.
    pub base_interval_ms: u64,
    /// Chance that an auto-commit tick produces a commit.
    pub commit_probability: f64,
    /// Pause between starting and completing a release.
    pub release_delay_ms: u64,
    /// Quiet period before state is saved.
    pub save_debounce_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: None,
            base_interval_ms: u64::try_from(BASE_INTERVAL.as_millis()).unwrap_or(3000),
            commit_probability: DEFAULT_COMMIT_PROBABILITY,
            release_delay_ms: 1000,
            save_debounce_ms: 1000,
        }
    }
}

impl SimulationConfig {
    /// Auto-commit base period. Never zero.
    pub const fn base_interval(&self) -> Duration {
        Duration::from_millis(if self.base_interval_ms == 0 {
            1
        } else {
            self.base_interval_ms
        })
    }

    /// Release visual delay.
    pub const fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }

    /// Save debounce.
    pub const fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debugging detail.
    Debug,
    /// Normal operation (default).
    #[default]
    Info,
    /// Possible problems.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Lowercase name, as accepted by `EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for platform directories and config file names.
pub const APP_NAME: &str = "semviz";

/// File name of the state file inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with user config enabled and a `.git` boundary.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for a project config file.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip `~/.config/semviz/config.<ext>`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search in any parent containing `marker`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file. Later files win.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Every file that [`load`](Self::load) would merge, lowest precedence
    /// first.
    pub fn sources(&self) -> Vec<Utf8PathBuf> {
        let user = self
            .include_user_config
            .then(find_user_config)
            .flatten();
        let project = self
            .project_search_root
            .as_deref()
            .and_then(|root| self.find_project_config(root));
        user.into_iter()
            .chain(project)
            .chain(self.explicit_files.iter().cloned())
            .collect()
    }

    /// Merge all sources over the defaults.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let figment = self.sources().iter().fold(
            Figment::new().merge(Serialized::defaults(Config::default())),
            |figment, path| merge_file(figment, path),
        );

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            retention = config.history.retention,
            "configuration loaded"
        );
        Ok(config)
    }

    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        for dir in start.ancestors() {
            if let Some(found) = config_in(dir) {
                return Some(found);
            }
            let at_boundary = self
                .boundary_marker
                .as_ref()
                .is_some_and(|marker| dir.join(marker).exists());
            if at_boundary {
                break;
            }
        }
        None
    }
}

/// First `.semviz.<ext>` or `semviz.<ext>` in `dir`.
fn config_in(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    CONFIG_EXTENSIONS.iter().find_map(|ext| {
        [
            dir.join(format!(".{APP_NAME}.{ext}")),
            dir.join(format!("{APP_NAME}.{ext}")),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
    })
}

fn find_user_config() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// Project config file that applies to `start`, ignoring `.git` boundaries.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new()
        .without_boundary_marker()
        .find_project_config(start.as_ref())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// `~/.config/semviz/` or the platform equivalent.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}

/// `~/.local/share/semviz/` or the platform equivalent.
pub fn user_data_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok()
}

/// Resolve the state file: explicit path, then `state_file`, then the data
/// directory.
pub fn resolve_state_path(explicit: Option<&Utf8Path>, config: &Config) -> ConfigResult<Utf8PathBuf> {
    if let Some(path) = explicit.or(config.state_file.as_deref()) {
        return Ok(path.to_path_buf());
    }
    user_data_dir()
        .map(|dir| dir.join(STATE_FILE_NAME))
        .ok_or(ConfigError::NoStateLocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::try_from(path).unwrap()
    }

    fn load_file(name: &str, contents: &str) -> Config {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, contents).unwrap();
        ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(path))
            .load()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.state_file.is_none());
        assert_eq!(config.history.retention, 100);
        assert_eq!(config.simulation.speed, None);
        assert_eq!(config.simulation.base_interval(), Duration::from_secs(3));
        assert_eq!(config.simulation.release_delay(), Duration::from_secs(1));
        assert_eq!(config.simulation.save_debounce(), Duration::from_secs(1));
        assert!((config.simulation.commit_probability - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn loads_with_no_files() {
        let config = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn toml_sections() {
        let config = load_file(
            "config.toml",
            r#"
log_level = "debug"
state_file = "/tmp/semviz/state.json"

[history]
retention = 25

[simulation]
speed = "fast"
commit_probability = 0.9
release_delay_ms = 250
"#,
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.state_file.as_deref(),
            Some(Utf8Path::new("/tmp/semviz/state.json"))
        );
        assert_eq!(config.history.retention, 25);
        assert_eq!(config.simulation.speed, Some(AnimationSpeed::Fast));
        assert_eq!(config.simulation.release_delay(), Duration::from_millis(250));
        // Untouched keys in a present section keep their defaults.
        assert_eq!(config.simulation.save_debounce_ms, 1000);
    }

    #[test]
    fn yaml_and_json_formats() {
        let yaml = load_file("config.yaml", "history:\n  retention: 7\n");
        assert_eq!(yaml.history.retention, 7);

        let json = load_file("config.json", r#"{"simulation": {"speed": "paused"}}"#);
        assert_eq!(json.simulation.speed, Some(AnimationSpeed::Paused));
    }

    #[test]
    fn invalid_value_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[simulation]\nspeed = \"ludicrous\"\n").unwrap();
        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(path))
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn later_file_wins() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.toml");
        let over = tmp.path().join("override.toml");
        fs::write(&base, "log_level = \"warn\"\n[history]\nretention = 5\n").unwrap();
        fs::write(&over, "log_level = \"error\"\n").unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(base))
            .with_file(utf8(over))
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.history.retention, 5);
    }

    #[test]
    fn project_config_found_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("project");
        let deep = root.join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::write(root.join(".semviz.toml"), "log_level = \"debug\"").unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(deep))
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn git_boundary_stops_search() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let repo = parent.join("repo");
        let work = repo.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        fs::write(parent.join("semviz.toml"), "log_level = \"warn\"").unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(utf8(work))
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn config_at_boundary_is_used() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::write(repo.join("semviz.toml"), "log_level = \"warn\"").unwrap();

        let found = ConfigLoader::new().find_project_config(&utf8(repo.clone()));
        assert_eq!(found, Some(utf8(repo.join("semviz.toml"))));
    }

    #[test]
    fn dotfile_preferred_over_plain_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".semviz.toml"), "").unwrap();
        fs::write(tmp.path().join("semviz.toml"), "").unwrap();
        let found = find_project_config(utf8(tmp.path().to_path_buf())).unwrap();
        assert_eq!(found.file_name(), Some(".semviz.toml"));
    }

    #[test]
    fn state_path_precedence() {
        let mut config = Config::default();
        config.state_file = Some("/from/config.json".into());

        let explicit = Utf8Path::new("/from/flag.json");
        assert_eq!(
            resolve_state_path(Some(explicit), &config).unwrap(),
            Utf8PathBuf::from("/from/flag.json")
        );
        assert_eq!(
            resolve_state_path(None, &config).unwrap(),
            Utf8PathBuf::from("/from/config.json")
        );

        if let Ok(path) = resolve_state_path(None, &Config::default()) {
            assert!(path.as_str().contains(APP_NAME));
            assert_eq!(path.file_name(), Some(STATE_FILE_NAME));
        }
    }

    #[test]
    fn zero_interval_is_clamped() {
        let sim = SimulationConfig {
            base_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(sim.base_interval(), Duration::from_millis(1));
    }
}
