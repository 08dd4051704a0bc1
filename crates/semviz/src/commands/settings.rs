//! Settings command — show or change preferences.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use semviz_core::settings::{AnimationSpeed, Preferences};
use semviz_core::store::StateStore;

/// Arguments for the `settings` subcommand.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Dark theme on or off
    #[arg(long, value_name = "BOOL")]
    pub dark_mode: Option<bool>,

    /// Sound on or off
    #[arg(long, value_name = "BOOL")]
    pub sound: Option<bool>,

    /// Auto-commit speed
    #[arg(long, value_enum)]
    pub speed: Option<AnimationSpeed>,
}

impl SettingsArgs {
    fn apply(&self, current: Preferences) -> Preferences {
        Preferences {
            dark_mode: self.dark_mode.unwrap_or(current.dark_mode),
            sound_enabled: self.sound.unwrap_or(current.sound_enabled),
            animation_speed: self.speed.unwrap_or(current.animation_speed),
        }
    }

    const fn changes_anything(&self) -> bool {
        self.dark_mode.is_some() || self.sound.is_some() || self.speed.is_some()
    }
}

/// Print preferences, updating them first when flags are given.
#[instrument(name = "cmd_settings", skip_all)]
pub fn cmd_settings(args: SettingsArgs, global_json: bool, store: &StateStore) -> anyhow::Result<()> {
    let mut project = super::load_project(store)?;
    if args.changes_anything() {
        let updated = args.apply(*project.preferences());
        debug!(?updated, "updating preferences");
        project.set_preferences(updated);
        super::save_project(store, &project)?;
    }

    let prefs = project.preferences();
    if global_json {
        return super::print_json(prefs);
    }
    let on_off = |flag: bool| if flag { "on".green().to_string() } else { "off".dimmed().to_string() };
    println!("{}", "Preferences".bold().underline());
    println!("  {}: {}", "Dark mode".dimmed(), on_off(prefs.dark_mode));
    println!("  {}: {}", "Sound".dimmed(), on_off(prefs.sound_enabled));
    println!(
        "  {}: {}",
        "Speed".dimmed(),
        prefs.animation_speed.to_string().cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn apply_keeps_unset_fields() {
        let args = SettingsArgs {
            speed: Some(AnimationSpeed::Slow),
            ..SettingsArgs::default()
        };
        let prefs = args.apply(Preferences::default());
        assert!(prefs.dark_mode);
        assert!(!prefs.sound_enabled);
        assert_eq!(prefs.animation_speed, AnimationSpeed::Slow);
    }

    #[test]
    fn updates_are_persisted() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(Utf8PathBuf::try_from(dir.path().join("s.json")).unwrap());

        cmd_settings(SettingsArgs::default(), false, &store).unwrap();
        assert!(!store.exists(), "showing settings must not write state");

        let args = SettingsArgs {
            dark_mode: Some(false),
            sound: Some(true),
            speed: None,
        };
        cmd_settings(args, true, &store).unwrap();
        let prefs = *store.load().unwrap().project.preferences();
        assert!(!prefs.dark_mode);
        assert!(prefs.sound_enabled);
    }
}
