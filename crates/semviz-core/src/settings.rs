//! User preferences carried in the persisted state.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base auto-commit period at `normal` speed.
pub const BASE_INTERVAL: Duration = Duration::from_millis(3000);

/// Speed of the auto-commit simulation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    /// No auto-generated commits.
    Paused,
    /// Half speed.
    Slow,
    /// Normal speed.
    #[default]
    Normal,
    /// Double speed.
    Fast,
}

impl AnimationSpeed {
    /// Multiplier applied to the tick rate.
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Paused => 0.0,
            Self::Slow => 0.5,
            Self::Normal => 1.0,
            Self::Fast => 2.0,
        }
    }

    /// Auto-commit period for a given base interval; `None` when paused.
    pub fn period(self, base: Duration) -> Option<Duration> {
        match self {
            Self::Paused => None,
            speed => Some(base.div_f64(speed.multiplier())),
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for AnimationSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display and simulation preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Dark theme.
    pub dark_mode: bool,
    /// Audible feedback.
    pub sound_enabled: bool,
    /// Auto-commit speed.
    pub animation_speed: AnimationSpeed,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            sound_enabled: false,
            animation_speed: AnimationSpeed::Normal,
        }
    }
}
