//! User settings for FinTrack
//!
//! Manages user preferences: default currency, the weekday weekly budgets
//! start on, the default alert threshold and the acting user.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::paths::FinTrackPaths;
use crate::error::FinanceError;

/// First day of a weekly budget window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(&self) -> Weekday {
        match self {
            Self::Sunday => Weekday::Sun,
            Self::Monday => Weekday::Mon,
        }
    }
}

/// User settings for FinTrack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency code used when none is given
    #[serde(default = "default_currency")]
    pub default_currency: String,

    #[serde(default)]
    pub week_start: WeekStart,

    /// Alert threshold applied to new budgets when none is given
    #[serde(default = "default_alert_threshold")]
    pub default_alert_threshold: f64,

    /// User acting when neither `--user` nor `FINTRACK_USER` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_alert_threshold() -> f64 {
    0.8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            week_start: WeekStart::default(),
            default_alert_threshold: default_alert_threshold(),
            default_user: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &FinTrackPaths) -> Result<Self, FinanceError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| FinanceError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| FinanceError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FinTrackPaths) -> Result<(), FinanceError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| FinanceError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FinanceError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), FinanceError> {
        if !(self.default_alert_threshold > 0.0 && self.default_alert_threshold <= 1.0) {
            return Err(FinanceError::Config(format!(
                "default_alert_threshold must be in (0, 1], got {}",
                self.default_alert_threshold
            )));
        }
        Ok(())
    }
}
