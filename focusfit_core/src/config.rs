//! Configuration file support for FocusFit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/focusfit/config.toml`.

use crate::{Difficulty, Error, Exercise, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub exercises: ExercisesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Focus timer lengths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,

    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

/// Workout pacing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,

    #[serde(default = "default_completion_delay_seconds")]
    pub completion_delay_seconds: u32,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown_seconds(),
            completion_delay_seconds: default_completion_delay_seconds(),
        }
    }
}

/// Values used to create settings on first run
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub equipment: Vec<String>,
}

/// Local notification configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_sound")]
    pub sound: String,

    /// Daily reminder time as "HH:MM"
    #[serde(default)]
    pub daily_reminder: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sound: default_sound(),
            daily_reminder: None,
        }
    }
}

/// Backend sync configuration; sync is disabled unless both are set
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub remote_dir: Option<PathBuf>,
}

impl SyncConfig {
    pub fn is_enabled(&self) -> bool {
        self.user_id.is_some() && self.remote_dir.is_some()
    }
}

/// Extra exercises appended to the built-in catalog
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExercisesConfig {
    #[serde(default)]
    pub custom: Vec<Exercise>,
}

/// Longest focus or break timer accepted, in minutes
pub const MAX_TIMER_MINUTES: u32 = 24 * 60;

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("focusfit")
}

fn default_focus_minutes() -> u32 {
    25
}

fn default_break_minutes() -> u32 {
    5
}

fn default_countdown_seconds() -> u32 {
    3
}

fn default_completion_delay_seconds() -> u32 {
    1
}

fn default_sound() -> String {
    "default".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("focusfit").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (key, minutes) in [
            ("timer.focus_minutes", self.timer.focus_minutes),
            ("timer.break_minutes", self.timer.break_minutes),
        ] {
            if minutes == 0 || minutes > MAX_TIMER_MINUTES {
                return Err(Error::Config(format!(
                    "{} must be between 1 and {}",
                    key, MAX_TIMER_MINUTES
                )));
            }
        }
        if let Some(ref at) = self.notifications.daily_reminder {
            crate::notify::parse_reminder_time(at)
                .map_err(|e| Error::Config(format!("notifications.daily_reminder: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timer.focus_minutes, 25);
        assert_eq!(config.workout.countdown_seconds, 3);
        assert_eq!(config.defaults.difficulty, Difficulty::Medium);
        assert!(!config.sync.is_enabled());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.timer.focus_minutes, parsed.timer.focus_minutes);
        assert_eq!(config.notifications.sound, parsed.notifications.sound);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[timer]
focus_minutes = 50

[defaults]
difficulty = "hard"
equipment = ["chair"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer.focus_minutes, 50);
        assert_eq!(config.timer.break_minutes, 5); // default
        assert_eq!(config.defaults.difficulty, Difficulty::Hard);
        assert_eq!(config.defaults.equipment, vec!["chair".to_string()]);
    }

    #[test]
    fn test_custom_exercises() {
        let toml_str = r#"
[[exercises.custom]]
name = "Wall Sit"
category = "lower"
duration = 45
difficulty = ["medium", "hard"]
instructions = ["Slide down the wall", "Hold"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.exercises.custom.len(), 1);
        assert!(config.exercises.custom[0].is_bodyweight());
    }

    #[test]
    fn test_invalid_reminder_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[notifications]\ndaily_reminder = \"25:99\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_timer_minutes_bounded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        std::fs::write(&path, "[timer]\nfocus_minutes = 80000000\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[timer]\nbreak_minutes = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[timer]\nfocus_minutes = 1440\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.focus_minutes, MAX_TIMER_MINUTES);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.sync.user_id = Some("user-1".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sync.user_id.as_deref(), Some("user-1"));
    }
}
