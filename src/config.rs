use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    question::{AnswerMode, Difficulty, QuestionGenerator},
};

/// the slowest the clock may be polled, an alarm rings at most this late
pub const MAX_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub answer_mode: AnswerMode,
    pub multiple_choice: bool,
    /// 0 to 100
    pub volume: u8,
    /// sound file to loop while ringing, tones if missing or broken
    pub sound: Option<PathBuf>,
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            answer_mode: AnswerMode::Integer,
            multiple_choice: false,
            volume: 100,
            sound: None,
            poll_interval_secs: MAX_POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read, isn't valid toml or has out of range values
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&config)?;
        config.validate()?;
        Ok(config)
    }

    /// the config file if there is one, defaults otherwise
    ///
    /// # Errors
    /// if there is a config file but it can't be loaded
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config can't be serialized or written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    /// # Errors
    /// if the platform has no config directory
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "quiz_alarm")
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }

    /// # Errors
    /// if the volume or poll interval is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volume > 100 {
            return Err(ConfigError::Invalid(format!(
                "volume must be 0 to 100, got {}",
                self.volume
            )));
        }
        if !(1..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_secs must be 1 to {MAX_POLL_INTERVAL_SECS}, got {}",
                self.poll_interval_secs
            )));
        }
        Ok(())
    }
}

/// everything an individual alarm needs to know about how to ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSettings {
    pub questions: QuestionGenerator,
    /// 0 to 100
    pub volume: u8,
    pub sound: Option<PathBuf>,
    pub poll_interval: Duration,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AlarmSettings {
    fn from(config: &Config) -> Self {
        Self {
            questions: QuestionGenerator::new(
                config.difficulty,
                config.answer_mode,
                config.multiple_choice,
            ),
            volume: config.volume.min(100),
            sound: config.sound.clone(),
            poll_interval: Duration::from_secs(
                config.poll_interval_secs.clamp(1, MAX_POLL_INTERVAL_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            difficulty: Difficulty::Medium,
            answer_mode: AnswerMode::Decimal,
            multiple_choice: true,
            volume: 40,
            sound: Some(PathBuf::from("/tmp/rooster.mp3")),
            poll_interval_secs: 2,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "difficulty = \"medium\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.volume, 100);
        assert_eq!(config.sound, None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for bad in ["volume = 101\n", "poll_interval_secs = 0\n", "poll_interval_secs = 60\n"] {
            std::fs::write(&path, bad).unwrap();
            assert!(
                matches!(Config::load(&path), Err(ConfigError::Invalid(_))),
                "{bad:?} should be rejected"
            );
        }
        std::fs::write(&path, "difficulty = \"impossible\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn settings_follow_config() {
        let settings = AlarmSettings::from(&Config {
            multiple_choice: true,
            poll_interval_secs: 3,
            ..Config::default()
        });
        assert!(settings.questions.multiple_choice);
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
        assert_eq!(settings.volume, 100);
    }
}
