use std::io;

use thiserror::Error;

use crate::alarm::AlarmTime;

/// errors surfaced to whoever arms alarms
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("invalid alarm time {0:?}, expected HH:MM (24-hour, zero padded)")]
    InvalidTimeFormat(String),
    #[error("an alarm is already set for {0}")]
    DuplicateTime(AlarmTime),
    #[error("couldn't start alarm watcher: {0}")]
    Spawn(#[source] io::Error),
}

/// audio failures never leave the audio thread, they only pick the fallback
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("couldn't open audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("couldn't decode sound: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("couldn't read sound: {0}")]
    Io(#[from] io::Error),
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't access config file: {0}")]
    Io(#[from] io::Error),
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't find a config directory for this platform")]
    NoConfigDir,
    #[error("invalid config: {0}")]
    Invalid(String),
}
