use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};

use crate::error::AlarmError;

/// represents the time an alarm goes off at.
/// only hour and minute matter, there is no date (alarms are one shot, local wall clock).
/// this is also the key alarms are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    /// # Errors
    /// if hour > 23 or minute > 59
    pub fn new(hour: u32, minute: u32) -> Result<Self, AlarmError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| AlarmError::InvalidTimeFormat(format!("{hour:02}:{minute:02}")))
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// whether `now` falls inside this alarm's minute
    #[must_use]
    pub fn matches(&self, now: NaiveTime) -> bool {
        now.hour() == self.hour() && now.minute() == self.minute()
    }

    /// 12 hour format with AM/PM, only for showing to users
    #[must_use]
    pub fn display_12h(&self) -> String {
        self.0.format("%I:%M %p").to_string()
    }
}

impl From<AlarmTime> for NaiveTime {
    fn from(time: AlarmTime) -> Self {
        time.0
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmError;

    /// strict `HH:MM`, `9:00` or `09:00:00` are rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AlarmError::InvalidTimeFormat(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2
            || minute.len() != 2
            || !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// unique per registry, never reused, so a stale handle can't touch a newer alarm at the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(pub u64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmHandle {
    pub id: AlarmId,
    pub time: AlarmTime,
}

impl fmt::Display for AlarmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.time, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmState {
    /// waiting for its minute
    Armed,
    /// making noise until someone answers correctly
    Ringing,
    Dismissed,
    Cancelled,
    /// the watcher died without reaching a terminal state
    Faulted,
}

impl AlarmState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dismissed | Self::Cancelled)
    }
}

/// what the registry reports about each alarm it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSummary {
    pub handle: AlarmHandle,
    pub time: AlarmTime,
    /// 12 hour display form of `time`
    pub display: String,
    pub state: AlarmState,
}
