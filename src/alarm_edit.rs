//! Setting an alarm one digit at a time, like on a bedside clock.
//!
//! The digits are 12 hour (`hh:mm` plus AM/PM); [`AlarmBuilder::build`] turns
//! them into the 24 hour [`AlarmTime`] the rest of the crate uses.

use std::fmt;

use chrono::{NaiveTime, Timelike};

use crate::{alarm::AlarmTime, clock::Clock, error::AlarmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[default]
    AM,
    PM,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AM => "AM",
            Self::PM => "PM",
        })
    }
}

/// positions in `hh:mm`, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digit {
    HourTens,
    HourOnes,
    MinuteTens,
    MinuteOnes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmBuilder {
    digits: [u8; 4],
    time_of_day: TimeOfDay,
}

impl AlarmBuilder {
    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        let (pm, hour) = time.hour12();
        let minute = time.minute();
        #[allow(clippy::cast_possible_truncation)]
        let digits = [hour / 10, hour % 10, minute / 10, minute % 10].map(|d| d as u8);
        Self {
            digits,
            time_of_day: if pm { TimeOfDay::PM } else { TimeOfDay::AM },
        }
    }

    /// starts from whatever time it is now
    #[must_use]
    pub fn now(clock: &dyn Clock) -> Self {
        Self::from_time(clock.now())
    }

    #[must_use]
    pub const fn digits(&self) -> [u8; 4] {
        self.digits
    }

    #[must_use]
    pub const fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    pub fn toggle_period(&mut self) {
        self.time_of_day = match self.time_of_day {
            TimeOfDay::AM => TimeOfDay::PM,
            TimeOfDay::PM => TimeOfDay::AM,
        };
    }

    pub fn increment(&mut self, digit: Digit) {
        let [tens, ones, minute_tens, minute_ones] = &mut self.digits;
        match digit {
            Digit::HourTens => {
                *tens = (*tens + 1) % 2;
                fix_hour(*tens, ones, 0);
            }
            Digit::HourOnes => {
                *ones += 1;
                if *ones > max_hour_ones(*tens) {
                    *ones = if *tens == 1 { 0 } else { 1 };
                }
                if *tens == 0 && *ones == 0 {
                    *ones = 1;
                }
            }
            Digit::MinuteTens => *minute_tens = (*minute_tens + 1) % 6,
            Digit::MinuteOnes => *minute_ones = (*minute_ones + 1) % 10,
        }
    }

    pub fn decrement(&mut self, digit: Digit) {
        let [tens, ones, minute_tens, minute_ones] = &mut self.digits;
        match digit {
            Digit::HourTens => {
                *tens = (*tens + 1) % 2;
                fix_hour(*tens, ones, 2);
            }
            Digit::HourOnes => {
                *ones = match *ones {
                    0 => max_hour_ones(*tens),
                    n => n - 1,
                };
                // 01 goes down to 09 not 00
                if *tens == 0 && *ones == 0 {
                    *ones = 9;
                }
            }
            // minutes only go up to 5x, so this wraps 0 to 5 and never shows 6 to 9
            Digit::MinuteTens => *minute_tens = (*minute_tens + 5) % 6,
            Digit::MinuteOnes => *minute_ones = (*minute_ones + 9) % 10,
        }
    }

    /// 12 hour, for showing while editing
    #[must_use]
    pub fn display(&self) -> String {
        let [a, b, c, d] = self.digits;
        format!("{a}{b}:{c}{d} {}", self.time_of_day)
    }

    /// # Errors
    /// never for digits reached through the editing methods
    pub fn build(&self) -> Result<AlarmTime, AlarmError> {
        let [a, b, c, d] = self.digits.map(u32::from);
        let hour = a * 10 + b;
        let hour = match (self.time_of_day, hour) {
            (TimeOfDay::AM, 12) => 0,
            (TimeOfDay::PM, 12) => 12,
            (TimeOfDay::PM, hour) => hour + 12,
            (TimeOfDay::AM, hour) => hour,
        };
        AlarmTime::new(hour, c * 10 + d)
    }
}

const fn max_hour_ones(tens: u8) -> u8 {
    if tens == 1 {
        2
    } else {
        9
    }
}

/// keeps the hour within 01..=12 after the tens digit changed,
/// `over_twelve` is what the ones digit becomes when the hour would pass 12
fn fix_hour(tens: u8, ones: &mut u8, over_twelve: u8) {
    if tens == 0 && *ones == 0 {
        *ones = 1;
    }
    if tens == 1 && *ones > 2 {
        *ones = over_twelve;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> AlarmBuilder {
        AlarmBuilder::from_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
    }

    #[test]
    fn starts_from_the_given_time_in_twelve_hour_digits() {
        assert_eq!(at(0, 5).display(), "12:05 AM");
        assert_eq!(at(13, 47).display(), "01:47 PM");
        assert_eq!(at(12, 0).display(), "12:00 PM");
    }

    #[test]
    fn now_reads_the_clock() {
        let clock = crate::clock::ManualClock::new(NaiveTime::from_hms_opt(18, 45, 12).unwrap());
        let builder = AlarmBuilder::now(&clock);
        assert_eq!(builder.time_of_day(), TimeOfDay::PM);
        assert_eq!(builder.display(), "06:45 PM");
    }

    #[test]
    fn builds_twenty_four_hour_times() {
        assert_eq!(at(0, 5).build().unwrap().to_string(), "00:05");
        assert_eq!(at(12, 30).build().unwrap().to_string(), "12:30");
        assert_eq!(at(23, 59).build().unwrap().to_string(), "23:59");
        assert_eq!(at(7, 0).build().unwrap().to_string(), "07:00");

        let mut builder = at(7, 0);
        builder.toggle_period();
        assert_eq!(builder.build().unwrap().to_string(), "19:00");
    }

    #[test]
    fn minute_tens_wraps_within_zero_to_five() {
        let mut builder = at(9, 0);
        builder.decrement(Digit::MinuteTens);
        assert_eq!(builder.digits()[2], 5);
        assert_eq!(builder.build().unwrap().to_string(), "09:50");

        for _ in 0..20 {
            builder.decrement(Digit::MinuteTens);
            assert!(builder.digits()[2] <= 5);
        }
        let mut builder = at(9, 50);
        builder.increment(Digit::MinuteTens);
        assert_eq!(builder.digits()[2], 0);
    }

    #[test]
    fn minute_ones_wraps_both_ways() {
        let mut builder = at(9, 0);
        builder.decrement(Digit::MinuteOnes);
        assert_eq!(builder.display(), "09:09 AM");
        builder.increment(Digit::MinuteOnes);
        assert_eq!(builder.display(), "09:00 AM");
    }

    #[test]
    fn hour_never_leaves_one_to_twelve() {
        let mut builder = at(1, 0);
        builder.decrement(Digit::HourOnes);
        assert_eq!(builder.display(), "09:00 AM");

        let mut builder = at(12, 0);
        builder.increment(Digit::HourOnes);
        assert_eq!(builder.display(), "10:00 PM");

        // 09 -> tens up -> 10, not 19
        let mut builder = at(9, 0);
        builder.increment(Digit::HourTens);
        assert_eq!(builder.display(), "10:00 AM");

        let mut builder = at(9, 0);
        builder.decrement(Digit::HourTens);
        assert_eq!(builder.display(), "12:00 AM");

        // 10 -> tens -> 00 is bumped to 01
        let mut builder = at(10, 0);
        builder.increment(Digit::HourTens);
        assert_eq!(builder.display(), "01:00 AM");

        for digit in [Digit::HourTens, Digit::HourOnes] {
            let mut builder = at(6, 0);
            for step in 0..50 {
                if step % 3 == 0 {
                    builder.decrement(digit);
                } else {
                    builder.increment(digit);
                }
                let [a, b, ..] = builder.digits();
                let hour = a * 10 + b;
                assert!((1..=12).contains(&hour), "{}", builder.display());
                assert!(builder.build().is_ok());
            }
        }
    }
}
