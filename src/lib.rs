#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! An alarm clock that keeps ringing until you solve a math question.
//!
//! Arm alarms through an [`AlarmRegistry`]. Each one gets a watcher thread
//! that rings it at its minute and then waits for a correct answer coming in
//! through the [`DismissHandle`] it hands to [`AlarmEvents::on_ringing`].

pub mod alarm;
/// digit by digit alarm time editing
pub mod alarm_edit;
pub mod audio;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
pub mod question;
pub mod registry;
pub mod signal;
pub mod timer;

pub use alarm::{AlarmHandle, AlarmId, AlarmState, AlarmSummary, AlarmTime};
pub use audio::AudioSignal;
pub use communication::{AlarmEvents, Message, MessageType, NoEvents};
pub use config::{AlarmSettings, Config};
pub use error::AlarmError;
pub use question::{Answer, AnswerMode, Difficulty, Question, QuestionGenerator};
pub use registry::AlarmRegistry;
pub use timer::{AlarmTimer, DismissHandle};
