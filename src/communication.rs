use crossbeam_channel::Sender;
use log::warn;

use crate::{alarm::AlarmHandle, question::QuestionGenerator, timer::DismissHandle};

/// How the alarm engine tells a UI what is going on.
///
/// Both hooks are called from the alarm's own watcher thread, so they should
/// hand off to the UI rather than block. Every method defaults to doing nothing.
pub trait AlarmEvents: Send + Sync {
    /// the alarm started ringing. `dismiss` has to get a `true` for it to stop,
    /// `questions` makes as many questions as are needed to get there
    fn on_ringing(&self, alarm: AlarmHandle, questions: QuestionGenerator, dismiss: DismissHandle) {
        let _ = (alarm, questions, dismiss);
    }

    /// the alarm was dismissed and is gone from the registry
    fn on_completed(&self, alarm: AlarmHandle) {
        let _ = alarm;
    }
}

/// nobody is listening, alarms that ring can only be cancelled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl AlarmEvents for NoEvents {}

#[derive(Debug)]
pub struct Message {
    pub kind: MessageType,
    pub alarm: AlarmHandle,
}

impl Message {
    #[must_use]
    pub const fn new(kind: MessageType, alarm: AlarmHandle) -> Self {
        Self { kind, alarm }
    }
}

#[derive(Debug)]
pub enum MessageType {
    Ringing {
        questions: QuestionGenerator,
        dismiss: DismissHandle,
    },
    Completed,
}

/// forwards the hooks as messages, so a UI thread can pick them up from its own loop
impl AlarmEvents for Sender<Message> {
    fn on_ringing(&self, alarm: AlarmHandle, questions: QuestionGenerator, dismiss: DismissHandle) {
        if self
            .send(Message::new(MessageType::Ringing { questions, dismiss }, alarm))
            .is_err()
        {
            warn!("nobody is listening for alarm {alarm} ringing");
        }
    }

    fn on_completed(&self, alarm: AlarmHandle) {
        if self.send(Message::new(MessageType::Completed, alarm)).is_err() {
            warn!("nobody is listening for alarm {alarm} completing");
        }
    }
}
