//! One watcher thread per alarm.
//!
//! ```text
//!          minute matches           dismiss(true)
//!  Armed ─────────────────► Ringing ─────────────► Dismissed
//!    │                         │
//!    │ cancel()                │ cancel()
//!    └────────► Cancelled ◄────┘
//! ```
//!
//! The state lives behind one mutex, and both the `Armed -> Ringing`
//! transition and every move to a terminal state are claimed while holding
//! it. A cancel racing the alarm going off either finds it still `Armed` (so
//! no audio is ever started) or finds it `Ringing` with its audio session in
//! hand, which it takes and stops. The terminal state is only published once
//! the audio thread has exited, so a finished alarm is always a silent one.

use std::{
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{select, Receiver, Sender};
use log::{debug, error, info};

use crate::{
    alarm::{AlarmHandle, AlarmState},
    audio::{AudioSession, AudioSignal},
    clock::Clock,
    communication::AlarmEvents,
    config::AlarmSettings,
    error::AlarmError,
    question::Question,
    signal::StopSignal,
};

/// run once, on the watcher thread, after a correct answer has silenced the alarm
pub type Completion = Box<dyn FnOnce(AlarmHandle) + Send + 'static>;

/// what a watcher needs from the outside world
#[derive(Clone)]
pub struct Services {
    pub clock: Arc<dyn Clock>,
    pub audio: AudioSignal,
    pub events: Arc<dyn AlarmEvents>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

/// Hands a ringing alarm the user's answers. Clones all feed the same alarm.
#[derive(Debug, Clone)]
pub struct DismissHandle {
    alarm: AlarmHandle,
    answers: Sender<bool>,
}

impl DismissHandle {
    #[must_use]
    pub const fn alarm(&self) -> AlarmHandle {
        self.alarm
    }

    /// `true` silences the alarm, `false` leaves it ringing for another try.
    /// answers for an alarm that is already over are ignored
    pub fn dismiss(&self, correct: bool) {
        if self.answers.send(correct).is_err() {
            debug!("alarm {} is already over, ignoring answer", self.alarm);
        }
    }

    /// checks `input` against `question` and passes the verdict on, returns the verdict
    pub fn answer(&self, question: &Question, input: &str) -> bool {
        let correct = question.check(input);
        self.dismiss(correct);
        correct
    }
}

struct Core {
    state: AlarmState,
    audio: Option<AudioSession>,
    /// set once some caller has claimed the move to a terminal state
    finishing: bool,
}

struct Shared {
    handle: AlarmHandle,
    core: Mutex<Core>,
    /// notified when `state` becomes terminal
    finished: Condvar,
    cancel: StopSignal,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_ringing(&self, audio: &AudioSignal, settings: &AlarmSettings) -> bool {
        let mut core = self.lock();
        if core.state != AlarmState::Armed || core.finishing {
            return false;
        }
        core.audio = Some(audio.start(settings.volume, settings.sound.as_deref()));
        core.state = AlarmState::Ringing;
        true
    }

    /// Moves to `to`, stopping the audio first. Returns once the alarm is in a
    /// terminal state and silent, whichever caller got there first.
    /// true if this call was the one that finished it
    fn finish(&self, to: AlarmState) -> bool {
        let audio = {
            let mut core = self.lock();
            if core.finishing || core.state.is_terminal() {
                let settled = self
                    .finished
                    .wait_while(core, |core| !core.state.is_terminal())
                    .unwrap_or_else(PoisonError::into_inner);
                drop(settled);
                return false;
            }
            core.finishing = true;
            core.audio.take()
        };
        if let Some(mut audio) = audio {
            audio.stop();
        }
        self.lock().state = to;
        self.finished.notify_all();
        true
    }
}

/// A single armed alarm and its watcher thread.
pub struct AlarmTimer {
    shared: Arc<Shared>,
    watcher: JoinHandle<()>,
}

impl fmt::Debug for AlarmTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlarmTimer")
            .field("alarm", &self.shared.handle)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl AlarmTimer {
    /// arms the alarm and starts watching the clock for it
    ///
    /// # Errors
    /// if the watcher thread can't be started
    pub fn spawn(
        handle: AlarmHandle,
        settings: AlarmSettings,
        services: Services,
        completion: Completion,
    ) -> Result<Self, AlarmError> {
        let shared = Arc::new(Shared {
            handle,
            core: Mutex::new(Core {
                state: AlarmState::Armed,
                audio: None,
                finishing: false,
            }),
            finished: Condvar::new(),
            cancel: StopSignal::new(),
        });
        let watcher = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("alarm-{}", handle.time))
                .spawn(move || watch(&shared, &settings, &services, completion))
                .map_err(AlarmError::Spawn)?
        };
        info!("alarm {handle} armed");
        Ok(Self { shared, watcher })
    }

    #[must_use]
    pub fn handle(&self) -> AlarmHandle {
        self.shared.handle
    }

    /// [`AlarmState::Faulted`] if the watcher is gone but the alarm never finished
    #[must_use]
    pub fn state(&self) -> AlarmState {
        let state = self.shared.lock().state;
        if !state.is_terminal() && self.watcher.is_finished() {
            AlarmState::Faulted
        } else {
            state
        }
    }

    /// stops the alarm whatever it is doing, silencing it before returning.
    /// if it is already finishing this waits for that instead.
    /// true if this call was the one that cancelled it. safe to call from inside a hook
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.finish(AlarmState::Cancelled);
        if cancelled {
            info!("alarm {} cancelled", self.shared.handle);
        }
        self.shared.cancel.trigger();
        cancelled
    }
}

impl Drop for AlarmTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn watch(shared: &Shared, settings: &AlarmSettings, services: &Services, completion: Completion) {
    let handle = shared.handle;

    loop {
        let now = services.clock.now();
        if handle.time.matches(now) {
            break;
        }
        debug!("alarm {handle} not due at {}", now.format("%H:%M:%S"));
        if shared.cancel.wait(settings.poll_interval) {
            return;
        }
    }

    // the alarm is one shot, so leaving the loop above means it can't fire again this minute
    if !shared.start_ringing(&services.audio, settings) {
        return;
    }
    info!("alarm {handle} ringing");

    let (answers, answers_rx) = crossbeam_channel::unbounded();
    services.events.on_ringing(
        handle,
        settings.questions,
        DismissHandle {
            alarm: handle,
            answers: answers.clone(),
        },
    );

    if wait_for_dismissal(shared, &answers_rx) {
        info!("alarm {handle} dismissed");
        completion(handle);
    }
    // keeps the answer channel connected until here, even if the UI dropped every handle
    drop(answers);
}

/// true if a correct answer finished the alarm, false if it was cancelled
fn wait_for_dismissal(shared: &Shared, answers: &Receiver<bool>) -> bool {
    loop {
        select! {
            recv(answers) -> answer => match answer {
                Ok(true) => return shared.finish(AlarmState::Dismissed),
                Ok(false) => debug!("wrong answer for alarm {}, still ringing", shared.handle),
                Err(_) => {
                    error!("answer channel for alarm {} closed", shared.handle);
                    return false;
                }
            },
            recv(shared.cancel.receiver()) -> _ => return false,
        }
    }
}
