use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

use log::{debug, info};

use crate::{
    alarm::{AlarmHandle, AlarmId, AlarmSummary, AlarmTime},
    audio::AudioSignal,
    clock::{Clock, SystemClock},
    communication::AlarmEvents,
    config::AlarmSettings,
    error::AlarmError,
    timer::{AlarmTimer, Completion, Services},
};

struct Entry {
    handle: AlarmHandle,
    timer: Arc<AlarmTimer>,
}

struct Shared {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// takes the entry out, dropping it is left to the caller outside the lock
    fn take(&self, id: AlarmId) -> Option<Entry> {
        let mut entries = self.lock();
        let index = entries.iter().position(|entry| entry.handle.id == id)?;
        Some(entries.remove(index))
    }
}

/// The set of alarms that are armed or ringing.
///
/// This is the only way alarms get created or removed. At most one live alarm
/// exists per time of day. Dismissed alarms remove themselves.
pub struct AlarmRegistry {
    shared: Arc<Shared>,
    settings: AlarmSettings,
    services: Services,
}

impl fmt::Debug for AlarmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlarmRegistry")
            .field("alarms", &self.list())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AlarmRegistry {
    /// `settings` is what [`AlarmRegistry::add`] arms alarms with
    pub fn new(settings: AlarmSettings, audio: AudioSignal, events: Arc<dyn AlarmEvents>) -> Self {
        Self::with_clock(settings, audio, events, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: AlarmSettings,
        audio: AudioSignal,
        events: Arc<dyn AlarmEvents>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
            settings,
            services: Services {
                clock,
                audio,
                events,
            },
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    /// # Errors
    /// see [`AlarmRegistry::add_with`]
    pub fn add(&self, time: AlarmTime) -> Result<AlarmHandle, AlarmError> {
        self.add_with(time, self.settings.clone())
    }

    /// parses `HH:MM` before arming anything
    ///
    /// # Errors
    /// [`AlarmError::InvalidTimeFormat`] on bad input, otherwise see [`AlarmRegistry::add_with`]
    pub fn add_str(&self, time: &str) -> Result<AlarmHandle, AlarmError> {
        self.add(time.parse()?)
    }

    /// arms an alarm with its own sound, volume or questions
    ///
    /// # Errors
    /// [`AlarmError::DuplicateTime`] if a live alarm is already set for `time`,
    /// [`AlarmError::Spawn`] if its watcher can't be started
    pub fn add_with(&self, time: AlarmTime, settings: AlarmSettings) -> Result<AlarmHandle, AlarmError> {
        let mut entries = self.shared.lock();
        // finished alarms that haven't removed themselves yet don't hold on to their time
        entries.retain(|entry| entry.handle.time != time || !entry.timer.state().is_terminal());
        if entries.iter().any(|entry| entry.handle.time == time) {
            return Err(AlarmError::DuplicateTime(time));
        }

        let handle = AlarmHandle {
            id: AlarmId(self.shared.next_id.fetch_add(1, Ordering::Relaxed)),
            time,
        };
        let timer = AlarmTimer::spawn(handle, settings, self.services.clone(), self.completion())?;
        entries.push(Entry {
            handle,
            timer: Arc::new(timer),
        });
        Ok(handle)
    }

    fn completion(&self) -> Completion {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let events = Arc::clone(&self.services.events);
        Box::new(move |handle| {
            if let Some(shared) = shared.upgrade() {
                if shared.take(handle.id).is_some() {
                    debug!("alarm {handle} removed after dismissal");
                }
            }
            events.on_completed(handle);
        })
    }

    /// Cancels and forgets the alarm, silencing it first if it is ringing.
    ///
    /// The alarm stays listed (and keeps its time) until it has gone quiet, so
    /// a new alarm for the same time can't start ringing over it.
    /// returns false if there was nothing to remove
    pub fn remove(&self, handle: AlarmHandle) -> bool {
        let timer = {
            let entries = self.shared.lock();
            let entry = entries.iter().find(|entry| entry.handle.id == handle.id);
            entry.map(|entry| Arc::clone(&entry.timer))
        };
        let Some(timer) = timer else {
            return false;
        };
        // blocks until silent, without holding the registry lock
        let cancelled = timer.cancel();
        // a same-time add may already have purged it once it went quiet
        let removed = self.shared.take(handle.id).is_some();
        if cancelled || removed {
            info!("alarm {handle} removed");
        }
        cancelled || removed
    }

    /// in the order they were added
    #[must_use]
    pub fn list(&self) -> Vec<AlarmSummary> {
        self.shared
            .lock()
            .iter()
            .map(|entry| AlarmSummary {
                handle: entry.handle,
                time: entry.handle.time,
                display: entry.handle.time.display_12h(),
                state: entry.timer.state(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for AlarmRegistry {
    fn drop(&mut self) {
        let entries = std::mem::take(&mut *self.shared.lock());
        for entry in entries {
            entry.timer.cancel();
        }
    }
}
