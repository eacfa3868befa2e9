use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Duration, NaiveTime};

/// source of the local wall clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().naive_local().time()
    }
}

/// clock that only moves when told to, clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    time: Arc<Mutex<NaiveTime>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn set(&self, time: NaiveTime) {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// wraps around midnight
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time = time.overflowing_add_signed(by).0;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveTime {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
