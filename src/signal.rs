//! One-way stop signal shared between the thread that wants something to stop
//! and the loop that has to notice.
//!
//! Nothing is ever sent on the channel: triggering drops the only sender, so
//! every receiver clone sees a disconnect at once, including ones blocked in
//! [`StopSignal::wait`] or in a `select!`.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

#[derive(Debug, Clone)]
pub struct StopSignal {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// returns true only for the call that actually triggered it
    pub fn trigger(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// sleeps for up to `timeout`, returns true as soon as the signal is triggered
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// for use in `crossbeam_channel::select!`, becomes ready once triggered
    #[must_use]
    pub const fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use super::StopSignal;

    #[test]
    fn wait_times_out_while_untriggered() {
        let signal = StopSignal::new();
        assert!(!signal.is_triggered());
        assert!(!signal.wait(Duration::from_millis(10)));
    }

    #[test]
    fn trigger_is_seen_by_clones_and_only_counts_once() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(clone.trigger());
        assert!(!signal.trigger());
        assert!(signal.is_triggered());
        assert!(signal.wait(Duration::from_secs(5)));
    }

    #[test]
    fn trigger_wakes_a_blocked_waiter() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || {
                let start = Instant::now();
                assert!(signal.wait(Duration::from_secs(10)));
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(20));
        signal.trigger();
        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(1), "waited {waited:?}");
    }
}
