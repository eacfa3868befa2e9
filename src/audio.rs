//! The sound a ringing alarm makes.
//!
//! Every [`AudioSession`] gets its own thread. The thread plays the alarm's
//! sound file on a loop if it has one, and otherwise (or if the file can't be
//! played) beeps with tones that get longer each cycle. Nothing in here is
//! allowed to fail the alarm: if audio output can't be opened at all we fall
//! back to ringing the terminal bell.

use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, warn};
use rodio::{source::SineWave, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::{error::AudioError, signal::StopSignal};

/// how often a looping sound file is checked for having died on us
const LOOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// something that can make noise, lives only on its session's audio thread
pub trait AudioBackend {
    /// start playing `path` on repeat, returns once playback has started
    fn play_looping(&mut self, path: &Path, volume: u8) -> Result<(), AudioError>;
    /// start playing a tone, returns without waiting for it to finish
    fn play_tone(&mut self, tone: Tone) -> Result<(), AudioError>;
    /// false once whatever was started has stopped by itself
    fn is_playing(&self) -> bool;
    fn silence(&mut self);
}

pub type BackendFactory = Arc<dyn Fn() -> Result<Box<dyn AudioBackend>, AudioError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub duration: Duration,
    /// 0.0 to 1.0
    pub amplitude: f32,
}

/// The beep pattern: every beep is longer than the last, and so is the pause after it.
#[derive(Debug, Clone)]
pub struct Escalation {
    duration: Duration,
    frequency: f32,
    amplitude: f32,
}

impl Escalation {
    pub const START: Duration = Duration::from_millis(500);
    pub const STEP: Duration = Duration::from_millis(25);
    pub const EXTRA_PAUSE: Duration = Duration::from_millis(200);

    #[must_use]
    pub fn new(volume: u8) -> Self {
        let volume = volume.min(100);
        Self {
            duration: Self::START,
            // without a volume knob louder means higher pitched
            frequency: 500.0 + f32::from(volume) * 10.0,
            amplitude: f32::from(volume) / 100.0,
        }
    }

    /// the next tone to play and how long to wait before playing the one after it
    pub fn next_cycle(&mut self) -> (Tone, Duration) {
        let tone = Tone {
            frequency: self.frequency,
            duration: self.duration,
            amplitude: self.amplitude,
        };
        self.duration = self.duration.saturating_add(Self::STEP);
        (tone, tone.duration + self.duration + Self::EXTRA_PAUSE)
    }
}

/// Plays through the default output device.
pub struct RodioBackend {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioBackend {
    /// # Errors
    /// if there is no usable output device
    pub fn open() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        Ok(Self { stream, sink: None })
    }

    fn fresh_sink(&mut self, volume: f32) -> &Sink {
        self.silence();
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(volume);
        self.sink.insert(sink)
    }
}

impl AudioBackend for RodioBackend {
    fn play_looping(&mut self, path: &Path, volume: u8) -> Result<(), AudioError> {
        let file = BufReader::new(File::open(path)?);
        let source = Decoder::new(file)?.repeat_infinite();
        let sink = self.fresh_sink(f32::from(volume.min(100)) / 100.0);
        sink.append(source);
        sink.play();
        Ok(())
    }

    fn play_tone(&mut self, tone: Tone) -> Result<(), AudioError> {
        let source = SineWave::new(tone.frequency)
            .take_duration(tone.duration)
            .amplify(tone.amplitude);
        let sink = self.fresh_sink(1.0);
        sink.append(source);
        sink.play();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn silence(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

/// Last resort when there's no audio device: the terminal bell.
#[derive(Debug, Default)]
pub struct BellBackend;

impl AudioBackend for BellBackend {
    fn play_looping(&mut self, _path: &Path, _volume: u8) -> Result<(), AudioError> {
        Err(AudioError::Unsupported("sound files"))
    }

    fn play_tone(&mut self, _tone: Tone) -> Result<(), AudioError> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn silence(&mut self) {}
}

/// Makes no sound at all, for tests and `--silent`.
#[derive(Debug, Default)]
pub struct NullBackend {
    playing: bool,
}

impl AudioBackend for NullBackend {
    fn play_looping(&mut self, _path: &Path, _volume: u8) -> Result<(), AudioError> {
        self.playing = true;
        Ok(())
    }

    fn play_tone(&mut self, _tone: Tone) -> Result<(), AudioError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn silence(&mut self) {
        self.playing = false;
    }
}

/// Starts [`AudioSession`]s. Cheap to clone, clones share the live session count.
#[derive(Clone)]
pub struct AudioSignal {
    factory: BackendFactory,
    live: Arc<AtomicUsize>,
}

impl std::fmt::Debug for AudioSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSignal")
            .field("live", &self.live_sessions())
            .finish_non_exhaustive()
    }
}

impl Default for AudioSignal {
    fn default() -> Self {
        Self::rodio()
    }
}

impl AudioSignal {
    /// `factory` is called on each session's own thread
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn AudioBackend>, AudioError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn rodio() -> Self {
        Self::new(|| Ok(Box::new(RodioBackend::open()?) as Box<dyn AudioBackend>))
    }

    #[must_use]
    pub fn silent() -> Self {
        Self::new(|| Ok(Box::new(NullBackend::default()) as Box<dyn AudioBackend>))
    }

    /// number of audio threads that haven't exited yet
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// starts ringing right away, volume is 0 to 100
    #[must_use]
    pub fn start(&self, volume: u8, sound: Option<&Path>) -> AudioSession {
        let stop = StopSignal::new();
        let factory = Arc::clone(&self.factory);
        let guard = LiveGuard::new(&self.live);
        let sound = sound.map(Path::to_path_buf);
        let thread_stop = stop.clone();
        let thread = thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || {
                let _guard = guard;
                ring(&*factory, volume, sound.as_deref(), &thread_stop);
            });
        let thread = match thread {
            Ok(thread) => Some(thread),
            Err(e) => {
                // the guard went down with the closure
                error!("couldn't start audio thread, alarm will be silent: {e}");
                None
            }
        };
        AudioSession { stop, thread }
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(live))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn ring(
    factory: &(dyn Fn() -> Result<Box<dyn AudioBackend>, AudioError> + Send + Sync),
    volume: u8,
    sound: Option<&Path>,
    stop: &StopSignal,
) {
    let mut backend = factory().unwrap_or_else(|e| {
        warn!("{e}, falling back to the terminal bell");
        Box::new(BellBackend)
    });

    if let Some(path) = sound {
        match backend.play_looping(path, volume) {
            Ok(()) => {
                while backend.is_playing() {
                    if stop.wait(LOOP_CHECK_INTERVAL) {
                        backend.silence();
                        return;
                    }
                }
                warn!("{} stopped playing, falling back to tones", path.display());
            }
            Err(e) => warn!("couldn't play {}: {e}, falling back to tones", path.display()),
        }
    }

    let mut escalation = Escalation::new(volume);
    loop {
        let (tone, wait) = escalation.next_cycle();
        if let Err(e) = backend.play_tone(tone) {
            warn!("couldn't play tone: {e}, falling back to the terminal bell");
            backend.silence();
            backend = Box::new(BellBackend);
            if let Err(e) = backend.play_tone(tone) {
                warn!("couldn't ring the terminal bell either: {e}");
            }
        }
        debug!("beeping for {:?}", tone.duration);
        if stop.wait(wait) {
            break;
        }
    }
    backend.silence();
}

/// One ringing alert. Stopped at most once, by [`AudioSession::stop`] or on drop.
#[derive(Debug)]
pub struct AudioSession {
    stop: StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl AudioSession {
    /// blocks until the audio thread has gone quiet and exited
    pub fn stop(&mut self) {
        self.stop.trigger();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("audio thread panicked");
            }
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.thread.is_none()
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn escalation_gets_longer_every_cycle() {
        let mut escalation = Escalation::new(50);
        let (first, first_wait) = escalation.next_cycle();
        let (second, second_wait) = escalation.next_cycle();
        assert_eq!(first.duration, Duration::from_millis(500));
        assert_eq!(second.duration, Duration::from_millis(525));
        assert_eq!(first_wait, Duration::from_millis(500 + 525 + 200));
        assert!(second_wait > first_wait);
        assert!((first.frequency - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn louder_is_higher_pitched() {
        let quiet = Escalation::new(0).next_cycle().0;
        let loud = Escalation::new(100).next_cycle().0;
        let clamped = Escalation::new(255).next_cycle().0;
        assert!(loud.frequency > quiet.frequency);
        assert_eq!(loud, clamped);
    }

    struct Recording {
        calls: Arc<Mutex<Vec<&'static str>>>,
        playing: bool,
    }

    impl AudioBackend for Recording {
        fn play_looping(&mut self, _path: &Path, _volume: u8) -> Result<(), AudioError> {
            self.calls.lock().unwrap().push("loop");
            Err(AudioError::Unsupported("test"))
        }

        fn play_tone(&mut self, _tone: Tone) -> Result<(), AudioError> {
            self.calls.lock().unwrap().push("tone");
            self.playing = true;
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn silence(&mut self) {
            self.calls.lock().unwrap().push("silence");
            self.playing = false;
        }
    }

    #[test]
    fn broken_sound_file_falls_back_to_tones_and_stops_quickly() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let audio = {
            let calls = Arc::clone(&calls);
            AudioSignal::new(move || {
                Ok(Box::new(Recording {
                    calls: Arc::clone(&calls),
                    playing: false,
                }) as Box<dyn AudioBackend>)
            })
        };
        let mut session = audio.start(80, Some(Path::new("missing.mp3")));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(audio.live_sessions(), 1);

        let start = Instant::now();
        session.stop();
        assert!(start.elapsed() < Duration::from_millis(300));
        assert!(session.is_stopped());
        assert_eq!(audio.live_sessions(), 0);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.first(), Some(&"loop"));
        assert_eq!(calls.get(1), Some(&"tone"));
        assert_eq!(calls.last(), Some(&"silence"));
        // a second stop does nothing
        drop(calls);
        session.stop();
    }

    #[test]
    fn missing_device_still_rings_and_stops() {
        let audio = AudioSignal::new(|| Err(AudioError::Unsupported("no device in tests")));
        let session = audio.start(10, None);
        drop(session);
        assert_eq!(audio.live_sessions(), 0);
    }
}
