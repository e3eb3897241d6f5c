//! Playback controller and sequencer thread.
//!
//! The [`Player`] lives on the UI thread and owns the playback state machine.
//! Every transition it accepts is forwarded as a command over a channel to a
//! single background sequencer thread, which walks the current
//! [`Performance`] and fires synthesizer actions when they come due. The UI
//! thread never waits on playback.

use super::engine::{AudioEngine, SynthHandle};
use crate::error::PlaybackError;
use crate::midi::{import_from_midi, Performance, PerformanceAction};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How often the sequencer checks for due events while playing.
const TICK_INTERVAL: Duration = Duration::from_millis(5);

/// Time allowed after the last event for release tails before a performance
/// counts as finished.
const RELEASE_TAIL: f64 = 1.0;

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing has been played yet.
    #[default]
    Idle,
    /// Currently playing.
    Playing,
    /// Paused at current position.
    Paused,
    /// Stopped by the user or finished; position reset.
    Stopped,
}

/// User actions and worker reports that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Play,
    Pause,
    Resume,
    Stop,
    /// The sequencer reached the end of the file.
    Finish,
}

impl PlaybackState {
    /// Returns the state after `action`, or `None` if the action does not
    /// apply in this state.
    pub fn next(self, action: PlaybackAction) -> Option<PlaybackState> {
        use PlaybackAction as A;
        use PlaybackState as S;
        match (self, action) {
            (_, A::Play) => Some(S::Playing),
            (S::Playing, A::Pause) => Some(S::Paused),
            (S::Paused, A::Resume) => Some(S::Playing),
            (S::Playing | S::Paused, A::Stop) => Some(S::Stopped),
            (S::Playing, A::Finish) => Some(S::Stopped),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Stopped => "Stopped",
        }
    }
}

/// Receiver of performance actions. Implemented by the real synthesizer;
/// tests substitute a recorder.
pub trait SynthSink: Send + 'static {
    fn apply(&self, action: PerformanceAction);
    fn silence(&self, immediate: bool);
    fn reset(&self);
}

impl SynthSink for SynthHandle {
    fn apply(&self, action: PerformanceAction) {
        match action {
            PerformanceAction::NoteOn {
                channel,
                key,
                velocity,
            } => self.note_on(channel, key, velocity),
            PerformanceAction::NoteOff { channel, key } => self.note_off(channel, key),
            PerformanceAction::ProgramChange { channel, program } => {
                self.set_program(channel, program)
            }
        }
    }

    fn silence(&self, immediate: bool) {
        self.all_notes_off(immediate);
    }

    fn reset(&self) {
        SynthHandle::reset(self);
    }
}

/// Commands sent from the controller to the sequencer thread.
enum SequencerCommand {
    /// Replace whatever is playing and start from the beginning.
    Load {
        performance: Arc<Performance>,
        generation: u64,
    },
    Pause,
    Resume,
    Stop,
    Shutdown,
}

/// Playback position of the loaded performance.
struct Transport {
    performance: Arc<Performance>,
    generation: u64,
    /// Index of the next action to fire.
    cursor: usize,
    /// Set while running.
    started: Option<Instant>,
    /// Time accumulated before the last pause.
    offset: Duration,
}

impl Transport {
    fn start(performance: Arc<Performance>, generation: u64) -> Self {
        Self {
            performance,
            generation,
            cursor: 0,
            started: Some(Instant::now()),
            offset: Duration::ZERO,
        }
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn elapsed(&self) -> Duration {
        self.offset + self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.offset += started.elapsed();
        }
    }

    fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Fires everything due. Returns true once the performance is over.
    fn advance<S: SynthSink>(&mut self, synth: &S) -> bool {
        let elapsed = self.elapsed().as_secs_f64();
        let due = self.performance.due_until(self.cursor, elapsed);
        for timed in &self.performance.actions()[self.cursor..due] {
            synth.apply(timed.action);
        }
        self.cursor = due;

        self.cursor == self.performance.actions().len()
            && elapsed >= self.performance.duration_seconds() + RELEASE_TAIL
    }
}

/// Body of the sequencer thread.
fn run_sequencer<S: SynthSink>(
    synth: S,
    commands: Receiver<SequencerCommand>,
    finished: Arc<AtomicU64>,
) {
    let mut transport: Option<Transport> = None;

    loop {
        let running = transport.as_ref().is_some_and(Transport::is_running);
        // Block while idle, poll while playing
        let command = if running {
            match commands.recv_timeout(TICK_INTERVAL) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        match command {
            Some(SequencerCommand::Load {
                performance,
                generation,
            }) => {
                tracing::debug!(
                    "Sequencer loaded {:?} ({} actions)",
                    performance.name,
                    performance.actions().len()
                );
                synth.reset();
                transport = Some(Transport::start(performance, generation));
            }
            Some(SequencerCommand::Pause) => {
                if let Some(t) = transport.as_mut() {
                    t.pause();
                }
                synth.silence(false);
            }
            Some(SequencerCommand::Resume) => {
                if let Some(t) = transport.as_mut() {
                    t.resume();
                }
            }
            Some(SequencerCommand::Stop) => {
                transport = None;
                synth.silence(true);
            }
            Some(SequencerCommand::Shutdown) => {
                synth.silence(true);
                break;
            }
            None => {}
        }

        let done = match transport.as_mut() {
            Some(t) if t.is_running() => t.advance(&synth).then_some(t.generation),
            _ => None,
        };
        if let Some(generation) = done {
            tracing::debug!("Performance {} finished", generation);
            synth.silence(false);
            finished.store(generation, Ordering::Release);
            transport = None;
        }
    }

    tracing::debug!("Sequencer thread exiting");
}

/// Handle to the running sequencer thread.
struct Sequencer {
    commands: Sender<SequencerCommand>,
    /// Generation of the last performance that played to the end.
    finished: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl Sequencer {
    fn spawn<S: SynthSink>(synth: S) -> Result<Self> {
        let (commands, receiver) = mpsc::channel();
        let finished = Arc::new(AtomicU64::new(0));
        let worker_finished = Arc::clone(&finished);

        let thread = std::thread::Builder::new()
            .name("sequencer".to_string())
            .spawn(move || run_sequencer(synth, receiver, worker_finished))
            .context("Failed to start sequencer thread")?;

        Ok(Self {
            commands,
            finished,
            thread: Some(thread),
        })
    }

    fn send(&self, command: SequencerCommand) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::WorkerGone)
    }

    fn finished_generation(&self) -> u64 {
        self.finished.load(Ordering::Acquire)
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        let _ = self.commands.send(SequencerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Playback controller: play(path), pause, resume, stop.
///
/// Works without a SoundFont; in that case `play` fails with
/// [`PlaybackError::NoSoundFont`] and everything else is ignored.
pub struct Player {
    // Field order matters: the sequencer must shut down before the engine
    // (and its output stream) is dropped.
    sequencer: Option<Sequencer>,
    engine: Option<AudioEngine>,
    state: PlaybackState,
    /// Incremented for every `play`; lets `poll` ignore stale end reports.
    generation: u64,
    current: Option<PathBuf>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Creates a player with no audio output.
    pub fn new() -> Self {
        Self {
            sequencer: None,
            engine: None,
            state: PlaybackState::Idle,
            generation: 0,
            current: None,
        }
    }

    /// Loads a SoundFont, replacing the current engine and sequencer.
    ///
    /// Any playback in progress ends.
    pub fn load_soundfont<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let engine = AudioEngine::new(path)?;
        let sequencer = Sequencer::spawn(engine.synth())?;

        // Old sequencer first, then the old engine
        self.sequencer = Some(sequencer);
        self.engine = Some(engine);
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Stopped;
        }
        Ok(())
    }

    #[cfg(test)]
    fn with_sink<S: SynthSink>(synth: S) -> Result<Self> {
        Ok(Self {
            sequencer: Some(Sequencer::spawn(synth)?),
            ..Self::new()
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// File name of the loaded SoundFont.
    pub fn soundfont_name(&self) -> Option<&str> {
        self.engine.as_ref().map(AudioEngine::soundfont_name)
    }

    /// The file most recently started with `play`.
    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Starts `path` from the beginning, superseding anything playing.
    pub fn play<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PlaybackError> {
        let path = path.as_ref();
        let sequencer = self.sequencer.as_ref().ok_or(PlaybackError::NoSoundFont)?;

        let file = import_from_midi(path)?;
        let performance = Arc::new(Performance::from_midi(&file));

        self.generation += 1;
        sequencer.send(SequencerCommand::Load {
            performance,
            generation: self.generation,
        })?;

        self.state = PlaybackState::Playing;
        self.current = Some(path.to_path_buf());
        tracing::info!("Playing {:?}", path);
        Ok(())
    }

    /// Pauses without resetting position. Returns false if nothing is playing.
    pub fn pause(&mut self) -> Result<bool, PlaybackError> {
        self.transition(PlaybackAction::Pause, SequencerCommand::Pause)
    }

    /// Continues from the paused position. Returns false if not paused.
    pub fn resume(&mut self) -> Result<bool, PlaybackError> {
        self.transition(PlaybackAction::Resume, SequencerCommand::Resume)
    }

    /// Halts and resets. Returns false if nothing was playing or paused.
    pub fn stop(&mut self) -> Result<bool, PlaybackError> {
        self.transition(PlaybackAction::Stop, SequencerCommand::Stop)
    }

    /// Picks up the end of the current performance. Call once per frame.
    ///
    /// Returns true if the state changed.
    pub fn poll(&mut self) -> bool {
        let finished = self
            .sequencer
            .as_ref()
            .is_some_and(|s| s.finished_generation() == self.generation);
        if !finished {
            return false;
        }
        match self.state.next(PlaybackAction::Finish) {
            Some(next) => {
                self.state = next;
                tracing::info!("Playback finished");
                true
            }
            None => false,
        }
    }

    fn transition(
        &mut self,
        action: PlaybackAction,
        command: SequencerCommand,
    ) -> Result<bool, PlaybackError> {
        let Some(next) = self.state.next(action) else {
            return Ok(false);
        };
        if let Some(sequencer) = &self.sequencer {
            sequencer.send(command)?;
        }
        tracing::debug!("Playback {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::build_smf;
    use midly::Format;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl SynthSink for Recorder {
        fn apply(&self, action: PerformanceAction) {
            self.log.lock().unwrap().push(format!("{:?}", action));
        }

        fn silence(&self, immediate: bool) {
            self.log.lock().unwrap().push(format!("silence({})", immediate));
        }

        fn reset(&self) {
            self.log.lock().unwrap().push("reset".to_string());
        }
    }

    fn write_midi(name: &str, tracks: &[Vec<(u32, u8, u8, u8)>]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("swaratui-{}-{}", std::process::id(), name));
        std::fs::write(&path, build_smf(Format::SingleTrack, 480, tracks)).unwrap();
        path
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_state_transitions() {
        use PlaybackAction as A;
        use PlaybackState as S;

        assert_eq!(S::Idle.next(A::Play), Some(S::Playing));
        assert_eq!(S::Playing.next(A::Play), Some(S::Playing));
        assert_eq!(S::Stopped.next(A::Play), Some(S::Playing));
        assert_eq!(S::Playing.next(A::Pause), Some(S::Paused));
        assert_eq!(S::Paused.next(A::Resume), Some(S::Playing));
        assert_eq!(S::Paused.next(A::Stop), Some(S::Stopped));
        assert_eq!(S::Playing.next(A::Stop), Some(S::Stopped));
        assert_eq!(S::Playing.next(A::Finish), Some(S::Stopped));

        assert_eq!(S::Idle.next(A::Pause), None);
        assert_eq!(S::Paused.next(A::Pause), None);
        assert_eq!(S::Playing.next(A::Resume), None);
        assert_eq!(S::Stopped.next(A::Resume), None);
        assert_eq!(S::Idle.next(A::Stop), None);
        assert_eq!(S::Stopped.next(A::Stop), None);
        assert_eq!(S::Paused.next(A::Finish), None);
    }

    #[test]
    fn test_player_without_soundfont() {
        let mut player = Player::new();
        assert!(player.soundfont_name().is_none());
        assert!(matches!(
            player.play("/nonexistent.mid"),
            Err(PlaybackError::NoSoundFont)
        ));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(!player.pause().unwrap());
        assert!(!player.resume().unwrap());
        assert!(!player.stop().unwrap());
        assert!(!player.poll());
    }

    #[test]
    fn test_play_bad_file_keeps_state() {
        let mut player = Player::with_sink(Recorder::default()).unwrap();
        assert!(matches!(
            player.play("/nonexistent/dir/missing.mid"),
            Err(PlaybackError::Load(_))
        ));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.current_file().is_none());
    }

    #[test]
    fn test_sequencer_plays_to_the_end() {
        let recorder = Recorder::default();
        let mut player = Player::with_sink(recorder.clone()).unwrap();
        let path = write_midi(
            "short.mid",
            &[vec![(0, 0x90, 60, 100), (48, 0x80, 60, 0), (0, 0x90, 62, 100), (48, 0x80, 62, 0)]],
        );

        player.play(&path).unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.current_file(), Some(path.as_path()));

        assert!(wait_until(|| player.poll()));
        assert_eq!(player.state(), PlaybackState::Stopped);

        let log = recorder.entries();
        assert_eq!(log[0], "reset");
        let notes: Vec<&String> = log.iter().filter(|e| e.starts_with("Note")).collect();
        assert_eq!(notes.len(), 4);
        assert!(notes[0].starts_with("NoteOn"));
        assert!(notes[0].contains("key: 60"));
        assert!(notes[3].starts_with("NoteOff"));
        assert!(notes[3].contains("key: 62"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_pause_resume_stop() {
        let recorder = Recorder::default();
        let mut player = Player::with_sink(recorder.clone()).unwrap();
        // Second note four beats (two seconds) in
        let path = write_midi("long.mid", &[vec![(0, 0x90, 60, 100), (1920, 0x90, 64, 100)]]);

        player.play(&path).unwrap();
        assert!(player.pause().unwrap());
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(!player.pause().unwrap());

        assert!(player.resume().unwrap());
        assert_eq!(player.state(), PlaybackState::Playing);

        assert!(player.stop().unwrap());
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert!(!player.poll());

        assert!(wait_until(|| recorder
            .entries()
            .iter()
            .any(|e| e == "silence(true)")));
        assert!(!recorder.entries().iter().any(|e| e.contains("key: 64")));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_new_play_supersedes_old() {
        let recorder = Recorder::default();
        let mut player = Player::with_sink(recorder.clone()).unwrap();
        let long = write_midi("first.mid", &[vec![(0, 0x90, 60, 100), (9600, 0x90, 61, 100)]]);
        let short = write_midi("second.mid", &[vec![(0, 0x90, 67, 100), (48, 0x80, 67, 0)]]);

        player.play(&long).unwrap();
        player.play(&short).unwrap();
        assert_eq!(player.current_file(), Some(short.as_path()));

        assert!(wait_until(|| player.poll()));
        let log = recorder.entries();
        assert_eq!(log.iter().filter(|e| *e == "reset").count(), 2);
        assert!(!log.iter().any(|e| e.contains("key: 61")));

        let _ = std::fs::remove_file(long);
        let _ = std::fs::remove_file(short);
    }
}
