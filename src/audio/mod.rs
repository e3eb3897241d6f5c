//! Audio playback of MIDI files.
//!
//! Synthesis uses rustysynth with a user-supplied SoundFont and rodio for
//! output. A background sequencer thread schedules the events so the
//! interface never blocks while a file plays.

pub mod engine;
pub mod player;

pub use engine::{AudioEngine, SynthHandle};
pub use player::{PlaybackAction, PlaybackState, Player, SynthSink};
