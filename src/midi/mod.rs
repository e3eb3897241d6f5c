//! MIDI file decoding and playback scheduling.
//!
//! This module wraps `midly` so the rest of the application sees a MIDI file
//! as a list of tracks, each an ordered list of typed messages carrying their
//! raw delta time, plus the file-level ticks-per-beat.

mod midi_import;
mod performance;

pub use midi_import::{
    decode_midi, import_from_midi, MessageKind, MidiFile, MidiImportError, TrackMessage,
};
pub use performance::{Performance, PerformanceAction, TimedAction};

#[cfg(test)]
pub(crate) use midi_import::tests::build_smf;

/// Canonical Western pitch-class names, indexed by MIDI note number modulo 12.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Tempo assumed until a file sets one: 500 000 microseconds per beat (120 BPM).
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

/// Converts ticks to seconds at a fixed tempo.
///
/// # Arguments
///
/// * `ticks` - Number of ticks
/// * `ticks_per_beat` - The file's resolution
/// * `micros_per_beat` - Tempo in microseconds per quarter note
///
/// # Returns
///
/// Duration in seconds
pub fn ticks_to_seconds(ticks: u64, ticks_per_beat: u16, micros_per_beat: u32) -> f64 {
    let beats = ticks as f64 / ticks_per_beat.max(1) as f64;
    beats * micros_per_beat as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversions() {
        // At 120 BPM, one beat = 0.5 seconds
        let seconds = ticks_to_seconds(480, 480, DEFAULT_MICROS_PER_BEAT);
        assert!((seconds - 0.5).abs() < 1e-9);

        // 96 ticks per beat at 60 BPM: 48 ticks = half a second
        let seconds = ticks_to_seconds(48, 96, 1_000_000);
        assert!((seconds - 0.5).abs() < 1e-9);
    }
}
