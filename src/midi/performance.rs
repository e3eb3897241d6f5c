//! Time-stamped playback schedule.
//!
//! A performance merges the channel events of every track into one list
//! sorted by absolute tick, and stamps each event with wall-clock seconds
//! computed from the file's tempo map. The sequencer thread only has to walk
//! this list with a cursor.

use super::{ticks_to_seconds, MessageKind, MidiFile, DEFAULT_MICROS_PER_BEAT};
use midly::Format;

/// A synthesizer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceAction {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
    ProgramChange { channel: u8, program: u8 },
}

/// An action at an absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedAction {
    /// Absolute tick from the start of the file.
    pub tick: u64,
    /// Seconds from the start of the file, tempo changes applied.
    pub seconds: f64,
    pub action: PerformanceAction,
}

/// Event used while merging tracks.
enum Pending {
    Tempo(u32),
    Action(PerformanceAction),
}

/// The full schedule for one file.
#[derive(Debug, Clone, Default)]
pub struct Performance {
    /// Display name of the source file.
    pub name: String,
    actions: Vec<TimedAction>,
}

impl Performance {
    /// Builds a schedule from a decoded file.
    ///
    /// Format 0 and 1 tracks play in parallel. Format 2 tracks are
    /// independent sequences and play one after another.
    pub fn from_midi(file: &MidiFile) -> Self {
        let sequential = file.format == Format::Sequential;

        // (absolute tick, pending event), tracks in file order
        let mut pending: Vec<(u64, Pending)> = Vec::new();
        let mut track_offset: u64 = 0;

        for track in &file.tracks {
            let mut tick = track_offset;
            for message in track {
                tick += message.delta as u64;
                let event = match message.kind {
                    MessageKind::NoteOn {
                        channel,
                        key,
                        velocity,
                    } if velocity > 0 => Pending::Action(PerformanceAction::NoteOn {
                        channel,
                        key,
                        velocity,
                    }),
                    // Note on with velocity 0 = note off
                    MessageKind::NoteOn { channel, key, .. } | MessageKind::NoteOff { channel, key } => {
                        Pending::Action(PerformanceAction::NoteOff { channel, key })
                    }
                    MessageKind::ProgramChange { channel, program } => {
                        Pending::Action(PerformanceAction::ProgramChange { channel, program })
                    }
                    MessageKind::Tempo(micros) => Pending::Tempo(micros),
                    MessageKind::Other => continue,
                };
                pending.push((tick, event));
            }
            if sequential {
                track_offset = tick;
            }
        }

        // Stable: equal ticks keep track order, then file order
        pending.sort_by_key(|(tick, _)| *tick);

        let mut actions = Vec::with_capacity(pending.len());
        let mut micros_per_beat = DEFAULT_MICROS_PER_BEAT;
        let mut last_tick: u64 = 0;
        let mut seconds = 0.0;

        for (tick, event) in pending {
            seconds += ticks_to_seconds(tick - last_tick, file.ticks_per_beat, micros_per_beat);
            last_tick = tick;
            match event {
                Pending::Tempo(micros) if micros > 0 => micros_per_beat = micros,
                Pending::Tempo(_) => {}
                Pending::Action(action) => actions.push(TimedAction {
                    tick,
                    seconds,
                    action,
                }),
            }
        }

        Self {
            name: file.name.clone(),
            actions,
        }
    }

    /// All scheduled actions, sorted by time.
    pub fn actions(&self) -> &[TimedAction] {
        &self.actions
    }

    /// Time of the last action in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.actions.last().map(|a| a.seconds).unwrap_or(0.0)
    }

    /// Returns the index one past the last action due at `elapsed` seconds,
    /// starting the search at `cursor`.
    ///
    /// Actions in `cursor..returned` should be fired now.
    pub fn due_until(&self, cursor: usize, elapsed: f64) -> usize {
        let start = cursor.min(self.actions.len());
        start
            + self.actions[start..]
                .iter()
                .take_while(|a| a.seconds <= elapsed)
                .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{build_smf, decode_midi};

    fn performance(format: Format, tpb: u16, tracks: &[Vec<(u32, u8, u8, u8)>]) -> Performance {
        let data = build_smf(format, tpb, tracks);
        Performance::from_midi(&decode_midi(&data, "test").unwrap())
    }

    #[test]
    fn test_default_tempo_timing() {
        let perf = performance(
            Format::SingleTrack,
            480,
            &[vec![(0, 0x90, 60, 100), (480, 0x80, 60, 0), (480, 0x90, 62, 100)]],
        );
        let actions = perf.actions();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[1].tick, 480);
        assert!((actions[1].seconds - 0.5).abs() < 1e-9);
        assert!((actions[2].seconds - 1.0).abs() < 1e-9);
        assert!((perf.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_velocity_becomes_note_off() {
        let perf = performance(
            Format::SingleTrack,
            480,
            &[vec![(0, 0x90, 60, 100), (240, 0x90, 60, 0)]],
        );
        assert_eq!(
            perf.actions()[1].action,
            PerformanceAction::NoteOff { channel: 0, key: 60 }
        );
    }

    #[test]
    fn test_tempo_change_applies_from_its_tick() {
        // 0x0F4200 = 999 936 us per beat, close to 60 BPM
        let perf = performance(
            Format::SingleTrack,
            100,
            &[vec![
                (0, 0x90, 60, 100),
                (100, 0xFF, 0x0F, 0x42),
                (100, 0x80, 60, 0),
            ]],
        );
        let actions = perf.actions();
        // First beat at 120 BPM, second beat at the new tempo
        assert!((actions[1].seconds - (0.5 + 0.999_936)).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_tracks_are_merged() {
        let perf = performance(
            Format::Parallel,
            480,
            &[
                vec![(0, 0x90, 60, 100), (960, 0x80, 60, 0)],
                vec![(480, 0x90, 64, 100), (480, 0x80, 64, 0)],
            ],
        );
        let ticks: Vec<u64> = perf.actions().iter().map(|a| a.tick).collect();
        assert_eq!(ticks, vec![0, 480, 960, 960]);
        // Equal ticks keep track order
        assert_eq!(
            perf.actions()[2].action,
            PerformanceAction::NoteOff { channel: 0, key: 60 }
        );
    }

    #[test]
    fn test_sequential_tracks_follow_each_other() {
        let perf = performance(
            Format::Sequential,
            480,
            &[
                vec![(0, 0x90, 60, 100), (480, 0x80, 60, 0)],
                vec![(0, 0x90, 62, 100), (480, 0x80, 62, 0)],
            ],
        );
        let ticks: Vec<u64> = perf.actions().iter().map(|a| a.tick).collect();
        assert_eq!(ticks, vec![0, 480, 480, 960]);
    }

    #[test]
    fn test_due_until() {
        let perf = performance(
            Format::SingleTrack,
            480,
            &[vec![(0, 0x90, 60, 100), (480, 0x80, 60, 0), (480, 0x90, 62, 100)]],
        );
        assert_eq!(perf.due_until(0, 0.0), 1);
        assert_eq!(perf.due_until(1, 0.25), 1);
        assert_eq!(perf.due_until(1, 0.5), 2);
        assert_eq!(perf.due_until(2, 10.0), 3);
        assert_eq!(perf.due_until(3, 10.0), 3);
        assert_eq!(perf.due_until(99, 10.0), 3);
    }
}
