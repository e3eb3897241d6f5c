//! Standard MIDI File (SMF) decoding.
//!
//! Reads .mid and .midi files into a flat, owned representation: one list of
//! messages per track, in file order, each with its raw delta time.
//!
//! # Limitations
//!
//! - Only metrical timing (ticks per beat) is supported; SMPTE timecode files
//!   are rejected
//! - Note on/off, program changes and tempo are kept as typed messages;
//!   everything else becomes `MessageKind::Other` so its delta time still
//!   counts towards absolute positions

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;

/// Errors that can occur during MIDI import.
#[derive(Debug, thiserror::Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    Parse(String),
    /// Unsupported MIDI format or timing
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Kind of a decoded track message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Note on. A velocity of 0 is kept as-is; consumers decide whether it
    /// means note off.
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// Set Tempo meta event, microseconds per beat.
    Tempo(u32),
    /// Any other channel, meta or system event.
    Other,
}

/// A single message with the delta time stored in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackMessage {
    /// Ticks since the previous event of the same track.
    pub delta: u32,
    pub kind: MessageKind,
}

impl TrackMessage {
    /// Returns true for a note on with non-zero velocity.
    pub fn is_sounding_note_on(&self) -> bool {
        matches!(self.kind, MessageKind::NoteOn { velocity, .. } if velocity > 0)
    }
}

/// A decoded MIDI file.
#[derive(Debug, Clone)]
pub struct MidiFile {
    /// Display name (file stem when imported from disk).
    pub name: String,
    pub format: Format,
    /// Resolution: ticks per quarter note. Always positive.
    pub ticks_per_beat: u16,
    /// Tracks in file order.
    pub tracks: Vec<Vec<TrackMessage>>,
}

impl MidiFile {
    /// Iterates over every message of every track, tracks in file order.
    pub fn messages(&self) -> impl Iterator<Item = &TrackMessage> {
        self.tracks.iter().flatten()
    }
}

/// Imports a MIDI file from disk.
///
/// # Arguments
///
/// * `path` - Path to the .mid or .midi file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn import_from_midi<P: AsRef<Path>>(path: P) -> Result<MidiFile, MidiImportError> {
    let path = path.as_ref();
    let data = fs::read(path)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported MIDI");

    let file = decode_midi(&data, name)?;
    tracing::debug!(
        "Decoded {:?}: {} tracks, {} ticks per beat",
        path,
        file.tracks.len(),
        file.ticks_per_beat
    );
    Ok(file)
}

/// Decodes an in-memory Standard MIDI File.
pub fn decode_midi(data: &[u8], name: &str) -> Result<MidiFile, MidiImportError> {
    let smf = Smf::parse(data).map_err(|e| MidiImportError::Parse(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(_, _) => {
            return Err(MidiImportError::UnsupportedFormat(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };
    if ticks_per_beat == 0 {
        return Err(MidiImportError::UnsupportedFormat(
            "ticks per beat must be positive".to_string(),
        ));
    }

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|event| TrackMessage {
                    delta: event.delta.as_int(),
                    kind: message_kind(&event.kind),
                })
                .collect()
        })
        .collect();

    Ok(MidiFile {
        name: name.to_string(),
        format: smf.header.format,
        ticks_per_beat,
        tracks,
    })
}

fn message_kind(kind: &TrackEventKind) -> MessageKind {
    match *kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, .. } => MessageKind::NoteOff {
                    channel,
                    key: key.as_int(),
                },
                MidiMessage::ProgramChange { program } => MessageKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                },
                _ => MessageKind::Other,
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => MessageKind::Tempo(tempo.as_int()),
        _ => MessageKind::Other,
    }
}
