//! Error types shared between the converter, playback and export.
//!
//! Every error here is recoverable: the presentation layer renders it as a
//! line of text and the application keeps running.

use crate::midi::MidiImportError;

/// Failures while turning a MIDI file into a swara transcript.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Tonic text is not one of the 12 canonical note names.
    #[error("Invalid tonic `{0}`. Please enter a valid note (e.g., C, D#).")]
    InvalidTonic(String),

    /// The MIDI decoder could not read the file.
    #[error("Error processing MIDI file: {0}")]
    MalformedFile(#[from] MidiImportError),

    /// The file decoded but holds no note on with non-zero velocity.
    #[error("No valid notes found in the MIDI file.")]
    NoEvents,

    /// A pitch-class index outside 0..12.
    #[error("pitch class {0} has no swara mapping")]
    UnmappedPitchClass(usize),
}

/// Failures of the playback collaborator. Never affects a computed transcript.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// No SoundFont has been loaded, so there is nothing to synthesize with.
    #[error("No SoundFont loaded. Press `f` to choose one.")]
    NoSoundFont,

    /// The file could not be loaded for playback.
    #[error("Could not load file for playback: {0}")]
    Load(#[from] MidiImportError),

    /// The sequencer thread has exited.
    #[error("playback worker is not running")]
    WorkerGone,
}

/// Failures while saving a transcript.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to save yet. Convert a MIDI file first.")]
    NothingToExport,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A text export that does not have the three expected sections.
    #[error("not a transcript export: {0}")]
    Format(String),
}
