//! swaratui - MIDI to Carnatic swara converter.
//!
//! This library provides the conversion core, playback and terminal
//! interface used by the `swaratui` binary.

pub mod app;
pub mod audio;
pub mod error;
pub mod midi;
pub mod swara;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{PlaybackState, Player};
pub use error::{ConversionError, ExportError, PlaybackError};
pub use swara::{
    convert_file, identify_raga, to_swara, transpose, ConversionResult, PitchClass, Raga,
    SwaraName,
};
