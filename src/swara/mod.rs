//! Pitch-class transposition and Carnatic swara naming.
//!
//! Everything in this module is a pure function over fixed tables: a MIDI
//! note is first transposed so the chosen tonic lands on pitch class 0, and
//! the resulting pitch class is then named with the fixed Western-to-Carnatic
//! table (C = Sa, C# = Ri1, ... B = Ni2).

mod raga;
mod transcript;

pub use raga::{identify_raga, identify_raga_in, Raga, RAGA_PATTERNS};
pub use transcript::{
    build_transcript, convert_file, format_duration, read_text_export, ConversionResult,
    NoteEvent, TextExport, TranscriptEntry,
};

use crate::error::ConversionError;
use crate::midi::NOTE_NAMES;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Number of pitch classes in the equal-tempered octave.
pub const PITCH_CLASS_COUNT: usize = 12;

/// One of the 12 equal-tempered semitone positions within an octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum PitchClass {
    #[default]
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in canonical order, starting at C.
    pub const ALL: [PitchClass; PITCH_CLASS_COUNT] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Position of this pitch class in the canonical table (C = 0, B = 11).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks up a pitch class by its table position.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::UnmappedPitchClass`] for indices outside 0..12.
    pub fn from_index(index: usize) -> Result<Self, ConversionError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ConversionError::UnmappedPitchClass(index))
    }

    /// Canonical Western name ("C", "C#", ... "B").
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// Pitch class of a MIDI note number, octave ignored.
    pub fn of_midi_note(note: i32) -> Self {
        Self::ALL[note.rem_euclid(PITCH_CLASS_COUNT as i32) as usize]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = ConversionError;

    /// Parses a tonic name. Surrounding whitespace is ignored and the match
    /// is case-insensitive ("c#", " D# " and "C#" are all accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        NOTE_NAMES
            .iter()
            .position(|&name| name == normalized)
            .map(|index| Self::ALL[index])
            .ok_or_else(|| ConversionError::InvalidTonic(s.trim().to_string()))
    }
}

/// Parses user tonic input. Alias for `PitchClass::from_str`.
pub fn parse_tonic(input: &str) -> Result<PitchClass, ConversionError> {
    input.parse()
}

/// Carnatic swara name for a pitch class relative to Sa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SwaraName {
    Sa,
    Ri1,
    Ri2,
    Ga1,
    Ga2,
    Ma1,
    Ma2,
    Pa,
    Dha1,
    Dha2,
    Ni1,
    Ni2,
}

impl SwaraName {
    pub fn as_str(self) -> &'static str {
        match self {
            SwaraName::Sa => "Sa",
            SwaraName::Ri1 => "Ri1",
            SwaraName::Ri2 => "Ri2",
            SwaraName::Ga1 => "Ga1",
            SwaraName::Ga2 => "Ga2",
            SwaraName::Ma1 => "Ma1",
            SwaraName::Ma2 => "Ma2",
            SwaraName::Pa => "Pa",
            SwaraName::Dha1 => "Dha1",
            SwaraName::Dha2 => "Dha2",
            SwaraName::Ni1 => "Ni1",
            SwaraName::Ni2 => "Ni2",
        }
    }
}

impl fmt::Display for SwaraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PitchClass> for SwaraName {
    fn from(pitch_class: PitchClass) -> Self {
        match pitch_class {
            PitchClass::C => SwaraName::Sa,
            PitchClass::CSharp => SwaraName::Ri1,
            PitchClass::D => SwaraName::Ri2,
            PitchClass::DSharp => SwaraName::Ga1,
            PitchClass::E => SwaraName::Ga2,
            PitchClass::F => SwaraName::Ma1,
            PitchClass::FSharp => SwaraName::Ma2,
            PitchClass::G => SwaraName::Pa,
            PitchClass::GSharp => SwaraName::Dha1,
            PitchClass::A => SwaraName::Dha2,
            PitchClass::ASharp => SwaraName::Ni1,
            PitchClass::B => SwaraName::Ni2,
        }
    }
}

/// Transposes a MIDI note so that `tonic` becomes pitch class 0.
///
/// Uses floor-mod, so any integer (including negatives) maps into 0..12.
///
/// # Examples
///
/// ```
/// use swaratui::swara::{transpose, PitchClass};
///
/// // D (62) relative to a D tonic is the tonic itself.
/// assert_eq!(transpose(62, PitchClass::D), PitchClass::C);
/// // E (64) relative to D is a whole tone up.
/// assert_eq!(transpose(64, PitchClass::D), PitchClass::D);
/// ```
pub fn transpose(midi_note: i32, tonic: PitchClass) -> PitchClass {
    // Reduce first so the subtraction cannot overflow at the ends of i32
    let reduced = midi_note.rem_euclid(PITCH_CLASS_COUNT as i32);
    PitchClass::of_midi_note(reduced - tonic.index() as i32)
}

/// Names an already-transposed pitch class as a swara.
pub fn to_swara(pitch_class: PitchClass) -> SwaraName {
    SwaraName::from(pitch_class)
}

/// Transposes a MIDI note against `tonic` and names the result.
pub fn note_to_swara(midi_note: i32, tonic: PitchClass) -> SwaraName {
    to_swara(transpose(midi_note, tonic))
}
