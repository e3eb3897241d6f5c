//! Transcript building, rendering and export.
//!
//! A transcript is one entry per sounding note on event, in file order, each
//! holding the swara and the raw delta time of that event in beats. The
//! rendered text has three sections and is identical on screen and on disk:
//!
//! ```text
//! Carnatic Swaras:
//! Sa Ri2 Ga2
//!
//! Note Durations:
//! 0.0 1.0 1.0
//!
//! Identified Raga: Unknown
//! ```
//!
//! The duration is the delta time stored in front of the note on, i.e. the
//! time since the previous event of any kind in that track. It is not the
//! length of the note.

use super::{identify_raga, note_to_swara, parse_tonic, PitchClass, Raga, SwaraName};
use crate::error::{ConversionError, ExportError};
use crate::midi::{import_from_midi, MessageKind, TrackMessage};
use serde::Serialize;
use std::fs;
use std::path::Path;

const SWARAS_HEADING: &str = "Carnatic Swaras:";
const DURATIONS_HEADING: &str = "Note Durations:";
const RAGA_PREFIX: &str = "Identified Raga: ";

/// A sounding note: its MIDI number and the delta ticks stored before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub note: u8,
    pub delta_ticks: u32,
}

impl NoteEvent {
    /// Keeps note on messages with strictly positive velocity.
    pub fn from_message(message: &TrackMessage) -> Option<Self> {
        match message.kind {
            MessageKind::NoteOn { key, .. } if message.is_sounding_note_on() => Some(Self {
                note: key,
                delta_ticks: message.delta,
            }),
            _ => None,
        }
    }
}

/// One line item of the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub swara: SwaraName,
    /// `delta_ticks / ticks_per_beat` of the source event.
    pub duration_beats: f64,
}

/// Builds the transcript for a message stream.
///
/// # Arguments
///
/// * `messages` - Track messages in file order (tracks concatenated)
/// * `tonic` - Pitch class read as Sa
/// * `ticks_per_beat` - The file's resolution, must be positive
///
/// # Errors
///
/// Returns [`ConversionError::NoEvents`] when no message is a sounding note on
pub fn build_transcript<'a, I>(
    messages: I,
    tonic: PitchClass,
    ticks_per_beat: u16,
) -> Result<Vec<TranscriptEntry>, ConversionError>
where
    I: IntoIterator<Item = &'a TrackMessage>,
{
    let ticks_per_beat = f64::from(ticks_per_beat);
    let entries: Vec<TranscriptEntry> = messages
        .into_iter()
        .filter_map(NoteEvent::from_message)
        .map(|event| TranscriptEntry {
            swara: note_to_swara(i32::from(event.note), tonic),
            duration_beats: f64::from(event.delta_ticks) / ticks_per_beat,
        })
        .collect();

    if entries.is_empty() {
        return Err(ConversionError::NoEvents);
    }
    Ok(entries)
}

/// Formats a duration the way it appears in the transcript: shortest
/// round-trip decimal, always with a fractional part ("1.0", "0.25").
///
/// Very small or large values use exponent form with a signed, at least
/// two-digit exponent ("3.05e-05", "1e+16").
pub fn format_duration(beats: f64) -> String {
    let text = format!("{:?}", beats);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

/// Output of one conversion. Replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub tonic: PitchClass,
    pub entries: Vec<TranscriptEntry>,
    pub raga: Raga,
}

/// Shape of the JSON export.
#[derive(Serialize)]
struct JsonExport<'a> {
    tonic: &'a str,
    swaras: Vec<&'a str>,
    durations: Vec<f64>,
    raga: Raga,
}

impl ConversionResult {
    /// Classifies a finished transcript.
    pub fn new(tonic: PitchClass, entries: Vec<TranscriptEntry>) -> Self {
        let raga = identify_raga(&entries);
        Self {
            tonic,
            entries,
            raga,
        }
    }

    /// Swara names joined by single spaces.
    pub fn swara_line(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.swara.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Durations joined by single spaces, same order as the swaras.
    pub fn duration_line(&self) -> String {
        self.entries
            .iter()
            .map(|e| format_duration(e.duration_beats))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The three-section text shown on screen and written by text export.
    pub fn render_text(&self) -> String {
        format!(
            "{}\n{}\n\n{}\n{}\n\n{}{}\n",
            SWARAS_HEADING,
            self.swara_line(),
            DURATIONS_HEADING,
            self.duration_line(),
            RAGA_PREFIX,
            self.raga
        )
    }

    /// Pretty-printed JSON with tonic, swaras, durations and raga.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonExport {
            tonic: self.tonic.name(),
            swaras: self.entries.iter().map(|e| e.swara.as_str()).collect(),
            durations: self.entries.iter().map(|e| e.duration_beats).collect(),
            raga: self.raga,
        })
    }

    /// Writes the text rendering to `path`.
    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        fs::write(path, self.render_text())?;
        Ok(())
    }

    /// Writes the JSON rendering to `path`.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Converts a MIDI file on disk.
///
/// The tonic is validated first, so an invalid tonic never touches the file.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    tonic: &str,
) -> Result<ConversionResult, ConversionError> {
    let tonic = parse_tonic(tonic)?;
    let file = import_from_midi(path.as_ref())?;
    let entries = build_transcript(file.messages(), tonic, file.ticks_per_beat)?;
    let result = ConversionResult::new(tonic, entries);

    tracing::info!(
        "Converted {:?} with tonic {}: {} swaras, raga {}",
        path.as_ref(),
        tonic,
        result.entries.len(),
        result.raga
    );
    Ok(result)
}

/// The sections of a text export, read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExport {
    pub swara_line: String,
    pub duration_line: String,
    pub raga: String,
}

/// Reads a file written by [`ConversionResult::save_text`].
pub fn read_text_export<P: AsRef<Path>>(path: P) -> Result<TextExport, ExportError> {
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();

    let section = |index: usize, expected: &str| -> Result<(), ExportError> {
        match lines.get(index) {
            Some(line) if *line == expected => Ok(()),
            _ => Err(ExportError::Format(format!(
                "expected `{}` on line {}",
                expected,
                index + 1
            ))),
        }
    };
    section(0, SWARAS_HEADING)?;
    section(3, DURATIONS_HEADING)?;

    let raga = lines
        .get(6)
        .and_then(|line| line.strip_prefix(RAGA_PREFIX))
        .ok_or_else(|| ExportError::Format("missing raga line".to_string()))?;

    Ok(TextExport {
        swara_line: lines.get(1).copied().unwrap_or_default().to_string(),
        duration_line: lines.get(4).copied().unwrap_or_default().to_string(),
        raga: raga.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{build_smf, decode_midi};
    use midly::Format;
    use std::path::PathBuf;

    fn note_on(delta: u32, key: u8, velocity: u8) -> TrackMessage {
        TrackMessage {
            delta,
            kind: MessageKind::NoteOn {
                channel: 0,
                key,
                velocity,
            },
        }
    }

    fn note_off(delta: u32, key: u8) -> TrackMessage {
        TrackMessage {
            delta,
            kind: MessageKind::NoteOff { channel: 0, key },
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("swaratui-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_filters_to_sounding_note_ons() {
        let messages = vec![
            note_on(0, 60, 100),
            note_off(240, 60),
            note_on(0, 62, 0),
            note_on(240, 64, 80),
        ];
        let transcript = build_transcript(&messages, PitchClass::C, 480).unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].swara, SwaraName::Sa);
        assert_eq!(transcript[0].duration_beats, 0.0);
        assert_eq!(transcript[1].swara, SwaraName::Ga2);
        // Raw delta of the note on itself, not the time since the last note
        assert_eq!(transcript[1].duration_beats, 0.5);
    }

    #[test]
    fn test_empty_input_is_no_events() {
        let messages = vec![note_off(0, 60), note_on(10, 62, 0)];
        assert!(matches!(
            build_transcript(&messages, PitchClass::C, 480),
            Err(ConversionError::NoEvents)
        ));
        assert!(matches!(
            build_transcript(&Vec::<TrackMessage>::new(), PitchClass::C, 480),
            Err(ConversionError::NoEvents)
        ));
    }

    #[test]
    fn test_tonic_shifts_swaras() {
        let messages = vec![note_on(0, 62, 100), note_on(96, 69, 100)];
        let transcript = build_transcript(&messages, PitchClass::D, 96).unwrap();
        assert_eq!(transcript[0].swara, SwaraName::Sa);
        assert_eq!(transcript[1].swara, SwaraName::Pa);
        assert_eq!(transcript[1].duration_beats, 1.0);
    }

    #[test]
    fn test_tracks_in_file_order() {
        let data = build_smf(
            Format::Parallel,
            480,
            &[
                vec![(0, 0x90, 67, 100)],
                vec![(0, 0x90, 60, 100), (480, 0x90, 62, 100)],
            ],
        );
        let file = decode_midi(&data, "two").unwrap();
        let transcript =
            build_transcript(file.messages(), PitchClass::C, file.ticks_per_beat).unwrap();
        let swaras: Vec<&str> = transcript.iter().map(|e| e.swara.as_str()).collect();
        assert_eq!(swaras, vec!["Pa", "Sa", "Ri2"]);
    }

    #[test]
    fn test_render_text() {
        let messages = vec![note_on(0, 60, 100), note_on(480, 62, 100), note_on(240, 64, 100)];
        let entries = build_transcript(&messages, PitchClass::C, 480).unwrap();
        let result = ConversionResult::new(PitchClass::C, entries);

        assert_eq!(
            result.render_text(),
            "Carnatic Swaras:\nSa Ri2 Ga2\n\nNote Durations:\n0.0 1.0 0.5\n\nIdentified Raga: Unknown\n"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1.0), "1.0");
        assert_eq!(format_duration(0.25), "0.25");
        assert_eq!(format_duration(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_duration(0.0001), "0.0001");
    }

    #[test]
    fn test_format_duration_exponent_form() {
        // One tick at 32 768 ticks per beat is below 1e-4 beats
        assert_eq!(format_duration(3.05e-5), "3.05e-05");
        assert_eq!(format_duration(1e-5), "1e-05");
        assert_eq!(format_duration(1.0 / 32768.0), "3.0517578125e-05");
        assert_eq!(format_duration(1e16), "1e+16");
        assert_eq!(format_duration(2.5e123), "2.5e+123");
    }

    #[test]
    fn test_convert_file_rejects_tonic_before_reading() {
        // The path does not exist; an invalid tonic must win
        let result = convert_file("/nonexistent/file.mid", "x");
        assert!(matches!(result, Err(ConversionError::InvalidTonic(_))));

        let result = convert_file("/nonexistent/file.mid", "C");
        assert!(matches!(result, Err(ConversionError::MalformedFile(_))));
    }

    #[test]
    fn test_convert_file_and_text_round_trip() {
        let midi_path = temp_path("scale.mid");
        let data = build_smf(
            Format::SingleTrack,
            480,
            &[vec![
                (0, 0x90, 60, 100),
                (480, 0x80, 60, 0),
                (0, 0x90, 62, 100),
                (480, 0x80, 62, 0),
                (0, 0x90, 64, 100),
                (480, 0x80, 64, 0),
                (0, 0x90, 65, 100),
                (240, 0x80, 65, 0),
                (0, 0x90, 67, 100),
            ]],
        );
        fs::write(&midi_path, data).unwrap();

        let result = convert_file(&midi_path, "c").unwrap();
        assert_eq!(result.swara_line(), "Sa Ri2 Ga2 Ma1 Pa");
        assert_eq!(result.duration_line(), "0.0 0.0 0.0 0.0 0.0");
        assert_eq!(result.raga, Raga::Unknown);

        let export_path = temp_path("scale.txt");
        result.save_text(&export_path).unwrap();
        let export = read_text_export(&export_path).unwrap();
        assert_eq!(export.swara_line, result.swara_line());
        assert_eq!(export.duration_line, result.duration_line());
        assert_eq!(export.raga, "Unknown");
        assert_eq!(fs::read_to_string(&export_path).unwrap(), result.render_text());

        let _ = fs::remove_file(midi_path);
        let _ = fs::remove_file(export_path);
    }

    #[test]
    fn test_convert_file_without_notes() {
        let midi_path = temp_path("empty.mid");
        let data = build_smf(Format::SingleTrack, 480, &[vec![(0, 0x80, 60, 0)]]);
        fs::write(&midi_path, data).unwrap();

        assert!(matches!(
            convert_file(&midi_path, "C"),
            Err(ConversionError::NoEvents)
        ));
        let _ = fs::remove_file(midi_path);
    }

    #[test]
    fn test_json_export() {
        let messages = vec![note_on(0, 67, 100), note_on(240, 69, 100)];
        let entries = build_transcript(&messages, PitchClass::G, 480).unwrap();
        let result = ConversionResult::new(PitchClass::G, entries);

        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["tonic"], "G");
        assert_eq!(value["swaras"], serde_json::json!(["Sa", "Ri2"]));
        assert_eq!(value["durations"], serde_json::json!([0.0, 0.5]));
        assert_eq!(value["raga"], "Unknown");
    }

    #[test]
    fn test_read_rejects_other_files() {
        let path = temp_path("other.txt");
        fs::write(&path, "hello\nworld\n").unwrap();
        assert!(matches!(read_text_export(&path), Err(ExportError::Format(_))));
        let _ = fs::remove_file(path);
    }
}
