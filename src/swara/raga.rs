//! Raga lookup by exact substring match.
//!
//! The pattern tokens use the short numbered spelling (R2, G3, N3), which is
//! not the spelling produced by the swara table (Ri2, Ga2, Ni2). Real
//! transcripts therefore classify as `Unknown`.
// TODO: align RAGA_PATTERNS with SwaraName spelling once the intended
// notation for Mohanam and Kalyani has been confirmed.

use super::TranscriptEntry;
use serde::Serialize;
use std::fmt;

/// Pattern table, searched in order. First match wins.
pub const RAGA_PATTERNS: &[(&str, &str)] = &[
    ("Sa R2 G3 M1 P D2 N3", "Mohanam"),
    ("Sa R1 G3 M2 P D1 N2", "Kalyani"),
];

/// Result of a raga lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Raga {
    Known(&'static str),
    Unknown,
}

impl Raga {
    pub fn name(self) -> &'static str {
        match self {
            Raga::Known(name) => name,
            Raga::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Raga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Raga> for String {
    fn from(raga: Raga) -> Self {
        raga.name().to_string()
    }
}

/// Searches an already space-joined swara sequence for a known pattern.
pub fn identify_raga_in(sequence: &str) -> Raga {
    RAGA_PATTERNS
        .iter()
        .find(|(pattern, _)| sequence.contains(pattern))
        .map(|&(_, name)| Raga::Known(name))
        .unwrap_or(Raga::Unknown)
}

/// Joins the transcript's swaras with single spaces and looks up a raga.
pub fn identify_raga(transcript: &[TranscriptEntry]) -> Raga {
    let sequence = transcript
        .iter()
        .map(|entry| entry.swara.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    identify_raga_in(&sequence)
}
