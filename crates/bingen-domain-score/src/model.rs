use bingen_ports::pitch::{Accidental, Letter, PitchClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum ScoreImportError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("library error: {0}")]
    Library(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    #[default]
    Major,
    Minor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Clicks per measure. Every numerator unit counts as one beat of `60 / bpm` seconds.
    pub fn beats_per_measure(self) -> u32 {
        self.numerator.max(1) as u32
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = ScoreImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScoreImportError::Parse(format!("invalid time signature: {s}"));
        let (numerator, denominator) = s.trim().split_once('/').ok_or_else(invalid)?;
        let numerator: u8 = numerator.trim().parse().map_err(|_| invalid())?;
        let denominator: u8 = denominator.trim().parse().map_err(|_| invalid())?;
        if numerator == 0 || denominator == 0 {
            return Err(invalid());
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = ScoreImportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(value: TimeSignature) -> Self {
        value.to_string()
    }
}

/// One sounding note, in absolute seconds from the start of the piece.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreNoteEvent {
    pub onset_seconds: f64,
    pub pitch: u8,
    pub duration_seconds: f64,
    pub velocity: u8,
}

impl ScoreNoteEvent {
    pub fn end_seconds(&self) -> f64 {
        self.onset_seconds + self.duration_seconds
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DictationScore {
    pub title: String,
    pub key: PitchClass,
    pub mode: KeyMode,
    pub time_signature: TimeSignature,
    pub bpm: f64,
    pub total_measures: u32,
    /// Sorted by onset.
    pub events: Vec<ScoreNoteEvent>,
}

impl DictationScore {
    pub fn duration_seconds(&self) -> f64 {
        self.events
            .iter()
            .map(ScoreNoteEvent::end_seconds)
            .fold(0.0, f64::max)
    }
}

const MAJOR_BY_FIFTHS: [(Letter, i8); 15] = [
    (Letter::C, -1),
    (Letter::G, -1),
    (Letter::D, -1),
    (Letter::A, -1),
    (Letter::E, -1),
    (Letter::B, -1),
    (Letter::F, 0),
    (Letter::C, 0),
    (Letter::G, 0),
    (Letter::D, 0),
    (Letter::A, 0),
    (Letter::E, 0),
    (Letter::B, 0),
    (Letter::F, 1),
    (Letter::C, 1),
];

const MINOR_BY_FIFTHS: [(Letter, i8); 15] = [
    (Letter::A, -1),
    (Letter::E, -1),
    (Letter::B, -1),
    (Letter::F, 0),
    (Letter::C, 0),
    (Letter::G, 0),
    (Letter::D, 0),
    (Letter::A, 0),
    (Letter::E, 0),
    (Letter::B, 0),
    (Letter::F, 1),
    (Letter::C, 1),
    (Letter::G, 1),
    (Letter::D, 1),
    (Letter::A, 1),
];

/// Tonic for a key signature given as sharps (positive) or flats (negative).
pub fn key_from_signature(fifths: i8, mode: KeyMode) -> PitchClass {
    let index = (fifths.clamp(-7, 7) + 7) as usize;
    let (letter, alter) = match mode {
        KeyMode::Major => MAJOR_BY_FIFTHS[index],
        KeyMode::Minor => MINOR_BY_FIFTHS[index],
    };
    PitchClass::new(letter, Accidental(alter))
}
