use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiLikeEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// Releases every sounding voice of the instrument.
    AllNotesOff,
}

/// Timbres offered by the trainers. Serialized with the GM-style names the
/// sample sets are published under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentName {
    #[default]
    AcousticGrandPiano,
    AcousticGuitarNylon,
    Violin,
    Flute,
    ChoirAahs,
    #[serde(rename = "lead_1_square")]
    Lead1Square,
    Trumpet,
}

impl InstrumentName {
    pub const ALL: [InstrumentName; 7] = [
        InstrumentName::AcousticGrandPiano,
        InstrumentName::AcousticGuitarNylon,
        InstrumentName::Violin,
        InstrumentName::Flute,
        InstrumentName::ChoirAahs,
        InstrumentName::Lead1Square,
        InstrumentName::Trumpet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentName::AcousticGrandPiano => "acoustic_grand_piano",
            InstrumentName::AcousticGuitarNylon => "acoustic_guitar_nylon",
            InstrumentName::Violin => "violin",
            InstrumentName::Flute => "flute",
            InstrumentName::ChoirAahs => "choir_aahs",
            InstrumentName::Lead1Square => "lead_1_square",
            InstrumentName::Trumpet => "trumpet",
        }
    }

    /// General MIDI program number (0-based).
    pub fn gm_program(self) -> u8 {
        match self {
            InstrumentName::AcousticGrandPiano => 0,
            InstrumentName::AcousticGuitarNylon => 24,
            InstrumentName::Violin => 40,
            InstrumentName::ChoirAahs => 52,
            InstrumentName::Trumpet => 56,
            InstrumentName::Flute => 73,
            InstrumentName::Lead1Square => 80,
        }
    }

    /// Per-source gain applied before the master stage. Bright timbres get less.
    pub fn source_gain(self) -> f32 {
        match self {
            InstrumentName::Lead1Square | InstrumentName::Trumpet => 1.5,
            _ => 3.0,
        }
    }
}

impl fmt::Display for InstrumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentName {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == text)
            .ok_or_else(|| InstrumentError::NotFound(text.to_string()))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("instrument not found: {0}")]
    NotFound(String),
    #[error("sample set decode failed: {0}")]
    Decode(String),
    #[error("load cancelled")]
    Cancelled,
    #[error("backend error: {0}")]
    Backend(String),
}

/// A loaded, playable sample set.
///
/// Thread model:
/// - handle_event is called from whichever thread fires scheduled jobs
/// - render is called from the audio thread (must be realtime-safe)
pub trait Instrument: Send + Sync {
    fn handle_event(&self, event: MidiLikeEvent);

    /// Overwrites `out_l`/`out_r` with the next block of audio.
    fn render(&self, out_l: &mut [f32], out_r: &mut [f32]);
}

/// Cooperative cancellation flag shared between the engine and a running load.
#[derive(Clone, Debug, Default)]
pub struct LoadCancellation(Arc<AtomicBool>);

impl LoadCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fetches and decodes an instrument. Called off the audio thread and may block.
pub trait InstrumentLoaderPort: Send + Sync {
    fn load(
        &self,
        name: InstrumentName,
        cancel: &LoadCancellation,
    ) -> Result<Arc<dyn Instrument>, InstrumentError>;
}
