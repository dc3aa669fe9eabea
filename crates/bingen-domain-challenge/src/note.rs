use crate::challenge_id;
use bingen_domain_theory::TheoryPitchArithmetic;
use bingen_ports::pitch::{Accidental, Letter, Note, PitchArithmeticPort, PitchClass};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const fn n(letter: Letter, accidental: Accidental, octave: i32) -> Note {
    Note::new(letter, accidental, octave)
}

const NAT: Accidental = Accidental::NATURAL;
const SHARP: Accidental = Accidental::SHARP;
const FLAT: Accidental = Accidental::FLAT;

/// Unlock order for note reading: the treble octave from middle C, down through the
/// bass register, then the black keys.
pub const NOTE_CURRICULUM: [Note; 32] = [
    n(Letter::C, NAT, 4),
    n(Letter::D, NAT, 4),
    n(Letter::E, NAT, 4),
    n(Letter::F, NAT, 4),
    n(Letter::G, NAT, 4),
    n(Letter::A, NAT, 4),
    n(Letter::B, NAT, 4),
    n(Letter::C, NAT, 5),
    n(Letter::B, NAT, 3),
    n(Letter::A, NAT, 3),
    n(Letter::G, NAT, 3),
    n(Letter::F, NAT, 3),
    n(Letter::E, NAT, 3),
    n(Letter::D, NAT, 3),
    n(Letter::C, NAT, 3),
    n(Letter::B, NAT, 2),
    n(Letter::A, NAT, 2),
    n(Letter::G, NAT, 2),
    n(Letter::F, NAT, 2),
    n(Letter::E, NAT, 2),
    n(Letter::D, NAT, 2),
    n(Letter::C, NAT, 2),
    n(Letter::C, SHARP, 4),
    n(Letter::E, FLAT, 4),
    n(Letter::F, SHARP, 4),
    n(Letter::A, FLAT, 4),
    n(Letter::B, FLAT, 4),
    n(Letter::C, SHARP, 3),
    n(Letter::E, FLAT, 3),
    n(Letter::F, SHARP, 3),
    n(Letter::A, FLAT, 3),
    n(Letter::B, FLAT, 3),
];

/// Never fewer than this many notes in the curriculum pool.
pub const MIN_UNLOCKED: usize = 2;

/// Notes at or below A3 are read in the bass clef.
pub const BASS_CLEF_CEILING: i32 = 57;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    pub fn for_midi(midi: i32) -> Self {
        if midi <= BASS_CLEF_CEILING {
            Clef::Bass
        } else {
            Clef::Treble
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteChallenge {
    pub id: Uuid,
    pub note: Note,
    pub pitch_class: PitchClass,
    pub clef: Clef,
    /// Pool the note was drawn from.
    pub pool: Vec<Note>,
}

pub struct NoteRecognitionGenerator {
    arithmetic: Arc<dyn PitchArithmeticPort>,
}

impl Default for NoteRecognitionGenerator {
    fn default() -> Self {
        Self::new(Arc::new(TheoryPitchArithmetic::new()))
    }
}

impl NoteRecognitionGenerator {
    pub fn new(arithmetic: Arc<dyn PitchArithmeticPort>) -> Self {
        Self { arithmetic }
    }

    /// Curriculum prefix for `unlocked_count`, clamped to `[MIN_UNLOCKED, len]`.
    pub fn curriculum_pool(unlocked_count: usize) -> Vec<Note> {
        let count = unlocked_count.clamp(MIN_UNLOCKED, NOTE_CURRICULUM.len());
        NOTE_CURRICULUM[..count].to_vec()
    }

    /// Draws the next note. A non-empty `custom_pool` replaces the curriculum.
    /// A note heard twice in a row is left out of the draw when anything else is available.
    pub fn generate<R: Rng>(
        &self,
        unlocked_count: usize,
        history: &[Note],
        custom_pool: Option<&[Note]>,
        rng: &mut R,
    ) -> NoteChallenge {
        let pool = match custom_pool {
            Some(custom) if !custom.is_empty() => custom.to_vec(),
            _ => Self::curriculum_pool(unlocked_count),
        };

        let repeated = match history {
            [.., penultimate, last] if penultimate == last => Some(*last),
            _ => None,
        };
        let candidates: Vec<Note> = match repeated {
            Some(repeated) if pool.len() > 1 => pool
                .iter()
                .copied()
                .filter(|note| *note != repeated)
                .collect(),
            _ => Vec::new(),
        };

        let note = candidates
            .choose(rng)
            .or_else(|| pool.choose(rng))
            .copied()
            .unwrap_or(NOTE_CURRICULUM[0]);

        NoteChallenge {
            id: challenge_id(rng),
            note,
            pitch_class: note.pitch_class(),
            clef: Clef::for_midi(self.arithmetic.midi_of(&note)),
            pool,
        }
    }

    /// Next curriculum note to unlock, if any remain.
    pub fn next_to_unlock(unlocked_count: usize) -> Option<Note> {
        NOTE_CURRICULUM.get(unlocked_count.max(MIN_UNLOCKED)).copied()
    }
}
