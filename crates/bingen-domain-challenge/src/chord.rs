use crate::challenge_id;
use bingen_domain_theory::TheoryPitchArithmetic;
use bingen_ports::pitch::{
    Accidental, ChordQuality, Direction, Interval, Letter, Note, PitchArithmeticPort, PitchClass,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Root spellings offered by the chord trainer, enharmonic pairs included.
pub const CHORD_ROOTS: [PitchClass; 17] = [
    PitchClass::new(Letter::C, Accidental::NATURAL),
    PitchClass::new(Letter::C, Accidental::SHARP),
    PitchClass::new(Letter::D, Accidental::FLAT),
    PitchClass::new(Letter::D, Accidental::NATURAL),
    PitchClass::new(Letter::D, Accidental::SHARP),
    PitchClass::new(Letter::E, Accidental::FLAT),
    PitchClass::new(Letter::E, Accidental::NATURAL),
    PitchClass::new(Letter::F, Accidental::NATURAL),
    PitchClass::new(Letter::F, Accidental::SHARP),
    PitchClass::new(Letter::G, Accidental::FLAT),
    PitchClass::new(Letter::G, Accidental::NATURAL),
    PitchClass::new(Letter::G, Accidental::SHARP),
    PitchClass::new(Letter::A, Accidental::FLAT),
    PitchClass::new(Letter::A, Accidental::NATURAL),
    PitchClass::new(Letter::A, Accidental::SHARP),
    PitchClass::new(Letter::B, Accidental::FLAT),
    PitchClass::new(Letter::B, Accidental::NATURAL),
];

/// Lowest voice of every voicing lands in `[LOW_VOICE_FLOOR, LOW_VOICE_CEILING]` (E3..B4).
pub const LOW_VOICE_FLOOR: i32 = 52;
pub const LOW_VOICE_CEILING: i32 = 71;

const BUILD_OCTAVE: i32 = 4;
const FALLBACK_QUALITY: ChordQuality = ChordQuality::Major;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordOptions {
    pub allowed_qualities: Vec<ChordQuality>,
    pub allowed_inversions: Vec<u8>,
}

impl ChordOptions {
    pub fn new(allowed_qualities: Vec<ChordQuality>, allowed_inversions: Vec<u8>) -> Self {
        Self {
            allowed_qualities,
            allowed_inversions,
        }
    }

    /// Every quality in every inversion.
    pub fn all() -> Self {
        Self::new(ChordQuality::ALL.to_vec(), vec![0, 1, 2, 3])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordChallenge {
    pub id: Uuid,
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub inversion: u8,
    /// Ascending by MIDI number, spelling as derived from the root.
    pub notes: Vec<Note>,
}

impl ChordChallenge {
    /// Chord symbol such as `Ebm7` or `F#dim`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.root, self.quality)
    }

    pub fn midi_notes(&self) -> Vec<i32> {
        self.notes.iter().map(|note| note.midi()).collect()
    }
}

pub struct ChordChallengeGenerator {
    arithmetic: Arc<dyn PitchArithmeticPort>,
}

impl Default for ChordChallengeGenerator {
    fn default() -> Self {
        Self::new(Arc::new(TheoryPitchArithmetic::new()))
    }
}

impl ChordChallengeGenerator {
    pub fn new(arithmetic: Arc<dyn PitchArithmeticPort>) -> Self {
        Self { arithmetic }
    }

    /// Draws a random root, quality and inversion. Options that leave nothing to
    /// choose from fall back to a root-position major triad.
    pub fn generate<R: Rng>(&self, options: &ChordOptions, rng: &mut R) -> ChordChallenge {
        let root = CHORD_ROOTS[rng.gen_range(0..CHORD_ROOTS.len())];
        let quality = options
            .allowed_qualities
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_QUALITY);

        let voices = self.arithmetic.chord_formula(quality).len();
        let max_inversion = voices.saturating_sub(1) as u8;
        let inversions: Vec<u8> = options
            .allowed_inversions
            .iter()
            .copied()
            .filter(|inversion| *inversion <= max_inversion)
            .collect();
        let inversion = inversions.choose(rng).copied().unwrap_or(0);

        ChordChallenge {
            id: challenge_id(rng),
            root,
            quality,
            inversion,
            notes: self.build(root, quality, inversion),
        }
    }

    /// Deterministic voicing for `root` / `quality` / `inversion`.
    pub fn build(&self, root: PitchClass, quality: ChordQuality, inversion: u8) -> Vec<Note> {
        let root_note = root.at_octave(BUILD_OCTAVE);
        let pitch_classes: Vec<PitchClass> = self
            .arithmetic
            .chord_formula(quality)
            .into_iter()
            .map(|interval| {
                self.arithmetic
                    .transpose(&root_note, interval, Direction::Up)
                    .pitch_class()
            })
            .collect();

        let mut notes = self.stack_ascending(&pitch_classes);
        self.invert(&mut notes, inversion);
        self.normalize_range(&mut notes);
        notes
    }

    fn stack_ascending(&self, pitch_classes: &[PitchClass]) -> Vec<Note> {
        let mut notes: Vec<Note> = Vec::with_capacity(pitch_classes.len());
        let mut octave = BUILD_OCTAVE;
        for pitch_class in pitch_classes {
            let mut note = pitch_class.at_octave(octave);
            if let Some(previous) = notes.last() {
                if self.arithmetic.midi_of(&note) < self.arithmetic.midi_of(previous) {
                    octave += 1;
                    note = pitch_class.at_octave(octave);
                }
            }
            notes.push(note);
        }
        notes
    }

    fn invert(&self, notes: &mut Vec<Note>, inversion: u8) {
        if notes.is_empty() {
            return;
        }
        for _ in 0..inversion {
            let lowest = notes.remove(0);
            notes.push(
                self.arithmetic
                    .transpose(&lowest, Interval::OCTAVE, Direction::Up),
            );
        }
    }

    fn normalize_range(&self, notes: &mut [Note]) {
        let Some(lowest) = notes.first().copied() else {
            return;
        };
        let midi = self.arithmetic.midi_of(&lowest);
        let shift = if midi > LOW_VOICE_CEILING {
            -((midi - LOW_VOICE_CEILING + 11) / 12)
        } else if midi < LOW_VOICE_FLOOR {
            (LOW_VOICE_FLOOR - midi + 11) / 12
        } else {
            0
        };
        if shift == 0 {
            return;
        }
        for note in notes.iter_mut() {
            *note = note.with_octave(note.octave + shift);
        }
    }
}
