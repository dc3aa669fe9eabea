use crate::arithmetic::spell_with_letter;
use bingen_ports::pitch::{Letter, Note};
use serde::{Deserialize, Serialize};

/// Spelling used when a pitch is renamed from its key position alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellingPreference {
    /// Naturals where possible, otherwise the common sharp or flat.
    Mixed,
    /// Every key named with a sharp-side spelling (`B#`, `Cx`, `E#` ...).
    Sharp,
    /// Every key named with a flat-side spelling (`Dbb`, `Fb`, `Cb` ...).
    Flat,
}

const MIXED: [(Letter, i32); 12] = [
    (Letter::C, 0),
    (Letter::C, 1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::A, -1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

const SHARP: [(Letter, i32); 12] = [
    (Letter::B, 1),
    (Letter::C, 1),
    (Letter::C, 2),
    (Letter::D, 1),
    (Letter::D, 2),
    (Letter::E, 1),
    (Letter::F, 1),
    (Letter::F, 2),
    (Letter::G, 1),
    (Letter::G, 2),
    (Letter::A, 1),
    (Letter::A, 2),
];

const FLAT: [(Letter, i32); 12] = [
    (Letter::D, -2),
    (Letter::D, -1),
    (Letter::E, -2),
    (Letter::E, -1),
    (Letter::F, -1),
    (Letter::G, -2),
    (Letter::G, -1),
    (Letter::A, -2),
    (Letter::A, -1),
    (Letter::B, -2),
    (Letter::B, -1),
    (Letter::C, -1),
];

/// Renames `midi` under `preference`. The octave follows the letter, so
/// `B#3` and `Dbb4` both come back for MIDI 60.
pub fn spell_midi(midi: i32, preference: SpellingPreference) -> Note {
    let table = match preference {
        SpellingPreference::Mixed => &MIXED,
        SpellingPreference::Sharp => &SHARP,
        SpellingPreference::Flat => &FLAT,
    };
    let (letter, alter) = table[midi.rem_euclid(12) as usize];
    spell_with_letter(midi, letter, alter)
}

/// Respells a note without changing its pitch.
pub fn respell(note: &Note, preference: SpellingPreference) -> Note {
    spell_midi(note.midi(), preference)
}

/// Respells every note in place order; voicing position is kept, nothing is re-sorted.
pub fn respell_all(notes: &[Note], preference: SpellingPreference) -> Vec<Note> {
    notes.iter().map(|note| respell(note, preference)).collect()
}

/// Flat-side spelling when any note is already flatted, sharp-side otherwise.
pub fn preferred_spelling(notes: &[Note]) -> SpellingPreference {
    if notes.iter().any(|note| note.accidental.alter() < 0) {
        SpellingPreference::Flat
    } else {
        SpellingPreference::Sharp
    }
}
