use bingen_ports::pitch::{
    Accidental, ChordQuality, Direction, Interval, Letter, Note, PitchArithmeticPort,
};

const FLAT_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::D, -1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::G, -1),
    (Letter::G, 0),
    (Letter::A, -1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

/// Tonal pitch arithmetic on spelled notes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TheoryPitchArithmetic;

impl TheoryPitchArithmetic {
    pub fn new() -> Self {
        Self
    }
}

/// Spells `midi` with `letter`, deriving octave and alteration from the pitch.
pub(crate) fn spell_with_letter(midi: i32, letter: Letter, alter: i32) -> Note {
    let octave = (midi - letter.natural_semitone() - alter).div_euclid(12) - 1;
    Note::new(letter, Accidental(alter as i8), octave)
}

impl PitchArithmeticPort for TheoryPitchArithmetic {
    fn midi_of(&self, note: &Note) -> i32 {
        note.midi()
    }

    fn transpose(&self, note: &Note, interval: Interval, direction: Direction) -> Note {
        let sign = direction.sign();
        let diatonic = note.octave * 7 + note.letter.index() + sign * interval.steps();
        let letter = Letter::from_index(diatonic);
        let octave = diatonic.div_euclid(7);

        let target_midi = note.midi() + sign * interval.semitones();
        let natural_midi = (octave + 1) * 12 + letter.natural_semitone();
        Note::new(letter, Accidental((target_midi - natural_midi) as i8), octave)
    }

    fn chord_formula(&self, quality: ChordQuality) -> Vec<Interval> {
        use Interval as I;
        match quality {
            ChordQuality::Major => vec![I::UNISON, I::MAJOR_THIRD, I::PERFECT_FIFTH],
            ChordQuality::Minor => vec![I::UNISON, I::MINOR_THIRD, I::PERFECT_FIFTH],
            ChordQuality::Augmented => vec![I::UNISON, I::MAJOR_THIRD, I::AUGMENTED_FIFTH],
            ChordQuality::Diminished => vec![I::UNISON, I::MINOR_THIRD, I::DIMINISHED_FIFTH],
            ChordQuality::DominantSeventh => vec![
                I::UNISON,
                I::MAJOR_THIRD,
                I::PERFECT_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::MajorSeventh => vec![
                I::UNISON,
                I::MAJOR_THIRD,
                I::PERFECT_FIFTH,
                I::MAJOR_SEVENTH,
            ],
            ChordQuality::MinorSeventh => vec![
                I::UNISON,
                I::MINOR_THIRD,
                I::PERFECT_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::HalfDiminished => vec![
                I::UNISON,
                I::MINOR_THIRD,
                I::DIMINISHED_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::DiminishedSeventh => vec![
                I::UNISON,
                I::MINOR_THIRD,
                I::DIMINISHED_FIFTH,
                I::DIMINISHED_SEVENTH,
            ],
        }
    }

    fn note_from_midi(&self, midi: i32) -> Note {
        let (letter, alter) = FLAT_SPELLINGS[midi.rem_euclid(12) as usize];
        spell_with_letter(midi, letter, alter as i32)
    }
}
