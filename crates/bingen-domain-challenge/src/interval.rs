use crate::challenge_id;
use bingen_domain_theory::TheoryPitchArithmetic;
use bingen_ports::pitch::{Direction, Interval, Note, PitchArithmeticPort};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use uuid::Uuid;

/// Roots are drawn from A3..C5.
pub const INTERVAL_ROOT_RANGE: RangeInclusive<i32> = 57..=72;

const FALLBACK_INTERVAL: Interval = Interval::MAJOR_THIRD;
const FALLBACK_MODES: [IntervalMode; 3] = [
    IntervalMode::Ascending,
    IntervalMode::Descending,
    IntervalMode::Harmonic,
];

/// Playback mode a trainer may ask for. `Mixed` is resolved at generation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalMode {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
    Mixed,
    Harmonic,
}

impl IntervalMode {
    pub const ALL: [IntervalMode; 4] = [
        IntervalMode::Ascending,
        IntervalMode::Descending,
        IntervalMode::Mixed,
        IntervalMode::Harmonic,
    ];
}

/// Direction a generated challenge is actually played in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalDirection {
    Ascending,
    Descending,
    /// Both notes at once.
    Harmonic,
}

impl IntervalDirection {
    pub fn is_harmonic(self) -> bool {
        self == IntervalDirection::Harmonic
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalOptions {
    pub allowed_intervals: Vec<Interval>,
    pub allowed_modes: Vec<IntervalMode>,
}

impl IntervalOptions {
    pub fn new(allowed_intervals: Vec<Interval>, allowed_modes: Vec<IntervalMode>) -> Self {
        Self {
            allowed_intervals,
            allowed_modes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalChallenge {
    pub id: Uuid,
    pub interval: Interval,
    pub direction: IntervalDirection,
    /// Lower note of the pair; the answer is measured from here.
    pub root: Note,
    /// Playback order: ascending `[root, upper]`, descending `[upper, root]`.
    pub notes: Vec<Note>,
}

impl IntervalChallenge {
    /// Semitones from the first heard note to the second, negative when descending.
    pub fn signed_semitones(&self) -> i32 {
        match self.notes.as_slice() {
            [first, second] => second.midi() - first.midi(),
            _ => 0,
        }
    }
}

/// One step of the interval curriculum.
#[derive(Clone, Copy, Debug)]
pub struct IntervalLevel {
    pub id: u8,
    pub name: &'static str,
    pub intervals: &'static [Interval],
}

const fn level(id: u8, name: &'static str, intervals: &'static [Interval]) -> IntervalLevel {
    IntervalLevel {
        id,
        name,
        intervals,
    }
}

const SECONDS: &[Interval] = &[Interval::MINOR_SECOND, Interval::MAJOR_SECOND];
const THIRDS: &[Interval] = &[Interval::MINOR_THIRD, Interval::MAJOR_THIRD];
const SECONDS_THIRDS: &[Interval] = &[
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::MINOR_THIRD,
    Interval::MAJOR_THIRD,
];
const PERFECT: &[Interval] = &[Interval::PERFECT_FOURTH, Interval::PERFECT_FIFTH];
const UP_TO_FIFTHS: &[Interval] = &[
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::MINOR_THIRD,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FOURTH,
    Interval::PERFECT_FIFTH,
];
const TRITONE: &[Interval] = &[Interval::AUGMENTED_FOURTH];
const UP_TO_TRITONE: &[Interval] = &[
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::MINOR_THIRD,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FOURTH,
    Interval::PERFECT_FIFTH,
    Interval::AUGMENTED_FOURTH,
];
const SIXTHS: &[Interval] = &[Interval::MINOR_SIXTH, Interval::MAJOR_SIXTH];
const UP_TO_SIXTHS: &[Interval] = &[
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::MINOR_THIRD,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FOURTH,
    Interval::PERFECT_FIFTH,
    Interval::AUGMENTED_FOURTH,
    Interval::MINOR_SIXTH,
    Interval::MAJOR_SIXTH,
];
const SEVENTHS: &[Interval] = &[Interval::MINOR_SEVENTH, Interval::MAJOR_SEVENTH];
const UP_TO_SEVENTHS: &[Interval] = &[
    Interval::MINOR_SECOND,
    Interval::MAJOR_SECOND,
    Interval::MINOR_THIRD,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FOURTH,
    Interval::PERFECT_FIFTH,
    Interval::AUGMENTED_FOURTH,
    Interval::MINOR_SIXTH,
    Interval::MAJOR_SIXTH,
    Interval::MINOR_SEVENTH,
    Interval::MAJOR_SEVENTH,
];
const OCTAVES: &[Interval] = &[Interval::OCTAVE, Interval::UNISON];

pub const INTERVAL_LEVELS: [IntervalLevel; 12] = [
    level(1, "Seconds", SECONDS),
    level(2, "Thirds", THIRDS),
    level(3, "Seconds and thirds", SECONDS_THIRDS),
    level(4, "Perfect", PERFECT),
    level(5, "Review to fifths", UP_TO_FIFTHS),
    level(6, "Tritone", TRITONE),
    level(7, "Review to tritone", UP_TO_TRITONE),
    level(8, "Sixths", SIXTHS),
    level(9, "Review to sixths", UP_TO_SIXTHS),
    level(10, "Sevenths", SEVENTHS),
    level(11, "Review to sevenths", UP_TO_SEVENTHS),
    level(12, "Octaves", OCTAVES),
];

/// Sub-stages inside a level; the fifth one (`FULL_MIX_STAGE`) mixes all four.
pub const STAGE_MODES: [IntervalMode; 4] = IntervalMode::ALL;
pub const FULL_MIX_STAGE: usize = 4;
pub const STAGES_PER_LEVEL: usize = FULL_MIX_STAGE + 1;

pub struct IntervalChallengeGenerator {
    arithmetic: Arc<dyn PitchArithmeticPort>,
}

impl Default for IntervalChallengeGenerator {
    fn default() -> Self {
        Self::new(Arc::new(TheoryPitchArithmetic::new()))
    }
}

impl IntervalChallengeGenerator {
    pub fn new(arithmetic: Arc<dyn PitchArithmeticPort>) -> Self {
        Self { arithmetic }
    }

    pub fn generate<R: Rng>(&self, options: &IntervalOptions, rng: &mut R) -> IntervalChallenge {
        let interval = options
            .allowed_intervals
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_INTERVAL);
        let mode = options
            .allowed_modes
            .choose(rng)
            .or_else(|| FALLBACK_MODES.choose(rng))
            .copied()
            .unwrap_or(IntervalMode::Ascending);
        let direction = resolve_mode(mode, rng);

        let root = self
            .arithmetic
            .note_from_midi(rng.gen_range(INTERVAL_ROOT_RANGE));
        let upper = self.arithmetic.transpose(&root, interval, Direction::Up);
        let notes = match direction {
            IntervalDirection::Descending => vec![upper, root],
            IntervalDirection::Ascending | IntervalDirection::Harmonic => vec![root, upper],
        };

        IntervalChallenge {
            id: challenge_id(rng),
            interval,
            direction,
            root,
            notes,
        }
    }

    /// Challenge for `level` (0-based, clamped to the curriculum) at `sub_stage`.
    pub fn generate_for_stage<R: Rng>(
        &self,
        level: usize,
        sub_stage: usize,
        rng: &mut R,
    ) -> IntervalChallenge {
        let level = &INTERVAL_LEVELS[level.min(INTERVAL_LEVELS.len() - 1)];
        let modes = match STAGE_MODES.get(sub_stage) {
            Some(mode) => vec![*mode],
            None => STAGE_MODES.to_vec(),
        };
        self.generate(&IntervalOptions::new(level.intervals.to_vec(), modes), rng)
    }
}

fn resolve_mode<R: Rng>(mode: IntervalMode, rng: &mut R) -> IntervalDirection {
    match mode {
        IntervalMode::Ascending => IntervalDirection::Ascending,
        IntervalMode::Descending => IntervalDirection::Descending,
        IntervalMode::Harmonic => IntervalDirection::Harmonic,
        IntervalMode::Mixed => {
            if rng.gen_bool(0.5) {
                IntervalDirection::Ascending
            } else {
                IntervalDirection::Descending
            }
        }
    }
}
