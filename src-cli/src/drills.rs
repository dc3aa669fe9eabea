use crate::answers::{check_chord, check_interval, check_note};
use crate::cli::Command;
use crate::terminal::Prompt;
use crate::CliError;
use bingen_core::{LoadOutcome, PlaybackEngine, PlaybackError, ScheduleSummary};
use bingen_domain_challenge::{
    ChordChallenge, ChordChallengeGenerator, ChordOptions, IntervalChallenge,
    IntervalChallengeGenerator, NoteChallenge, NoteRecognitionGenerator, INTERVAL_LEVELS,
    MIN_UNLOCKED, NOTE_CURRICULUM,
};
use bingen_domain_progression::{ProgressionConfig, ProgressionState, ProgressionStateMachine};
use bingen_ports::instrument::InstrumentName;
use bingen_ports::pitch::{ChordQuality, Note, PitchError};
use rand::rngs::StdRng;
use std::io::BufRead;
use std::time::Duration;

/// Chord vocabulary per level; sub-stage `n` adds inversion `n`.
const CHORD_LEVELS: [&[ChordQuality]; 5] = [
    &[ChordQuality::Major, ChordQuality::Minor],
    &[
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Augmented,
        ChordQuality::Diminished,
    ],
    &[
        ChordQuality::DominantSeventh,
        ChordQuality::MajorSeventh,
        ChordQuality::MinorSeventh,
    ],
    &[
        ChordQuality::MinorSeventh,
        ChordQuality::HalfDiminished,
        ChordQuality::DiminishedSeventh,
    ],
    &ChordQuality::ALL,
];
const CHORD_SUB_STAGES: usize = 3;
const MAX_INVERSION: u8 = 3;
/// Loads quicker than this finish without a notice.
const LOAD_NOTICE_AFTER: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrillKind {
    Chord,
    Interval,
    Note,
}

impl DrillKind {
    pub fn for_command(command: &Command) -> Option<Self> {
        match command {
            Command::Chord => Some(DrillKind::Chord),
            Command::Interval => Some(DrillKind::Interval),
            Command::Note => Some(DrillKind::Note),
            Command::Dictation(_) | Command::Devices => None,
        }
    }

    pub fn config(self, practice_instruments: usize) -> ProgressionConfig {
        match self {
            DrillKind::Chord => ProgressionConfig::chord_practice(
                CHORD_SUB_STAGES,
                CHORD_LEVELS.len(),
                practice_instruments,
            ),
            DrillKind::Interval => ProgressionConfig::interval_mastery(practice_instruments),
            DrillKind::Note => {
                ProgressionConfig::note_recognition(NOTE_CURRICULUM.len() - MIN_UNLOCKED + 1)
            }
        }
    }

    fn answer_hint(self) -> &'static str {
        match self {
            DrillKind::Chord => "quality or chord symbol",
            DrillKind::Interval => "interval such as 3M",
            DrillKind::Note => "note name",
        }
    }
}

pub enum Exercise {
    Chord(ChordChallenge),
    Interval(IntervalChallenge),
    Note(NoteChallenge),
}

impl Exercise {
    fn play(&self, engine: &PlaybackEngine) -> Result<ScheduleSummary, PlaybackError> {
        match self {
            Exercise::Chord(chord) => engine.play(&chord.notes),
            Exercise::Interval(interval) if interval.direction.is_harmonic() => {
                engine.play(&interval.notes)
            }
            Exercise::Interval(interval) => engine.arpeggiate(&interval.notes),
            Exercise::Note(note) => engine.play(&[note.note]),
        }
    }

    fn check(&self, answer: &str) -> Result<bool, PitchError> {
        match self {
            Exercise::Chord(chord) => check_chord(answer, chord),
            Exercise::Interval(interval) => check_interval(answer, interval),
            Exercise::Note(note) => check_note(answer, note),
        }
    }

    fn solution(&self) -> String {
        match self {
            Exercise::Chord(chord) => format!(
                "{} ({} {}, inversion {})",
                chord.symbol(),
                chord.root,
                chord.quality.label(),
                chord.inversion
            ),
            Exercise::Interval(interval) => format!(
                "{} ({}, {:?})",
                interval.interval,
                interval.interval.name(),
                interval.direction
            ),
            Exercise::Note(note) => note.note.to_string(),
        }
    }
}

/// Generators plus the per-drill memory they need.
pub struct Drill {
    kind: DrillKind,
    chords: ChordChallengeGenerator,
    intervals: IntervalChallengeGenerator,
    notes: NoteRecognitionGenerator,
    note_history: Vec<Note>,
}

impl Drill {
    pub fn new(kind: DrillKind) -> Self {
        Self {
            kind,
            chords: ChordChallengeGenerator::default(),
            intervals: IntervalChallengeGenerator::default(),
            notes: NoteRecognitionGenerator::default(),
            note_history: Vec::new(),
        }
    }

    pub fn next(
        &mut self,
        state: &ProgressionState,
        config: &ProgressionConfig,
        rng: &mut StdRng,
    ) -> Exercise {
        let sub_stage = state.sub_stage(config);
        match self.kind {
            DrillKind::Chord => {
                let qualities = CHORD_LEVELS[state.level.min(CHORD_LEVELS.len() - 1)];
                // The last stage opens every inversion the chord has.
                let top = if sub_stage + 1 >= config.sub_stages {
                    MAX_INVERSION
                } else {
                    sub_stage as u8
                };
                let inversions = (0..=top).collect();
                let options = ChordOptions::new(qualities.to_vec(), inversions);
                Exercise::Chord(self.chords.generate(&options, rng))
            }
            DrillKind::Interval => {
                Exercise::Interval(self.intervals.generate_for_stage(state.level, sub_stage, rng))
            }
            DrillKind::Note => {
                let challenge =
                    self.notes
                        .generate(unlocked_notes(state), &self.note_history, None, rng);
                self.note_history.push(challenge.note);
                Exercise::Note(challenge)
            }
        }
    }
}

fn unlocked_notes(state: &ProgressionState) -> usize {
    MIN_UNLOCKED + state.level
}

fn level_name(kind: DrillKind, level: usize) -> String {
    match kind {
        DrillKind::Chord => CHORD_LEVELS
            .get(level)
            .map(|qualities| {
                qualities
                    .iter()
                    .map(|quality| quality.symbol())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default(),
        DrillKind::Interval => INTERVAL_LEVELS
            .get(level)
            .map(|level| level.name.to_string())
            .unwrap_or_default(),
        DrillKind::Note => format!("{} notes", MIN_UNLOCKED + level),
    }
}

/// Switches to `name` and blocks until it is playable.
pub fn load_instrument(engine: &PlaybackEngine, name: InstrumentName) -> LoadOutcome {
    let ticket = engine.set_instrument(name);
    if let Some(outcome) = ticket.wait_timeout(LOAD_NOTICE_AFTER) {
        return outcome;
    }
    println!("Loading {name}...");
    ticket.wait()
}

/// Loads the instrument the progression calls for, if it isn't already active.
fn sync_instrument(
    engine: &PlaybackEngine,
    state: &ProgressionState,
    default_instrument: InstrumentName,
    practice_instruments: &[InstrumentName],
) {
    let wanted = if state.in_mastery() && !practice_instruments.is_empty() {
        practice_instruments[state.instrument_index() % practice_instruments.len()]
    } else {
        default_instrument
    };
    if engine.rack().active_name() == Some(wanted) {
        return;
    }
    if let Err(e) = load_instrument(engine, wanted) {
        tracing::warn!(instrument = %wanted, error = %e, "instrument unavailable, keeping the current one");
    }
}

pub fn run<R: BufRead>(
    kind: DrillKind,
    engine: &PlaybackEngine,
    default_instrument: InstrumentName,
    practice_instruments: &[InstrumentName],
    prompt: &mut Prompt<R>,
    rng: &mut StdRng,
) -> Result<(), CliError> {
    let mut machine = ProgressionStateMachine::new(kind.config(practice_instruments.len()));
    let mut drill = Drill::new(kind);
    println!("Enter = replay, q = quit. Answer with a {}.", kind.answer_hint());
    println!("Level 1: {}", level_name(kind, 0));

    loop {
        let state = machine.state();
        if state.is_complete() {
            println!("Curriculum complete.");
            return Ok(());
        }
        sync_instrument(engine, &state, default_instrument, practice_instruments);

        let exercise = drill.next(&state, machine.config(), rng);
        exercise.play(engine)?;

        let correct = loop {
            let Some(answer) = prompt.ask(">")? else {
                return Ok(());
            };
            match answer.as_str() {
                "q" | "quit" => return Ok(()),
                "" | "r" => {
                    exercise.play(engine)?;
                }
                answer => match exercise.check(answer) {
                    Ok(correct) => break correct,
                    Err(e) => println!("{e}"),
                },
            }
        };

        if correct {
            println!("Correct: {}", exercise.solution());
        } else {
            println!("No, it was {}", exercise.solution());
        }
        let next = machine.on_answer(correct);
        report(kind, &state, &next, machine.config(), practice_instruments);
    }
}

fn report(
    kind: DrillKind,
    before: &ProgressionState,
    after: &ProgressionState,
    config: &ProgressionConfig,
    practice_instruments: &[InstrumentName],
) {
    if after.level != before.level && !after.is_complete() {
        println!("Level {}: {}", after.level + 1, level_name(kind, after.level));
        if kind == DrillKind::Note {
            if let Some(note) = NOTE_CURRICULUM.get(unlocked_notes(after) - 1) {
                println!("Unlocked {note}");
            }
        }
    } else if after.in_mastery() && !before.in_mastery() {
        println!("Mastery round: same material on every practice instrument.");
    } else if after.sub_stage(config) != before.sub_stage(config) && !after.in_mastery() {
        println!("Stage {} of {}", after.sub_stage(config) + 1, config.sub_stages);
    } else if after.instrument_index() != before.instrument_index() {
        if let Some(name) = practice_instruments.get(after.instrument_index()) {
            println!("Next instrument: {name}");
        }
    }
    tracing::debug!(?after, streak = after.streak, "progression");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingen_domain_progression::Phase;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    #[test]
    fn chord_levels_grow_inversions_with_sub_stage() {
        let config = DrillKind::Chord.config(0);
        let mut drill = Drill::new(DrillKind::Chord);
        let mut rng = StdRng::seed_from_u64(11);
        let state = ProgressionState {
            level: 0,
            phase: Phase::Practicing { sub_stage: 0 },
            streak: 0,
        };
        for _ in 0..20 {
            let Exercise::Chord(chord) = drill.next(&state, &config, &mut rng) else {
                panic!("chord drill produced another exercise");
            };
            assert_eq!(chord.inversion, 0);
            assert!(matches!(chord.quality, ChordQuality::Major | ChordQuality::Minor));
        }
    }

    #[test]
    fn note_drill_pool_follows_the_level() {
        let config = DrillKind::Note.config(0);
        let mut drill = Drill::new(DrillKind::Note);
        let mut rng = StdRng::seed_from_u64(5);
        let state = ProgressionState {
            level: 3,
            phase: Phase::Practicing { sub_stage: 0 },
            streak: 0,
        };
        let Exercise::Note(challenge) = drill.next(&state, &config, &mut rng) else {
            panic!("note drill produced another exercise");
        };
        assert_eq!(challenge.pool.len(), MIN_UNLOCKED + 3);
        assert_eq!(config.level_count, NOTE_CURRICULUM.len() - 1);
    }
}
