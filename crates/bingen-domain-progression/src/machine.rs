use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerEvent {
    Correct,
    Incorrect,
}

impl From<bool> for AnswerEvent {
    fn from(correct: bool) -> Self {
        if correct {
            AnswerEvent::Correct
        } else {
            AnswerEvent::Incorrect
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Consecutive correct answers needed to move on.
    pub threshold: u32,
    /// Sub-stages practiced inside each level (at least one).
    pub sub_stages: usize,
    pub level_count: usize,
    /// Timbres rotated through in the mastery phase; 0 skips the phase.
    pub mastery_instruments: usize,
}

impl ProgressionConfig {
    /// Interval dictation: five sub-stages per level over twelve levels, then every
    /// practice instrument in turn.
    pub fn interval_mastery(instrument_count: usize) -> Self {
        Self {
            threshold: 3,
            sub_stages: 5,
            level_count: 12,
            mastery_instruments: instrument_count.max(1),
        }
    }

    pub fn chord_practice(sub_stages: usize, level_count: usize, instrument_count: usize) -> Self {
        Self {
            threshold: 3,
            sub_stages: sub_stages.max(1),
            level_count: level_count.max(1),
            mastery_instruments: instrument_count,
        }
    }

    /// Note reading: every streak of five unlocks one more note. No mastery phase.
    pub fn note_recognition(level_count: usize) -> Self {
        Self {
            threshold: 5,
            sub_stages: 1,
            level_count: level_count.max(1),
            mastery_instruments: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Practicing { sub_stage: usize },
    Mastery { instrument_index: usize },
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub level: usize,
    pub phase: Phase,
    pub streak: u32,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 0,
            phase: Phase::Practicing { sub_stage: 0 },
            streak: 0,
        }
    }
}

impl ProgressionState {
    pub fn sub_stage(&self, config: &ProgressionConfig) -> usize {
        match self.phase {
            Phase::Practicing { sub_stage } => sub_stage,
            Phase::Mastery { .. } | Phase::Complete => config.sub_stages.saturating_sub(1),
        }
    }

    /// Index into the practice-instrument list; 0 outside the mastery phase.
    pub fn instrument_index(&self) -> usize {
        match self.phase {
            Phase::Mastery { instrument_index } => instrument_index,
            _ => 0,
        }
    }

    pub fn in_mastery(&self) -> bool {
        matches!(self.phase, Phase::Mastery { .. })
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }
}

/// Applies one answer to `state`.
pub fn transition(
    config: &ProgressionConfig,
    state: ProgressionState,
    event: AnswerEvent,
) -> ProgressionState {
    if state.is_complete() {
        return state;
    }

    match event {
        AnswerEvent::Incorrect => {
            let phase = match state.phase {
                Phase::Mastery { .. } => Phase::Practicing {
                    sub_stage: config.sub_stages.saturating_sub(1),
                },
                phase => phase,
            };
            ProgressionState {
                phase,
                streak: 0,
                ..state
            }
        }
        AnswerEvent::Correct => {
            let streak = state.streak + 1;
            if streak < config.threshold.max(1) {
                return ProgressionState { streak, ..state };
            }

            let phase = match state.phase {
                Phase::Practicing { sub_stage } if sub_stage + 1 < config.sub_stages => {
                    Phase::Practicing {
                        sub_stage: sub_stage + 1,
                    }
                }
                Phase::Practicing { .. } if config.mastery_instruments > 0 => Phase::Mastery {
                    instrument_index: 0,
                },
                Phase::Mastery { instrument_index }
                    if instrument_index + 1 < config.mastery_instruments =>
                {
                    Phase::Mastery {
                        instrument_index: instrument_index + 1,
                    }
                }
                _ => return advance_level(config, state),
            };
            ProgressionState {
                level: state.level,
                phase,
                streak: 0,
            }
        }
    }
}

fn advance_level(config: &ProgressionConfig, state: ProgressionState) -> ProgressionState {
    if state.level + 1 < config.level_count {
        ProgressionState {
            level: state.level + 1,
            phase: Phase::Practicing { sub_stage: 0 },
            streak: 0,
        }
    } else {
        ProgressionState {
            level: state.level,
            phase: Phase::Complete,
            streak: 0,
        }
    }
}

/// Owns the session's progression record. Call `on_answer` once per answer.
#[derive(Clone, Debug)]
pub struct ProgressionStateMachine {
    config: ProgressionConfig,
    state: ProgressionState,
}

impl ProgressionStateMachine {
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            state: ProgressionState::default(),
        }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn state(&self) -> ProgressionState {
        self.state
    }

    pub fn on_answer(&mut self, correct: bool) -> ProgressionState {
        self.state = transition(&self.config, self.state, AnswerEvent::from(correct));
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ProgressionState::default();
    }
}
