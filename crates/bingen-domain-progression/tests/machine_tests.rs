use bingen_domain_progression::{
    transition, AnswerEvent, Phase, ProgressionConfig, ProgressionState, ProgressionStateMachine,
};
use pretty_assertions::assert_eq;

fn state(level: usize, phase: Phase, streak: u32) -> ProgressionState {
    ProgressionState {
        level,
        phase,
        streak,
    }
}

fn practicing(sub_stage: usize) -> Phase {
    Phase::Practicing { sub_stage }
}

fn mastery(instrument_index: usize) -> Phase {
    Phase::Mastery { instrument_index }
}

fn config() -> ProgressionConfig {
    ProgressionConfig {
        threshold: 3,
        sub_stages: 2,
        level_count: 2,
        mastery_instruments: 2,
    }
}

#[test]
fn correct_below_threshold_only_grows_streak() {
    let cfg = config();
    let next = transition(&cfg, state(0, practicing(0), 1), AnswerEvent::Correct);
    assert_eq!(next, state(0, practicing(0), 2));
    let next = transition(&cfg, state(1, mastery(1), 0), AnswerEvent::Correct);
    assert_eq!(next, state(1, mastery(1), 1));
}

#[test]
fn threshold_advances_sub_stage() {
    let next = transition(&config(), state(0, practicing(0), 2), AnswerEvent::Correct);
    assert_eq!(next, state(0, practicing(1), 0));
}

#[test]
fn last_sub_stage_enters_mastery() {
    let next = transition(&config(), state(0, practicing(1), 2), AnswerEvent::Correct);
    assert_eq!(next, state(0, mastery(0), 0));
    assert!(next.in_mastery());
}

#[test]
fn mastery_rotates_instruments() {
    let next = transition(&config(), state(0, mastery(0), 2), AnswerEvent::Correct);
    assert_eq!(next, state(0, mastery(1), 0));
    assert_eq!(next.instrument_index(), 1);
}

#[test]
fn each_mastery_instrument_stays_on_the_hardest_sub_stage() {
    let cfg = config();
    let mut current = state(0, mastery(0), 0);
    for instrument_index in 0..cfg.mastery_instruments {
        assert_eq!(current.instrument_index(), instrument_index);
        assert_eq!(current.sub_stage(&cfg), cfg.sub_stages - 1);
        for _ in 0..cfg.threshold {
            current = transition(&cfg, current, AnswerEvent::Correct);
        }
    }
    assert_eq!(current, state(1, practicing(0), 0));
}

#[test]
fn finishing_rotation_unlocks_next_level() {
    let next = transition(&config(), state(0, mastery(1), 2), AnswerEvent::Correct);
    assert_eq!(next, state(1, practicing(0), 0));
    assert!(!next.in_mastery());
}

#[test]
fn finishing_last_level_completes_session() {
    let next = transition(&config(), state(1, mastery(1), 2), AnswerEvent::Correct);
    assert_eq!(next, state(1, Phase::Complete, 0));
    assert!(next.is_complete());
}

#[test]
fn incorrect_resets_streak_while_practicing() {
    let next = transition(&config(), state(1, practicing(1), 2), AnswerEvent::Incorrect);
    assert_eq!(next, state(1, practicing(1), 0));
}

#[test]
fn incorrect_in_mastery_drops_back_to_practice() {
    let next = transition(&config(), state(1, mastery(1), 1), AnswerEvent::Incorrect);
    assert_eq!(next, state(1, practicing(1), 0));
    assert_eq!(next.instrument_index(), 0);
}

#[test]
fn complete_ignores_answers() {
    let done = state(1, Phase::Complete, 0);
    assert_eq!(transition(&config(), done, AnswerEvent::Correct), done);
    assert_eq!(transition(&config(), done, AnswerEvent::Incorrect), done);
}

#[test]
fn without_mastery_last_sub_stage_unlocks_next_level() {
    let cfg = ProgressionConfig::note_recognition(3);
    let mut machine = ProgressionStateMachine::new(cfg);
    for _ in 0..4 {
        machine.on_answer(true);
    }
    assert_eq!(machine.state(), state(0, practicing(0), 4));
    assert_eq!(machine.on_answer(true), state(1, practicing(0), 0));
    for _ in 0..5 {
        machine.on_answer(true);
    }
    assert_eq!(machine.state().level, 2);
    for _ in 0..5 {
        machine.on_answer(true);
    }
    assert!(machine.state().is_complete());
}

#[test]
fn interval_preset_walks_a_full_level() {
    let mut machine = ProgressionStateMachine::new(ProgressionConfig::interval_mastery(2));
    let cfg = *machine.config();
    for sub_stage in 0..cfg.sub_stages {
        assert_eq!(machine.state().sub_stage(&cfg), sub_stage);
        for _ in 0..cfg.threshold {
            machine.on_answer(true);
        }
    }
    assert_eq!(machine.state(), state(0, mastery(0), 0));

    machine.on_answer(true);
    machine.on_answer(false);
    assert_eq!(machine.state(), state(0, practicing(4), 0));

    for _ in 0..3 {
        machine.on_answer(true);
    }
    for _ in 0..6 {
        machine.on_answer(true);
    }
    assert_eq!(machine.state(), state(1, practicing(0), 0));

    machine.reset();
    assert_eq!(machine.state(), ProgressionState::default());
}

#[test]
fn answer_event_from_bool() {
    assert_eq!(AnswerEvent::from(true), AnswerEvent::Correct);
    assert_eq!(AnswerEvent::from(false), AnswerEvent::Incorrect);
}
