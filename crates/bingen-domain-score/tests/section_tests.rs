use bingen_domain_score::{
    block_count, block_start_measure, measure_seconds, section_window, slice_section,
    BlockCursor, ScoreNoteEvent, SectionWindow, TimeSignature,
};
use pretty_assertions::assert_eq;

fn event(onset_seconds: f64, pitch: u8) -> ScoreNoteEvent {
    ScoreNoteEvent {
        onset_seconds,
        pitch,
        duration_seconds: 0.5,
        velocity: 80,
    }
}

#[test]
fn window_for_second_measure_at_sixty_bpm() {
    let window = section_window(2, 2, TimeSignature::COMMON, 60.0);
    assert_eq!(
        window,
        SectionWindow {
            start_seconds: 4.0,
            duration_seconds: 8.0,
        }
    );
    assert_eq!(window.end_seconds(), 12.0);
}

#[test]
fn slice_keeps_half_open_window_and_retimes() {
    let events = vec![
        event(0.0, 60),
        event(3.99, 62),
        event(4.0, 64),
        event(7.5, 65),
        event(11.99, 67),
        event(12.0, 69),
    ];
    let window = section_window(2, 2, TimeSignature::COMMON, 60.0);

    let sliced = slice_section(&events, window, 0);

    let onsets: Vec<f64> = sliced.iter().map(|e| e.onset_seconds).collect();
    let pitches: Vec<u8> = sliced.iter().map(|e| e.pitch).collect();
    assert_eq!(pitches, vec![64, 65, 67]);
    assert!((onsets[0] - 0.0).abs() < 1e-9);
    assert!((onsets[1] - 3.5).abs() < 1e-9);
    assert!((onsets[2] - 7.99).abs() < 1e-9);
    assert!(sliced.iter().all(|e| e.duration_seconds == 0.5));
}

#[test]
fn slice_transposes_and_drops_out_of_range_pitches() {
    let events = vec![event(0.0, 60), event(0.5, 125), event(1.0, 2)];
    let window = section_window(1, 1, TimeSignature::COMMON, 120.0);

    let up = slice_section(&events, window, 5);
    assert_eq!(up.iter().map(|e| e.pitch).collect::<Vec<_>>(), vec![65, 7]);

    let down = slice_section(&events, window, -3);
    assert_eq!(down.iter().map(|e| e.pitch).collect::<Vec<_>>(), vec![57, 122]);
}

#[test]
fn zero_length_section_is_empty() {
    let events = vec![event(0.0, 60)];
    let window = section_window(1, 0, TimeSignature::COMMON, 120.0);
    assert!(window.is_empty());
    assert!(slice_section(&events, window, 0).is_empty());

    let no_tempo = section_window(1, 4, TimeSignature::COMMON, 0.0);
    assert!(slice_section(&events, no_tempo, 0).is_empty());
}

#[test]
fn measure_length_counts_numerator_beats() {
    let three_four = TimeSignature {
        numerator: 3,
        denominator: 4,
    };
    let six_eight = TimeSignature {
        numerator: 6,
        denominator: 8,
    };
    assert_eq!(measure_seconds(three_four, 60.0), 3.0);
    assert_eq!(measure_seconds(six_eight, 120.0), 3.0);
}

#[test]
fn time_signature_parses_and_prints() {
    let parsed: TimeSignature = "3/4".parse().expect("valid time signature");
    assert_eq!(parsed.to_string(), "3/4");
    assert!("0/4".parse::<TimeSignature>().is_err());
    assert!("three".parse::<TimeSignature>().is_err());
}

#[test]
fn blocks_cover_every_measure() {
    assert_eq!(block_count(8, 2), 4);
    assert_eq!(block_count(9, 2), 5);
    assert_eq!(block_count(8, 0), 0);
    assert_eq!(block_start_measure(1, 4), 1);
    assert_eq!(block_start_measure(3, 4), 9);
}

#[test]
fn cursor_spends_repeats_and_refills_on_move() {
    let mut cursor = BlockCursor::new(9, 4, 2);
    assert_eq!(cursor.block_count(), 3);

    assert_eq!(cursor.take_play(), Some(true));
    assert_eq!(cursor.take_play(), Some(false));
    assert_eq!(cursor.take_play(), None);

    assert!(cursor.step(1));
    assert_eq!(cursor.block(), 2);
    assert_eq!(cursor.start_measure(), 5);
    assert_eq!(cursor.repeats_left(), 2);
    assert_eq!(cursor.take_play(), Some(false));

    assert!(cursor.step(1));
    assert_eq!(cursor.measures_in_block(), 1);
    assert!(!cursor.step(1));
    assert_eq!(cursor.block(), 3);

    assert!(cursor.step(-2));
    assert_eq!(cursor.block(), 1);
    assert_eq!(cursor.take_play(), Some(true));
    assert!(!cursor.step(-1));
}
