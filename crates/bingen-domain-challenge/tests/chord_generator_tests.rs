use bingen_domain_challenge::{
    ChordChallengeGenerator, ChordOptions, CHORD_ROOTS, LOW_VOICE_CEILING, LOW_VOICE_FLOOR,
};
use bingen_ports::pitch::{Accidental, ChordQuality, Letter, Note, PitchClass};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn names(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|note| note.to_string()).collect()
}

#[test]
fn c_major_second_inversion_is_g_c_e() {
    let generator = ChordChallengeGenerator::default();
    let c = PitchClass::natural(Letter::C);

    assert_eq!(names(&generator.build(c, ChordQuality::Major, 0)), ["C4", "E4", "G4"]);
    assert_eq!(names(&generator.build(c, ChordQuality::Major, 1)), ["E4", "G4", "C5"]);

    let second = generator.build(c, ChordQuality::Major, 2);
    assert_eq!(names(&second), ["G4", "C5", "E5"]);
    let midi: Vec<i32> = second.iter().map(|note| note.midi()).collect();
    assert_eq!(midi, vec![67, 72, 76]);
}

#[test]
fn every_root_quality_and_inversion_is_ascending_and_in_range() {
    let generator = ChordChallengeGenerator::default();
    for root in CHORD_ROOTS {
        for quality in ChordQuality::ALL {
            let voices = generator.build(root, quality, 0).len();
            assert!(voices == 3 || voices == 4);
            for inversion in 0..voices as u8 {
                let notes = generator.build(root, quality, inversion);
                assert_eq!(notes.len(), voices, "{root}{quality} inv {inversion}");
                for pair in notes.windows(2) {
                    assert!(
                        pair[0].midi() <= pair[1].midi(),
                        "{root}{quality} inv {inversion}: {:?}",
                        names(&notes)
                    );
                }
                let lowest = notes[0].midi();
                assert!(
                    (LOW_VOICE_FLOOR..=LOW_VOICE_CEILING).contains(&lowest),
                    "{root}{quality} inv {inversion} starts at {lowest}"
                );
            }
        }
    }
}

#[test]
fn theoretical_roots_keep_their_spelling_through_inversions() {
    let generator = ChordChallengeGenerator::default();
    let roots = [
        PitchClass::new(Letter::C, Accidental::FLAT),
        PitchClass::new(Letter::B, Accidental::SHARP),
        PitchClass::new(Letter::E, Accidental::DOUBLE_FLAT),
        PitchClass::new(Letter::F, Accidental::DOUBLE_SHARP),
    ];
    for root in roots {
        for quality in ChordQuality::ALL {
            let root_position = generator.build(root, quality, 0);
            let mut expected: Vec<PitchClass> =
                root_position.iter().map(|note| note.pitch_class()).collect();
            for inversion in 1..root_position.len() as u8 {
                expected.rotate_left(1);
                let inverted = generator.build(root, quality, inversion);
                let classes: Vec<PitchClass> =
                    inverted.iter().map(|note| note.pitch_class()).collect();
                assert_eq!(classes, expected, "{root}{quality} inv {inversion}");
            }
        }
    }
}

#[test]
fn c_flat_root_stays_c_flat_an_octave_up() {
    let generator = ChordChallengeGenerator::default();
    let c_flat = PitchClass::new(Letter::C, Accidental::FLAT);
    let notes = generator.build(c_flat, ChordQuality::Major, 1);
    assert_eq!(names(&notes), ["Eb4", "Gb4", "Cb5"]);
}

#[test]
fn empty_options_fall_back_to_root_position_major() {
    let generator = ChordChallengeGenerator::default();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let challenge = generator.generate(&ChordOptions::default(), &mut rng);
        assert_eq!(challenge.quality, ChordQuality::Major);
        assert_eq!(challenge.inversion, 0);
        assert_eq!(challenge.notes.len(), 3);
    }
}

#[test]
fn inversions_beyond_voice_count_are_ignored() {
    let generator = ChordChallengeGenerator::default();
    let mut rng = StdRng::seed_from_u64(11);
    let options = ChordOptions::new(vec![ChordQuality::Minor], vec![3, 5]);
    for _ in 0..20 {
        let challenge = generator.generate(&options, &mut rng);
        assert_eq!(challenge.inversion, 0);
    }

    let options = ChordOptions::new(vec![ChordQuality::MinorSeventh], vec![3]);
    let challenge = generator.generate(&options, &mut rng);
    assert_eq!(challenge.inversion, 3);
    assert_eq!(challenge.notes.len(), 4);
}

#[test]
fn generated_challenges_match_their_own_build() {
    let generator = ChordChallengeGenerator::default();
    let mut rng = StdRng::seed_from_u64(99);
    let mut ids = Vec::new();
    for _ in 0..50 {
        let challenge = generator.generate(&ChordOptions::all(), &mut rng);
        assert!(CHORD_ROOTS.contains(&challenge.root));
        assert_eq!(
            challenge.notes,
            generator.build(challenge.root, challenge.quality, challenge.inversion)
        );
        assert!(challenge.symbol().starts_with(&challenge.root.to_string()));
        ids.push(challenge.id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}
