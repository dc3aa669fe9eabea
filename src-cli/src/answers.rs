use bingen_domain_challenge::{ChordChallenge, IntervalChallenge, NoteChallenge};
use bingen_ports::pitch::{ChordQuality, Interval, Note, PitchClass, PitchError};

/// Accepts a bare quality (`m7`) or a full symbol (`Ebm7`, `F#` for major).
/// A root, when given, must match the chord's root up to enharmonics.
pub fn check_chord(answer: &str, challenge: &ChordChallenge) -> Result<bool, PitchError> {
    let answer = answer.trim();
    if let Ok(quality) = answer.parse::<ChordQuality>() {
        return Ok(quality == challenge.quality);
    }
    let (root, quality) = split_symbol(answer)?;
    Ok(root.chroma() == challenge.root.chroma() && quality == challenge.quality)
}

fn split_symbol(symbol: &str) -> Result<(PitchClass, ChordQuality), PitchError> {
    // Longest root first so `Bbm` reads as Bb + m rather than B + bm.
    for split in (1..=symbol.len()).rev() {
        if !symbol.is_char_boundary(split) {
            continue;
        }
        let (root, rest) = symbol.split_at(split);
        let Ok(root) = root.parse::<PitchClass>() else {
            continue;
        };
        let quality = if rest.is_empty() {
            Ok(ChordQuality::Major)
        } else {
            rest.parse::<ChordQuality>()
        };
        if let Ok(quality) = quality {
            return Ok((root, quality));
        }
    }
    Err(PitchError::UnknownQuality(symbol.to_string()))
}

pub fn check_interval(answer: &str, challenge: &IntervalChallenge) -> Result<bool, PitchError> {
    Ok(answer.parse::<Interval>()? == challenge.interval)
}

/// A pitch class matches enharmonically; a note with octave must sound the same.
pub fn check_note(answer: &str, challenge: &NoteChallenge) -> Result<bool, PitchError> {
    if let Ok(note) = answer.parse::<Note>() {
        return Ok(note.midi() == challenge.note.midi());
    }
    let pitch_class = answer.parse::<PitchClass>()?;
    Ok(pitch_class.chroma() == challenge.pitch_class.chroma())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingen_domain_challenge::{
        ChordChallengeGenerator, ChordOptions, IntervalChallengeGenerator, IntervalDirection,
        IntervalMode, IntervalOptions, NoteRecognitionGenerator,
    };
    use bingen_ports::pitch::{Accidental, Letter};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chord_of(root: PitchClass, quality: ChordQuality) -> ChordChallenge {
        let mut rng = StdRng::seed_from_u64(1);
        let mut challenge = ChordChallengeGenerator::default()
            .generate(&ChordOptions::new(vec![quality], vec![0]), &mut rng);
        challenge.root = root;
        challenge
    }

    const E_FLAT: PitchClass = PitchClass::new(Letter::E, Accidental::FLAT);

    #[test]
    fn chord_quality_alone_is_enough() {
        let chord = chord_of(E_FLAT, ChordQuality::MinorSeventh);
        assert!(check_chord("m7", &chord).unwrap());
        assert!(!check_chord("7", &chord).unwrap());
    }

    #[test]
    fn chord_symbol_checks_root_enharmonically() {
        let chord = chord_of(E_FLAT, ChordQuality::MinorSeventh);
        assert!(check_chord("Ebm7", &chord).unwrap());
        assert!(check_chord("D#m7", &chord).unwrap());
        assert!(!check_chord("Em7", &chord).unwrap());
        assert!(check_chord("nonsense", &chord).is_err());
    }

    #[test]
    fn bare_root_means_major() {
        let chord = chord_of(PitchClass::new(Letter::B, Accidental::FLAT), ChordQuality::Major);
        assert!(check_chord("Bb", &chord).unwrap());
        assert!(!check_chord("Bbm", &chord).unwrap());
    }

    #[test]
    fn interval_answers_compare_the_label() {
        let mut rng = StdRng::seed_from_u64(7);
        let challenge = IntervalChallengeGenerator::default().generate(
            &IntervalOptions::new(vec!["3M".parse().unwrap()], vec![IntervalMode::Harmonic]),
            &mut rng,
        );
        assert_eq!(challenge.direction, IntervalDirection::Harmonic);
        assert!(check_interval("3M", &challenge).unwrap());
        assert!(!check_interval("4P", &challenge).unwrap());
        assert!(check_interval("3X", &challenge).is_err());
    }

    #[test]
    fn note_answers_accept_enharmonics_and_octaves() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = ["C#4".parse::<Note>().unwrap()];
        let challenge =
            NoteRecognitionGenerator::default().generate(2, &[], Some(&pool[..]), &mut rng);
        assert!(check_note("C#", &challenge).unwrap());
        assert!(check_note("Db", &challenge).unwrap());
        assert!(check_note("Db4", &challenge).unwrap());
        assert!(!check_note("C#5", &challenge).unwrap());
        assert!(!check_note("D", &challenge).unwrap());
    }
}
