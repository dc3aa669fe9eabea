use bingen_domain_score::{
    load_directory, load_score, midi_path, parse_directory, KeyMode, ScoreImportError,
    TimeSignature,
};
use midly::num::{u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;

const DIRECTORY: &str = r#"[
  {
    "id": "m4-001",
    "title": "Little Study",
    "filename": "little_study.mid",
    "mode": "minor",
    "originalKey": "Eb",
    "timeSignature": "3/4",
    "totalMeasures": 4,
    "numVoices": 1,
    "bpm": 90,
    "anacrusis": { "has": true, "beat": 3 },
    "steps": [{ "n": ["Eb4", "G4"], "d": "h" }]
  },
  {
    "id": "m4-002",
    "title": "Plain",
    "filename": "plain.mid",
    "originalKey": "C",
    "totalMeasures": 4,
    "bpm": 100
  }
]"#;

fn single_note_midi() -> Vec<u8> {
    let channel = u4::new(0);
    let track = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key: u7::new(63),
                    vel: u7::new(90),
                },
            },
        },
        TrackEvent {
            delta: u28::new(480),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key: u7::new(63),
                    vel: u7::new(64),
                },
            },
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(480.into()),
        },
        tracks: vec![track],
    };
    let mut data = Vec::new();
    smf.write(&mut data).expect("midi write should succeed");
    data
}

#[test]
fn directory_entries_parse_with_defaults() {
    let entries = parse_directory(DIRECTORY).expect("directory should parse");
    assert_eq!(entries.len(), 2);

    let study = &entries[0];
    assert_eq!(study.mode, KeyMode::Minor);
    assert_eq!(
        study.time_signature,
        TimeSignature {
            numerator: 3,
            denominator: 4,
        }
    );
    assert!(study.anacrusis.has);
    assert_eq!(study.anacrusis.beat, 3.0);
    assert_eq!(study.steps[0].notes, vec!["Eb4".to_string(), "G4".to_string()]);

    let plain = &entries[1];
    assert_eq!(plain.mode, KeyMode::Major);
    assert_eq!(plain.time_signature, TimeSignature::COMMON);
    assert_eq!(plain.num_voices, 1);
    assert!(!plain.anacrusis.has);
    assert!(plain.steps.is_empty());
}

#[test]
fn malformed_directory_is_a_library_error() {
    let err = parse_directory("{ \"id\": 1 }").expect_err("object is not a directory");
    assert!(matches!(err, ScoreImportError::Library(_)));
}

#[test]
fn load_score_prefers_directory_metadata() {
    let root = tempfile::tempdir().expect("tempdir");
    let dir = root.path().join("4");
    std::fs::create_dir_all(&dir).expect("create library dir");
    std::fs::write(dir.join("directory.json"), DIRECTORY).expect("write directory");
    std::fs::write(dir.join("little_study.mid"), single_note_midi()).expect("write midi");

    let entries = load_directory(root.path(), 4).expect("directory should load");
    let entry = &entries[0];
    assert_eq!(midi_path(root.path(), 4, entry), dir.join("little_study.mid"));

    let score = load_score(root.path(), 4, entry).expect("score should load");
    assert_eq!(score.title, "Little Study");
    assert_eq!(score.key.to_string(), "Eb");
    assert_eq!(score.mode, KeyMode::Minor);
    assert_eq!(score.bpm, 90.0);
    assert_eq!(score.total_measures, 4);
    assert_eq!(score.events.len(), 1);
    assert_eq!(score.events[0].pitch, 63);
}

#[test]
fn missing_library_is_an_io_error() {
    let root = tempfile::tempdir().expect("tempdir");
    let err = load_directory(root.path(), 8).expect_err("nothing on disk");
    assert!(matches!(err, ScoreImportError::Io(_)));
}
