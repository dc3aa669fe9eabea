use bingen_infra_synth_rustysynth::SoundFontInstrumentLoader;
use bingen_ports::instrument::{
    InstrumentError, InstrumentLoaderPort, InstrumentName, LoadCancellation,
};

#[test]
fn missing_soundfont_is_not_found() {
    let loader = SoundFontInstrumentLoader::new("/nonexistent/bingen/piano.sf2", 48_000);
    let err = loader
        .load(InstrumentName::AcousticGrandPiano, &LoadCancellation::new())
        .err();
    assert!(matches!(err, Some(InstrumentError::NotFound(_))));
}

#[test]
fn corrupt_soundfont_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.sf2");
    std::fs::write(&path, b"RIFF\0\0\0\0not a soundfont").unwrap();

    let loader = SoundFontInstrumentLoader::new(&path, 48_000);
    let err = loader
        .load(InstrumentName::Violin, &LoadCancellation::new())
        .err();
    assert!(matches!(err, Some(InstrumentError::Decode(_))));
}
