use bingen_infra_storage_fs::FsStorage;
use bingen_ports::instrument::InstrumentName;
use bingen_ports::storage::{SettingsDto, StorageError, StoragePort};
use bingen_ports::types::{DeviceId, Volume01};
use pretty_assertions::assert_eq;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsStorage::new(dir.path().join("nested"));
    assert_eq!(storage.load_settings().unwrap(), SettingsDto::default());
}

#[test]
fn saved_settings_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsStorage::new(dir.path().join("nested"));
    let settings = SettingsDto {
        master_volume: Volume01::new(0.4),
        default_instrument: InstrumentName::Violin,
        soundfont_path: Some("/tmp/gm.sf2".to_string()),
        practice_instruments: vec![InstrumentName::Violin, InstrumentName::Flute],
        output_device: Some(DeviceId("cpal:Alsa:0:default".to_string())),
        audio_buffer_size_frames: Some(512),
    };

    storage.save_settings(&settings).unwrap();

    assert!(dir.path().join("nested/settings.json").exists());
    assert!(!dir.path().join("nested/settings.json.tmp").exists());
    assert_eq!(FsStorage::new(dir.path().join("nested")).load_settings().unwrap(), settings);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "default_instrument": "lead_1_square" }"#,
    )
    .unwrap();

    let settings = FsStorage::new(dir.path()).load_settings().unwrap();

    assert_eq!(settings.default_instrument, InstrumentName::Lead1Square);
    assert_eq!(settings.master_volume, Volume01::new(0.7));
    assert_eq!(settings.practice_instruments, InstrumentName::ALL.to_vec());
}

#[test]
fn corrupt_file_is_a_serde_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let err = FsStorage::new(dir.path()).load_settings().unwrap_err();
    assert!(matches!(err, StorageError::Serde(_)));
}
