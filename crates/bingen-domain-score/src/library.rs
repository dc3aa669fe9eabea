use crate::midi_import::import_midi_path;
use crate::model::{DictationScore, KeyMode, ScoreImportError, TimeSignature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DIRECTORY_FILE: &str = "directory.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anacrusis {
    pub has: bool,
    #[serde(default)]
    pub beat: f64,
}

/// Harmonic step annotation: note names plus a duration code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicStep {
    #[serde(rename = "n")]
    pub notes: Vec<String>,
    #[serde(rename = "d")]
    pub duration: String,
}

/// One entry of a library `directory.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: String,
    pub title: String,
    pub filename: String,
    #[serde(default)]
    pub mode: KeyMode,
    pub original_key: String,
    #[serde(default)]
    pub time_signature: TimeSignature,
    pub total_measures: u32,
    #[serde(default = "default_voices")]
    pub num_voices: u32,
    pub bpm: f64,
    #[serde(default)]
    pub anacrusis: Anacrusis,
    #[serde(default)]
    pub steps: Vec<HarmonicStep>,
}

fn default_voices() -> u32 {
    1
}

pub fn parse_directory(json: &str) -> Result<Vec<LibraryEntry>, ScoreImportError> {
    serde_json::from_str(json).map_err(|e| ScoreImportError::Library(e.to_string()))
}

/// Directory holding pieces that are `measures` long.
pub fn library_dir(root: &Path, measures: u32) -> PathBuf {
    root.join(measures.to_string())
}

pub fn load_directory(root: &Path, measures: u32) -> Result<Vec<LibraryEntry>, ScoreImportError> {
    let path = library_dir(root, measures).join(DIRECTORY_FILE);
    let json = std::fs::read_to_string(&path)
        .map_err(|e| ScoreImportError::Io(format!("{}: {e}", path.display())))?;
    let entries = parse_directory(&json)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded score library");
    Ok(entries)
}

pub fn midi_path(root: &Path, measures: u32, entry: &LibraryEntry) -> PathBuf {
    library_dir(root, measures).join(&entry.filename)
}

/// Imports the entry's MIDI file. The directory's title, tempo, metre and length
/// take precedence over whatever the file carries.
pub fn load_score(
    root: &Path,
    measures: u32,
    entry: &LibraryEntry,
) -> Result<DictationScore, ScoreImportError> {
    let mut score = import_midi_path(&midi_path(root, measures, entry))?;
    score.title = entry.title.clone();
    score.mode = entry.mode;
    if let Ok(key) = entry.original_key.parse() {
        score.key = key;
    } else {
        tracing::warn!(key = %entry.original_key, id = %entry.id, "unreadable library key");
    }
    score.time_signature = entry.time_signature;
    if entry.bpm > 0.0 {
        score.bpm = entry.bpm;
    }
    if entry.total_measures > 0 {
        score.total_measures = entry.total_measures;
    }
    Ok(score)
}
