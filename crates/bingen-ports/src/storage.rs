use crate::instrument::InstrumentName;
use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_master_volume() -> Volume01 {
    Volume01::new(0.7)
}

fn default_practice_instruments() -> Vec<InstrumentName> {
    InstrumentName::ALL.to_vec()
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    #[serde(default = "default_master_volume")]
    pub master_volume: Volume01,
    pub default_instrument: InstrumentName,
    pub soundfont_path: Option<String>,
    /// Timbres rotated through during the mastery phase.
    #[serde(default = "default_practice_instruments")]
    pub practice_instruments: Vec<InstrumentName>,
    pub output_device: Option<DeviceId>,
    pub audio_buffer_size_frames: Option<u32>,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            default_instrument: InstrumentName::default(),
            soundfont_path: None,
            practice_instruments: default_practice_instruments(),
            output_device: None,
            audio_buffer_size_frames: None,
        }
    }
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}
