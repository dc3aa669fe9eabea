use crate::audio_graph::AudioGraph;
use crate::audio_params::AudioParams;
use crate::clock::{AudioClock, ClockScheduler};
use crate::loader::LoadTicket;
use crate::playback_engine::PlaybackEngine;
use crate::rack::InstrumentRack;
use bingen_ports::audio::{AudioError, AudioOutputPort, AudioStreamHandle};
use bingen_ports::instrument::{Instrument, InstrumentLoaderPort, InstrumentName};
use bingen_ports::storage::{SettingsDto, StorageError, StoragePort};
use bingen_ports::types::{AudioConfig, AudioOutputDevice, DeviceId, Volume01};
use std::sync::Arc;

const DEFAULT_MAX_FRAMES: usize = 1024;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Composition of settings, output stream and playback engine for one process.
pub struct AppCore {
    audio_port: Box<dyn AudioOutputPort>,
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
    config: AudioConfig,
    scheduler: Arc<ClockScheduler>,
    engine: PlaybackEngine,
    audio_stream: Option<Box<dyn AudioStreamHandle>>,
}

impl AppCore {
    pub fn new(
        audio_port: Box<dyn AudioOutputPort>,
        loader: Arc<dyn InstrumentLoaderPort>,
        click: Arc<dyn Instrument>,
        storage: Option<Box<dyn StoragePort>>,
    ) -> Self {
        let settings = match storage.as_ref().map(|storage| storage.load_settings()) {
            Some(Ok(settings)) => settings,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "falling back to default settings");
                SettingsDto::default()
            }
            None => SettingsDto::default(),
        };

        let config = AudioConfig {
            buffer_size_frames: settings.audio_buffer_size_frames,
            ..AudioConfig::default()
        };
        let clock = Arc::new(AudioClock::new(config.sample_rate_hz));
        let scheduler = Arc::new(ClockScheduler::new(clock));
        let rack = Arc::new(InstrumentRack::new(click, AudioParams::new(&settings)));
        let engine = PlaybackEngine::new(scheduler.clone(), loader, rack);

        Self {
            audio_port,
            storage,
            settings,
            config,
            scheduler,
            engine,
            audio_stream: None,
        }
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &Arc<ClockScheduler> {
        &self.scheduler
    }

    pub fn list_audio_outputs(&self) -> Result<Vec<AudioOutputDevice>, AppError> {
        Ok(self.audio_port.list_outputs()?)
    }

    /// Opens `device_id`, or the configured device, or the host default.
    pub fn open_audio_output(&mut self, device_id: Option<DeviceId>) -> Result<(), AppError> {
        if let Some(stream) = self.audio_stream.take() {
            stream.close();
        }

        let device_id = device_id.or_else(|| self.settings.output_device.clone());
        let max_frames = self
            .config
            .buffer_size_frames
            .map_or(DEFAULT_MAX_FRAMES, |frames| frames as usize);
        let graph = AudioGraph::new(self.engine.rack().clone(), self.scheduler.clone(), max_frames);
        let stream = self
            .audio_port
            .open_output(device_id.as_ref(), self.config, Box::new(graph))?;

        tracing::info!(
            device = device_id.as_ref().map_or("default", |id| id.0.as_str()),
            sample_rate = self.config.sample_rate_hz,
            "audio output opened"
        );
        self.audio_stream = Some(stream);
        if device_id.is_some() && device_id != self.settings.output_device {
            self.settings.output_device = device_id;
            self.save_settings();
        }
        Ok(())
    }

    pub fn select_instrument(&mut self, name: InstrumentName) -> LoadTicket {
        if self.settings.default_instrument != name {
            self.settings.default_instrument = name;
            self.save_settings();
        }
        self.engine.set_instrument(name)
    }

    pub fn set_master_volume(&mut self, volume: Volume01) {
        self.settings.master_volume = volume;
        self.engine.set_master_volume(volume);
        self.save_settings();
    }

    pub fn shutdown(&mut self) {
        self.engine.stop_all();
        if let Some(stream) = self.audio_stream.take() {
            stream.close();
        }
    }

    fn save_settings(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(e) = storage.save_settings(&self.settings) {
                tracing::warn!(error = %e, "failed to save settings");
            }
        }
    }
}
