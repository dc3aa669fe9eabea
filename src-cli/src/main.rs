mod answers;
mod cli;
mod dictation;
mod drills;
mod terminal;

use bingen_core::{AppCore, AppError, PlaybackError};
use bingen_domain_score::ScoreImportError;
use bingen_infra_audio_cpal::CpalAudioOutputPort;
use bingen_infra_storage_fs::FsStorage;
use bingen_infra_synth_rustysynth::SoundFontInstrumentLoader;
use bingen_infra_synth_simple::{SineInstrument, SineInstrumentLoader};
use bingen_ports::instrument::{InstrumentError, InstrumentLoaderPort};
use bingen_ports::storage::{SettingsDto, StoragePort};
use bingen_ports::types::{AudioConfig, DeviceId, Volume01};
use clap::Parser;
use cli::{Args, Command};
use drills::DrillKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use terminal::Prompt;
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("app error: {0}")]
    App(#[from] AppError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("instrument error: {0}")]
    Instrument(#[from] InstrumentError),
    #[error("score error: {0}")]
    Score(#[from] ScoreImportError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("library error: {0}")]
    Library(String),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn instrument_loader(
    soundfont: Option<PathBuf>,
    sample_rate_hz: u32,
) -> Arc<dyn InstrumentLoaderPort> {
    match soundfont {
        Some(path) => {
            tracing::info!(path = %path.display(), "using soundfont instruments");
            Arc::new(SoundFontInstrumentLoader::new(path, sample_rate_hz))
        }
        None => {
            tracing::info!("no soundfont configured, using the sine synth");
            Arc::new(SineInstrumentLoader::new(sample_rate_hz))
        }
    }
}

fn build_app(args: &Args) -> AppCore {
    let storage = FsStorage::default();
    let saved = storage.load_settings().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable settings");
        SettingsDto::default()
    });
    let sample_rate_hz = AudioConfig::default().sample_rate_hz;
    let soundfont = args
        .soundfont
        .clone()
        .or_else(|| saved.soundfont_path.map(PathBuf::from));

    AppCore::new(
        Box::new(CpalAudioOutputPort::new()),
        instrument_loader(soundfont, sample_rate_hz),
        Arc::new(SineInstrument::click(sample_rate_hz)),
        Some(Box::new(storage)),
    )
}

fn run(args: Args) -> Result<(), CliError> {
    let mut app = build_app(&args);

    if let Command::Devices = args.command {
        for device in app.list_audio_outputs()? {
            println!(
                "{}  {} ({} Hz, {} ch)",
                device.id,
                device.name,
                device.default_config.sample_rate_hz,
                device.default_config.channels
            );
        }
        return Ok(());
    }

    app.open_audio_output(args.device.clone().map(DeviceId))?;
    if let Some(volume) = args.volume {
        app.engine().set_master_volume(Volume01::new(volume));
    }

    let default_instrument = args
        .instrument
        .unwrap_or(app.settings().default_instrument);
    let practice_instruments = app.settings().practice_instruments.clone();
    drills::load_instrument(app.engine(), default_instrument)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut prompt = Prompt::new(io::stdin().lock());

    let result = if let Command::Dictation(dictation) = &args.command {
        dictation::run(dictation, app.engine(), &mut prompt, &mut rng)
    } else if let Some(kind) = DrillKind::for_command(&args.command) {
        drills::run(
            kind,
            app.engine(),
            default_instrument,
            &practice_instruments,
            &mut prompt,
            &mut rng,
        )
    } else {
        Ok(())
    };

    app.shutdown();
    result
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bingen stopped");
            ExitCode::FAILURE
        }
    }
}
