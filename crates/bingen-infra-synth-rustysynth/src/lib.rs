use bingen_ports::instrument::{
    Instrument, InstrumentError, InstrumentLoaderPort, InstrumentName, LoadCancellation,
    MidiLikeEvent,
};
use parking_lot::Mutex;
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PROGRAM_CHANGE: i32 = 0xC0;
const CHANNEL: i32 = 0;

/// One General MIDI preset of a SoundFont, played on its own synthesizer.
pub struct SoundFontInstrument {
    synth: Mutex<Synthesizer>,
}

impl SoundFontInstrument {
    fn new(synth: Synthesizer) -> Self {
        Self {
            synth: Mutex::new(synth),
        }
    }
}

impl Instrument for SoundFontInstrument {
    fn handle_event(&self, event: MidiLikeEvent) {
        let mut synth = self.synth.lock();
        match event {
            MidiLikeEvent::NoteOn { note, velocity } => {
                synth.note_on(CHANNEL, note as i32, velocity as i32);
            }
            MidiLikeEvent::NoteOff { note } => synth.note_off(CHANNEL, note as i32),
            MidiLikeEvent::AllNotesOff => synth.note_off_all(true),
        }
    }

    fn render(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        // Never block the audio thread behind a note event.
        match self.synth.try_lock() {
            Some(mut synth) => synth.render(&mut out_l[..frames], &mut out_r[..frames]),
            None => {
                out_l.fill(0.0);
                out_r.fill(0.0);
            }
        }
    }
}

/// Loads instruments out of a single `.sf2` file. The file is decoded once and
/// shared; each instrument gets its own synthesizer set to the GM program.
pub struct SoundFontInstrumentLoader {
    path: PathBuf,
    sample_rate_hz: u32,
    sound_font: Mutex<Option<Arc<SoundFont>>>,
}

impl SoundFontInstrumentLoader {
    pub fn new(path: impl Into<PathBuf>, sample_rate_hz: u32) -> Self {
        Self {
            path: path.into(),
            sample_rate_hz,
            sound_font: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sound_font(&self) -> Result<Arc<SoundFont>, InstrumentError> {
        let mut cached = self.sound_font.lock();
        if let Some(sound_font) = cached.as_ref() {
            return Ok(sound_font.clone());
        }

        let mut file = File::open(&self.path).map_err(|e| {
            InstrumentError::NotFound(format!("{}: {e}", self.path.display()))
        })?;
        let sound_font = Arc::new(
            SoundFont::new(&mut file).map_err(|e| InstrumentError::Decode(e.to_string()))?,
        );
        tracing::info!(
            path = %self.path.display(),
            bank = sound_font.get_info().get_bank_name().trim(),
            presets = sound_font.get_presets().len(),
            "soundfont decoded"
        );
        *cached = Some(sound_font.clone());
        Ok(sound_font)
    }
}

fn has_program(sound_font: &SoundFont, program: u8) -> bool {
    sound_font
        .get_presets()
        .iter()
        .any(|preset| preset.get_bank_number() == 0 && preset.get_patch_number() == program as i32)
}

impl InstrumentLoaderPort for SoundFontInstrumentLoader {
    fn load(
        &self,
        name: InstrumentName,
        cancel: &LoadCancellation,
    ) -> Result<Arc<dyn Instrument>, InstrumentError> {
        let sound_font = self.sound_font()?;
        if cancel.is_cancelled() {
            return Err(InstrumentError::Cancelled);
        }

        let program = name.gm_program();
        if !has_program(&sound_font, program) {
            return Err(InstrumentError::NotFound(format!(
                "{name} (GM program {program}) not in {}",
                self.path.display()
            )));
        }

        let mut settings = SynthesizerSettings::new(self.sample_rate_hz as i32);
        settings.enable_reverb_and_chorus = false;
        let mut synth = Synthesizer::new(&sound_font, &settings)
            .map_err(|e| InstrumentError::Backend(e.to_string()))?;
        synth.set_master_volume(0.25);
        if program != 0 {
            synth.process_midi_message(CHANNEL, PROGRAM_CHANGE, program as i32, 0);
        }

        if cancel.is_cancelled() {
            return Err(InstrumentError::Cancelled);
        }
        Ok(Arc::new(SoundFontInstrument::new(synth)))
    }
}
