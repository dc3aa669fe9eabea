use crate::audio_params::AudioParams;
use bingen_ports::instrument::{Instrument, InstrumentName, MidiLikeEvent};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct ActiveInstrument {
    pub name: InstrumentName,
    pub instrument: Arc<dyn Instrument>,
}

impl ActiveInstrument {
    pub fn source_gain(&self) -> f32 {
        self.name.source_gain()
    }
}

/// Sources the audio graph mixes: the selected instrument and the metronome click.
/// Shared between the playback engine, which swaps instruments, and the render callback.
pub struct InstrumentRack {
    active: Mutex<Option<ActiveInstrument>>,
    click: Arc<dyn Instrument>,
    params: AudioParams,
}

impl InstrumentRack {
    pub fn new(click: Arc<dyn Instrument>, params: AudioParams) -> Self {
        Self {
            active: Mutex::new(None),
            click,
            params,
        }
    }

    pub fn active(&self) -> Option<ActiveInstrument> {
        self.active.lock().clone()
    }

    pub fn active_name(&self) -> Option<InstrumentName> {
        self.active.lock().as_ref().map(|active| active.name)
    }

    /// Installs `instrument`, silencing the one it replaces.
    pub fn set_active(&self, name: InstrumentName, instrument: Arc<dyn Instrument>) {
        let previous = self.active.lock().replace(ActiveInstrument { name, instrument });
        if let Some(previous) = previous {
            previous.instrument.handle_event(MidiLikeEvent::AllNotesOff);
        }
    }

    pub fn click(&self) -> &Arc<dyn Instrument> {
        &self.click
    }

    pub fn params(&self) -> &AudioParams {
        &self.params
    }

    pub fn all_notes_off(&self) {
        if let Some(active) = self.active() {
            active.instrument.handle_event(MidiLikeEvent::AllNotesOff);
        }
        self.click.handle_event(MidiLikeEvent::AllNotesOff);
    }
}
