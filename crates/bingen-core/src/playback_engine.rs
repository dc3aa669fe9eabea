use crate::loader::{InstrumentLoads, LoadTicket};
use crate::patterns::{
    cadence_voices, metronome_voices, plan_duration, section_voices, sequence_voices,
    PlannedVoice, SectionRequest, VoiceTarget, ARPEGGIO_GAP_SECONDS,
};
use crate::rack::InstrumentRack;
use crate::voices::VoiceRegistry;
use bingen_domain_score::{KeyMode, ScoreNoteEvent, TimeSignature};
use bingen_ports::instrument::{
    Instrument, InstrumentError, InstrumentLoaderPort, InstrumentName, MidiLikeEvent,
};
use bingen_ports::pitch::{Note, PitchClass};
use bingen_ports::scheduler::{CancelHandle, SchedulerPort};
use bingen_ports::types::Volume01;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no instrument loaded")]
    InstrumentNotReady,
    #[error("instrument still loading: {0}")]
    Loading(InstrumentName),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "instrument", rename_all = "snake_case")]
pub enum EngineStatus {
    Idle,
    Loading(InstrumentName),
    Ready(InstrumentName),
    Playing(InstrumentName),
}

/// What a `play*` call put on the clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub voices: usize,
    /// From the request until the last scheduled note ends.
    pub duration_seconds: f64,
}

/// Instrument lifecycle plus note scheduling. Every `play*` call supersedes
/// whatever was sounding before it.
pub struct PlaybackEngine {
    scheduler: Arc<dyn SchedulerPort>,
    rack: Arc<InstrumentRack>,
    loads: Arc<InstrumentLoads>,
    voices: VoiceRegistry,
    playing_until: Mutex<Option<f64>>,
}

impl PlaybackEngine {
    pub fn new(
        scheduler: Arc<dyn SchedulerPort>,
        loader: Arc<dyn InstrumentLoaderPort>,
        rack: Arc<InstrumentRack>,
    ) -> Self {
        Self {
            scheduler,
            loads: Arc::new(InstrumentLoads::new(loader, rack.clone())),
            rack,
            voices: VoiceRegistry::new(),
            playing_until: Mutex::new(None),
        }
    }

    pub fn rack(&self) -> &Arc<InstrumentRack> {
        &self.rack
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Makes `name` the active instrument. Already active is a no-op; a cached
    /// instrument switches immediately; anything else loads in the background.
    pub fn set_instrument(&self, name: InstrumentName) -> LoadTicket {
        if self.rack.active_name() == Some(name) && !self.loads.is_loading() {
            return LoadTicket::ready(name, Ok(()));
        }
        self.stop_all();
        self.loads
            .request(name)
            .unwrap_or_else(|| LoadTicket::ready(name, Ok(())))
    }

    pub fn is_loading(&self) -> bool {
        self.loads.is_loading()
    }

    pub fn last_load_error(&self) -> Option<InstrumentError> {
        self.loads.last_error()
    }

    pub fn status(&self) -> EngineStatus {
        if let Some(name) = self.loads.loading() {
            return EngineStatus::Loading(name);
        }
        let Some(name) = self.rack.active_name() else {
            return EngineStatus::Idle;
        };
        let playing = self
            .playing_until
            .lock()
            .map_or(false, |until| until > self.scheduler.now());
        if playing {
            EngineStatus::Playing(name)
        } else {
            EngineStatus::Ready(name)
        }
    }

    pub fn set_master_volume(&self, volume: Volume01) {
        self.rack.params().set_master(volume);
    }

    /// Handles still registered since the last `stop_all`.
    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    /// All notes at once.
    pub fn play(&self, notes: &[Note]) -> Result<ScheduleSummary, PlaybackError> {
        self.play_sequence(notes, 0.0)
    }

    pub fn arpeggiate(&self, notes: &[Note]) -> Result<ScheduleSummary, PlaybackError> {
        self.play_sequence(notes, ARPEGGIO_GAP_SECONDS)
    }

    pub fn play_sequence(
        &self,
        notes: &[Note],
        gap_seconds: f64,
    ) -> Result<ScheduleSummary, PlaybackError> {
        let midis: Vec<i32> = notes.iter().map(|note| note.midi()).collect();
        self.schedule_plan(sequence_voices(&midis, gap_seconds))
    }

    /// Cadence in `key`; the summary's duration is how long it lasts.
    pub fn play_tonal_reference(
        &self,
        key: PitchClass,
        mode: KeyMode,
    ) -> Result<ScheduleSummary, PlaybackError> {
        self.schedule_plan(cadence_voices(key, mode))
    }

    /// Clicks starting at absolute clock time `start_time` (seconds).
    pub fn play_metronome_click(
        &self,
        measures: u32,
        time_signature: TimeSignature,
        bpm: f64,
        start_time: f64,
    ) -> Result<ScheduleSummary, PlaybackError> {
        self.stop_all();
        let base = self.scheduler.now();
        self.schedule_plan_from(
            base,
            metronome_voices(measures, time_signature, bpm, start_time - base),
        )
    }

    pub fn play_score_section(
        &self,
        events: &[ScoreNoteEvent],
        request: &SectionRequest,
    ) -> Result<ScheduleSummary, PlaybackError> {
        self.schedule_plan(section_voices(events, request))
    }

    /// Cancels every pending job and silences every source. Never fails.
    pub fn stop_all(&self) {
        let live = self.voices.cancel_all();
        self.rack.all_notes_off();
        *self.playing_until.lock() = None;
        if live > 0 {
            self.scheduler.purge_cancelled();
            tracing::debug!(cancelled = live, "stopped playback");
        }
    }

    fn schedule_plan(&self, plan: Vec<PlannedVoice>) -> Result<ScheduleSummary, PlaybackError> {
        self.stop_all();
        self.schedule_plan_from(self.scheduler.now(), plan)
    }

    /// Offsets in `plan` are relative to clock time `base`, read once per plan.
    fn schedule_plan_from(
        &self,
        base: f64,
        plan: Vec<PlannedVoice>,
    ) -> Result<ScheduleSummary, PlaybackError> {
        if plan.is_empty() {
            tracing::debug!("nothing to schedule");
            return Ok(ScheduleSummary::default());
        }

        let needs_instrument = plan
            .iter()
            .any(|voice| voice.target == VoiceTarget::Instrument);
        let instrument = if needs_instrument {
            Some(self.ready_instrument()?)
        } else {
            None
        };

        let mut handles: Vec<Box<dyn CancelHandle>> = Vec::with_capacity(plan.len() * 2);
        for voice in &plan {
            let target = match (voice.target, instrument.as_ref()) {
                (VoiceTarget::Instrument, Some(instrument)) => instrument.clone(),
                _ => self.rack.click().clone(),
            };
            handles.extend(self.schedule_voice(base, target, voice));
        }
        self.voices.register_all(handles);

        let summary = ScheduleSummary {
            voices: plan.len(),
            duration_seconds: plan_duration(&plan),
        };
        *self.playing_until.lock() = Some(base + summary.duration_seconds);
        tracing::debug!(
            voices = summary.voices,
            duration = summary.duration_seconds,
            "scheduled playback"
        );
        Ok(summary)
    }

    fn schedule_voice(
        &self,
        base: f64,
        instrument: Arc<dyn Instrument>,
        voice: &PlannedVoice,
    ) -> [Box<dyn CancelHandle>; 2] {
        let note = voice.midi;
        let velocity = voice.velocity;
        let on_target = instrument.clone();
        let on = self.scheduler.schedule_at(
            base + voice.offset_seconds.max(0.0),
            Box::new(move || on_target.handle_event(MidiLikeEvent::NoteOn { note, velocity })),
        );
        let off = self.scheduler.schedule_at(
            base + voice.end_seconds().max(0.0),
            Box::new(move || instrument.handle_event(MidiLikeEvent::NoteOff { note })),
        );
        [on, off]
    }

    fn ready_instrument(&self) -> Result<Arc<dyn Instrument>, PlaybackError> {
        if let Some(name) = self.loads.loading() {
            return Err(PlaybackError::Loading(name));
        }
        self.rack
            .active()
            .map(|active| active.instrument)
            .ok_or(PlaybackError::InstrumentNotReady)
    }
}
