#![allow(dead_code)]

use bingen_core::{AudioClock, AudioParams, ClockScheduler, InstrumentRack, PlaybackEngine};
use bingen_ports::instrument::{
    Instrument, InstrumentError, InstrumentLoaderPort, InstrumentName, LoadCancellation,
    MidiLikeEvent,
};
use bingen_ports::scheduler::{CancelHandle, ScheduledJob, SchedulerPort};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 1 kHz keeps seconds-to-samples arithmetic exact in assertions.
pub const TEST_SAMPLE_RATE: u32 = 1_000;

/// Records every event; renders a constant level while any note is held.
#[derive(Default)]
pub struct RecordingInstrument {
    events: Mutex<Vec<MidiLikeEvent>>,
    held: Mutex<HashSet<u8>>,
}

impl RecordingInstrument {
    pub fn events(&self) -> Vec<MidiLikeEvent> {
        self.events.lock().clone()
    }

    pub fn note_ons(&self) -> Vec<(u8, u8)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MidiLikeEvent::NoteOn { note, velocity } => Some((note, velocity)),
                _ => None,
            })
            .collect()
    }

    pub fn note_offs(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MidiLikeEvent::NoteOff { note } => Some(note),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Instrument for RecordingInstrument {
    fn handle_event(&self, event: MidiLikeEvent) {
        match event {
            MidiLikeEvent::NoteOn { note, .. } => {
                self.held.lock().insert(note);
            }
            MidiLikeEvent::NoteOff { note } => {
                self.held.lock().remove(&note);
            }
            MidiLikeEvent::AllNotesOff => self.held.lock().clear(),
        }
        self.events.lock().push(event);
    }

    fn render(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        let level = if self.held.lock().is_empty() { 0.0 } else { 1.0 };
        out_l.fill(level);
        out_r.fill(level);
    }
}

#[derive(Default)]
pub struct StubLoader {
    instruments: Mutex<HashMap<InstrumentName, Arc<RecordingInstrument>>>,
    slow: HashSet<InstrumentName>,
    failing: HashSet<InstrumentName>,
    calls: AtomicUsize,
}

impl StubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow(mut self, name: InstrumentName) -> Self {
        self.slow.insert(name);
        self
    }

    pub fn with_failing(mut self, name: InstrumentName) -> Self {
        self.failing.insert(name);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorder(&self, name: InstrumentName) -> Arc<RecordingInstrument> {
        self.instruments.lock().entry(name).or_default().clone()
    }
}

impl InstrumentLoaderPort for StubLoader {
    fn load(
        &self,
        name: InstrumentName,
        cancel: &LoadCancellation,
    ) -> Result<Arc<dyn Instrument>, InstrumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.contains(&name) {
            std::thread::sleep(Duration::from_millis(150));
        }
        if cancel.is_cancelled() {
            return Err(InstrumentError::Cancelled);
        }
        if self.failing.contains(&name) {
            return Err(InstrumentError::Decode(format!("{name}: corrupt sample set")));
        }
        Ok(self.recorder(name))
    }
}

pub struct Rig {
    pub scheduler: Arc<ClockScheduler>,
    pub rack: Arc<InstrumentRack>,
    pub click: Arc<RecordingInstrument>,
    pub loader: Arc<StubLoader>,
    pub engine: PlaybackEngine,
}

pub fn rig(loader: StubLoader) -> Rig {
    let scheduler = Arc::new(ClockScheduler::new(Arc::new(AudioClock::new(
        TEST_SAMPLE_RATE,
    ))));
    let click = Arc::new(RecordingInstrument::default());
    let rack = Arc::new(InstrumentRack::new(click.clone(), AudioParams::default()));
    let loader = Arc::new(loader);
    let engine = PlaybackEngine::new(scheduler.clone(), loader.clone(), rack.clone());
    Rig {
        scheduler,
        rack,
        click,
        loader,
        engine,
    }
}

pub fn piano_rig() -> (Rig, Arc<RecordingInstrument>) {
    let rig = rig(StubLoader::new());
    rig.engine
        .set_instrument(InstrumentName::AcousticGrandPiano)
        .wait()
        .expect("piano should load");
    let piano = rig.loader.recorder(InstrumentName::AcousticGrandPiano);
    (rig, piano)
}

/// Moves the clock `step` samples after every scheduling call, as an audio
/// callback finishing a buffer mid-request would.
pub struct DriftingScheduler {
    inner: Arc<ClockScheduler>,
    step: u64,
}

impl DriftingScheduler {
    fn drift(&self) {
        let clock = self.inner.clock();
        clock.set(clock.get() + self.step);
    }
}

impl SchedulerPort for DriftingScheduler {
    fn now(&self) -> f64 {
        self.inner.now()
    }

    fn schedule_at(&self, at_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle> {
        let handle = self.inner.schedule_at(at_seconds, job);
        self.drift();
        handle
    }

    fn schedule(&self, delay_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle> {
        let handle = self.inner.schedule(delay_seconds, job);
        self.drift();
        handle
    }

    fn purge_cancelled(&self) {
        self.inner.purge_cancelled();
    }
}

/// Piano engine whose clock keeps moving while a request is being scheduled.
pub fn drifting_piano_rig(step: u64) -> (Arc<ClockScheduler>, PlaybackEngine) {
    let inner = Arc::new(ClockScheduler::new(Arc::new(AudioClock::new(
        TEST_SAMPLE_RATE,
    ))));
    let scheduler = Arc::new(DriftingScheduler {
        inner: inner.clone(),
        step,
    });
    let rack = Arc::new(InstrumentRack::new(
        Arc::new(RecordingInstrument::default()),
        AudioParams::default(),
    ));
    let engine = PlaybackEngine::new(scheduler, Arc::new(StubLoader::new()), rack);
    engine
        .set_instrument(InstrumentName::AcousticGrandPiano)
        .wait()
        .expect("piano should load");
    (inner, engine)
}

/// Due samples of every queued job, earliest first. Empties the queue.
pub fn drain_due(scheduler: &ClockScheduler) -> Vec<u64> {
    std::iter::from_fn(|| scheduler.pop_due_before(u64::MAX))
        .map(|job| job.due)
        .collect()
}
