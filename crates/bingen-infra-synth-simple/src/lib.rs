use bingen_ports::instrument::{
    Instrument, InstrumentError, InstrumentLoaderPort, InstrumentName, LoadCancellation,
    MidiLikeEvent,
};
use parking_lot::Mutex;
use std::f32::consts::TAU;
use std::sync::Arc;

/// Relative level of the 1st..4th harmonic.
type Partials = [f32; 4];

const SINE: Partials = [1.0, 0.0, 0.0, 0.0];

fn partials_for(name: InstrumentName) -> Partials {
    match name {
        InstrumentName::AcousticGrandPiano => [1.0, 0.35, 0.12, 0.05],
        InstrumentName::AcousticGuitarNylon => [1.0, 0.5, 0.2, 0.1],
        InstrumentName::Violin => [1.0, 0.6, 0.45, 0.3],
        InstrumentName::Flute => [1.0, 0.1, 0.02, 0.0],
        InstrumentName::ChoirAahs => [1.0, 0.3, 0.25, 0.0],
        InstrumentName::Lead1Square => [1.0, 0.0, 0.33, 0.0],
        InstrumentName::Trumpet => [1.0, 0.7, 0.5, 0.35],
    }
}

/// Additive sine voices with a linear release. Always available, so it serves
/// as the metronome click and as the fallback timbre.
pub struct SineInstrument {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    sample_rate_hz: f32,
    max_voices: usize,
    release_seconds: f32,
    amplitude: f32,
    partials: Partials,
    voices: Vec<Voice>,
    note_counter: u64,
}

#[derive(Clone, Debug)]
struct Voice {
    note: u8,
    freq: f32,
    phase: f32,
    velocity: f32,
    key_down: bool,
    release_samples_left: u32,
    release_total_samples: u32,
    age: u64,
}

impl SineInstrument {
    pub fn new(sample_rate_hz: u32, max_voices: usize) -> Self {
        Self::with_partials(sample_rate_hz, max_voices, SINE, 0.2, 0.2)
    }

    /// Short, bright voice for metronome clicks.
    pub fn click(sample_rate_hz: u32) -> Self {
        Self::with_partials(sample_rate_hz, 8, [1.0, 0.0, 0.2, 0.0], 0.02, 0.3)
    }

    pub fn for_instrument(name: InstrumentName, sample_rate_hz: u32) -> Self {
        Self::with_partials(sample_rate_hz, 32, partials_for(name), 0.25, 0.15)
    }

    fn with_partials(
        sample_rate_hz: u32,
        max_voices: usize,
        partials: Partials,
        release_seconds: f32,
        amplitude: f32,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sample_rate_hz: sample_rate_hz.max(1) as f32,
                max_voices: max_voices.max(1),
                release_seconds,
                amplitude,
                partials,
                voices: Vec::new(),
                note_counter: 0,
            }),
        }
    }

    /// Voices still producing sound, releasing ones included.
    pub fn active_voices(&self) -> usize {
        self.inner.lock().voices.len()
    }
}

impl Inner {
    fn note_on(&mut self, note: u8, velocity: u8) {
        self.note_counter = self.note_counter.wrapping_add(1);

        if self.voices.len() >= self.max_voices {
            if let Some((idx, _)) = self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, voice)| voice.age)
            {
                self.voices.swap_remove(idx);
            }
        }

        let release_total_samples = ((self.sample_rate_hz * self.release_seconds) as u32).max(1);
        self.voices.push(Voice {
            note,
            freq: 440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0),
            phase: 0.0,
            velocity: (velocity as f32 / 127.0).clamp(0.05, 1.0),
            key_down: true,
            release_samples_left: 0,
            release_total_samples,
            age: self.note_counter,
        });
    }

    fn note_off(&mut self, note: u8) {
        for voice in &mut self.voices {
            if voice.note == note && voice.key_down {
                voice.key_down = false;
                voice.release_samples_left = voice.release_total_samples;
            }
        }
    }

    fn all_notes_off(&mut self) {
        self.voices.clear();
    }

    fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        out_l.fill(0.0);
        out_r.fill(0.0);
        let frames = out_l.len().min(out_r.len());
        let norm: f32 = self.partials.iter().sum::<f32>().max(1.0);

        for voice in &mut self.voices {
            let phase_step = TAU * voice.freq / self.sample_rate_hz;
            for i in 0..frames {
                if !voice.key_down && voice.release_samples_left == 0 {
                    break;
                }
                let mut gain = voice.velocity;
                if !voice.key_down {
                    gain *= voice.release_samples_left as f32 / voice.release_total_samples as f32;
                    voice.release_samples_left -= 1;
                }

                let mut sample = 0.0;
                for (harmonic, level) in self.partials.iter().enumerate() {
                    if *level > 0.0 {
                        sample += (voice.phase * (harmonic + 1) as f32).sin() * level;
                    }
                }
                let sample = sample / norm * gain * self.amplitude;
                out_l[i] += sample;
                out_r[i] += sample;
                voice.phase += phase_step;
                if voice.phase >= TAU {
                    voice.phase -= TAU;
                }
            }
        }

        self.voices
            .retain(|voice| voice.key_down || voice.release_samples_left > 0);
    }
}

impl Instrument for SineInstrument {
    fn handle_event(&self, event: MidiLikeEvent) {
        let mut inner = self.inner.lock();
        match event {
            MidiLikeEvent::NoteOn { note, velocity } => inner.note_on(note, velocity),
            MidiLikeEvent::NoteOff { note } => inner.note_off(note),
            MidiLikeEvent::AllNotesOff => inner.all_notes_off(),
        }
    }

    fn render(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        self.inner.lock().render(out_l, out_r);
    }
}

/// Builds a [`SineInstrument`] per name; nothing to fetch, so loads are instant.
pub struct SineInstrumentLoader {
    sample_rate_hz: u32,
}

impl SineInstrumentLoader {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self { sample_rate_hz }
    }
}

impl Default for SineInstrumentLoader {
    fn default() -> Self {
        Self::new(48_000)
    }
}

impl InstrumentLoaderPort for SineInstrumentLoader {
    fn load(
        &self,
        name: InstrumentName,
        cancel: &LoadCancellation,
    ) -> Result<Arc<dyn Instrument>, InstrumentError> {
        if cancel.is_cancelled() {
            return Err(InstrumentError::Cancelled);
        }
        Ok(Arc::new(SineInstrument::for_instrument(
            name,
            self.sample_rate_hz,
        )))
    }
}
