use crate::model::{ScoreNoteEvent, TimeSignature};

/// Absolute time span `[start, start + duration)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionWindow {
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl SectionWindow {
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }

    pub fn is_empty(&self) -> bool {
        self.duration_seconds <= 0.0
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start_seconds && seconds < self.end_seconds()
    }
}

pub fn beat_seconds(bpm: f64) -> f64 {
    if bpm > 0.0 && bpm.is_finite() {
        60.0 / bpm
    } else {
        0.0
    }
}

pub fn measure_seconds(time_signature: TimeSignature, bpm: f64) -> f64 {
    time_signature.beats_per_measure() as f64 * beat_seconds(bpm)
}

/// Window covered by `num_measures` measures starting at 1-based `start_measure`.
pub fn section_window(
    start_measure: u32,
    num_measures: u32,
    time_signature: TimeSignature,
    bpm: f64,
) -> SectionWindow {
    let measure = measure_seconds(time_signature, bpm);
    SectionWindow {
        start_seconds: start_measure.saturating_sub(1) as f64 * measure,
        duration_seconds: num_measures as f64 * measure,
    }
}

/// Events whose onset falls inside `window`, re-timed relative to the window start
/// and shifted by `transpose_semitones`. Pitches leaving the MIDI range are dropped.
pub fn slice_section(
    events: &[ScoreNoteEvent],
    window: SectionWindow,
    transpose_semitones: i32,
) -> Vec<ScoreNoteEvent> {
    if window.is_empty() {
        return Vec::new();
    }
    events
        .iter()
        .filter(|event| window.contains(event.onset_seconds))
        .filter_map(|event| {
            let pitch = u8::try_from(event.pitch as i32 + transpose_semitones)
                .ok()
                .filter(|pitch| *pitch <= 127)?;
            Some(ScoreNoteEvent {
                onset_seconds: event.onset_seconds - window.start_seconds,
                pitch,
                ..*event
            })
        })
        .collect()
}
