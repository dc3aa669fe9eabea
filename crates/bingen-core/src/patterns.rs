use bingen_domain_score::{
    beat_seconds, measure_seconds, section_window, slice_section, DictationScore, KeyMode,
    ScoreNoteEvent, TimeSignature,
};
use bingen_ports::pitch::PitchClass;
use serde::{Deserialize, Serialize};

/// Block and sequence notes ring this long.
pub const NOTE_SECONDS: f64 = 3.0;
pub const ARPEGGIO_GAP_SECONDS: f64 = 0.3;
pub const DEFAULT_VELOCITY: u8 = 100;

pub const CADENCE_CHORD_SECONDS: f64 = 0.9;
pub const CLICK_SECONDS: f64 = 0.05;
pub const ACCENT_CLICK: (u8, u8) = (96, 120);
pub const BEAT_CLICK: (u8, u8) = (89, 90);

/// Lowest tonic used for the cadence; keeps the whole progression mid-register.
const CADENCE_TONIC_FLOOR: i32 = 55;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceTarget {
    Instrument,
    Click,
}

/// One note to schedule, relative to the moment playback is requested.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedVoice {
    pub offset_seconds: f64,
    pub midi: u8,
    pub velocity: u8,
    pub duration_seconds: f64,
    pub target: VoiceTarget,
}

impl PlannedVoice {
    pub fn end_seconds(&self) -> f64 {
        self.offset_seconds + self.duration_seconds
    }
}

pub fn plan_duration(voices: &[PlannedVoice]) -> f64 {
    voices
        .iter()
        .map(PlannedVoice::end_seconds)
        .fold(0.0, f64::max)
}

fn to_midi(value: i32) -> Option<u8> {
    u8::try_from(value).ok().filter(|midi| *midi <= 127)
}

/// Notes `index * gap` apart. Pitches outside the MIDI range are skipped.
pub fn sequence_voices(midis: &[i32], gap_seconds: f64) -> Vec<PlannedVoice> {
    let gap = if gap_seconds.is_finite() {
        gap_seconds.max(0.0)
    } else {
        0.0
    };
    midis
        .iter()
        .enumerate()
        .filter_map(|(index, midi)| {
            let Some(midi) = to_midi(*midi) else {
                tracing::warn!(midi, "skipping note outside the midi range");
                return None;
            };
            Some(PlannedVoice {
                offset_seconds: index as f64 * gap,
                midi,
                velocity: DEFAULT_VELOCITY,
                duration_seconds: NOTE_SECONDS,
                target: VoiceTarget::Instrument,
            })
        })
        .collect()
}

/// I–IV–V–I (i–iv–V–i in minor) with a doubled bass, one chord every
/// `CADENCE_CHORD_SECONDS`.
pub fn cadence_voices(tonic: PitchClass, mode: KeyMode) -> Vec<PlannedVoice> {
    let third = match mode {
        KeyMode::Major => 4,
        KeyMode::Minor => 3,
    };
    let sixth = match mode {
        KeyMode::Major => 9,
        KeyMode::Minor => 8,
    };
    let chords: [([i32; 3], i32); 4] = [
        ([0, third, 7], -12),
        ([5, sixth, 12], -7),
        ([7, 11, 14], -5),
        ([0, third, 7], -12),
    ];
    let root = CADENCE_TONIC_FLOOR + (tonic.chroma() - CADENCE_TONIC_FLOOR).rem_euclid(12);

    chords
        .iter()
        .enumerate()
        .flat_map(|(index, (upper, bass))| {
            let offset_seconds = index as f64 * CADENCE_CHORD_SECONDS;
            std::iter::once(*bass)
                .chain(upper.iter().copied())
                .filter_map(move |interval| {
                    Some(PlannedVoice {
                        offset_seconds,
                        midi: to_midi(root + interval)?,
                        velocity: DEFAULT_VELOCITY,
                        duration_seconds: CADENCE_CHORD_SECONDS,
                        target: VoiceTarget::Instrument,
                    })
                })
        })
        .collect()
}

/// Clicks on every beat of `measures` measures, accent on each downbeat.
pub fn metronome_voices(
    measures: u32,
    time_signature: TimeSignature,
    bpm: f64,
    start_offset_seconds: f64,
) -> Vec<PlannedVoice> {
    let beat = beat_seconds(bpm);
    if beat <= 0.0 {
        return Vec::new();
    }
    let beats_per_measure = time_signature.beats_per_measure();
    let start = start_offset_seconds.max(0.0);

    (0..measures * beats_per_measure)
        .map(|beat_index| {
            let (midi, velocity) = if beat_index % beats_per_measure == 0 {
                ACCENT_CLICK
            } else {
                BEAT_CLICK
            };
            PlannedVoice {
                offset_seconds: start + beat_index as f64 * beat,
                midi,
                velocity,
                duration_seconds: CLICK_SECONDS,
                target: VoiceTarget::Click,
            }
        })
        .collect()
}

/// Measure range of a score to play, optionally preceded by a metronome count-in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionRequest {
    /// 1-based.
    pub start_measure: u32,
    pub num_measures: u32,
    pub time_signature: TimeSignature,
    pub bpm: f64,
    pub transpose_semitones: i32,
    pub count_in_measures: u32,
}

impl SectionRequest {
    /// Uses the score's own metre and tempo, untransposed, without count-in.
    pub fn for_score(score: &DictationScore, start_measure: u32, num_measures: u32) -> Self {
        Self {
            start_measure,
            num_measures,
            time_signature: score.time_signature,
            bpm: score.bpm,
            transpose_semitones: 0,
            count_in_measures: 0,
        }
    }

    pub fn with_transpose(mut self, semitones: i32) -> Self {
        self.transpose_semitones = semitones;
        self
    }

    pub fn with_count_in(mut self, measures: u32) -> Self {
        self.count_in_measures = measures;
        self
    }
}

/// Count-in clicks followed by the section's events, re-timed to the window start.
pub fn section_voices(events: &[ScoreNoteEvent], request: &SectionRequest) -> Vec<PlannedVoice> {
    let window = section_window(
        request.start_measure,
        request.num_measures,
        request.time_signature,
        request.bpm,
    );
    let sliced = slice_section(events, window, request.transpose_semitones);
    if sliced.is_empty() {
        return Vec::new();
    }

    let lead_in =
        request.count_in_measures as f64 * measure_seconds(request.time_signature, request.bpm);
    let mut voices = metronome_voices(
        request.count_in_measures,
        request.time_signature,
        request.bpm,
        0.0,
    );
    voices.extend(sliced.into_iter().map(|event| PlannedVoice {
        offset_seconds: lead_in + event.onset_seconds,
        midi: event.pitch,
        velocity: event.velocity,
        duration_seconds: event.duration_seconds.max(0.0),
        target: VoiceTarget::Instrument,
    }));
    voices
}
