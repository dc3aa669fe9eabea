use crate::model::{
    key_from_signature, DictationScore, KeyMode, ScoreImportError, ScoreNoteEvent, TimeSignature,
};
use crate::section::measure_seconds;
use crate::tempo::{TempoMap, TempoPoint, Tick};
use midly::{Fps, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Clone, Copy, Debug)]
struct RawNote {
    on_tick: Tick,
    off_tick: Tick,
    pitch: u8,
    velocity: u8,
}

pub fn import_midi_path(path: &Path) -> Result<DictationScore, ScoreImportError> {
    let data = std::fs::read(path).map_err(|e| ScoreImportError::Io(e.to_string()))?;
    import_midi_bytes(&data)
}

/// Flattens every track of a standard MIDI file into absolute-time note events.
pub fn import_midi_bytes(data: &[u8]) -> Result<DictationScore, ScoreImportError> {
    let smf = Smf::parse(data).map_err(|e| ScoreImportError::Parse(e.to_string()))?;
    let (ppq, tempo_override) = match smf.header.timing {
        Timing::Metrical(ticks) => (ticks.as_int(), None),
        Timing::Timecode(fps, ticks_per_frame) => {
            let (ppq, us_per_quarter) = timecode_ppq_and_tempo(fps, ticks_per_frame);
            (ppq, Some(us_per_quarter))
        }
    };

    let mut tempo_points: BTreeMap<Tick, u32> = BTreeMap::new();
    let mut title: Option<String> = None;
    let mut time_signature: Option<TimeSignature> = None;
    let mut key_signature: Option<(i8, bool)> = None;
    let mut notes: Vec<RawNote> = Vec::new();
    let mut dangling = 0usize;
    let mut last_tick: Tick = 0;

    for track in &smf.tracks {
        let mut tick: Tick = 0;
        let mut open: HashMap<(u8, u8), (Tick, u8)> = HashMap::new();

        for event in track {
            tick += event.delta.as_int() as Tick;
            last_tick = last_tick.max(tick);
            match &event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let pitch = key.as_int();
                            // A repeated NoteOn ends the previous one on the same key.
                            if let Some((on_tick, velocity)) =
                                open.insert((channel, pitch), (tick, vel.as_int()))
                            {
                                notes.push(RawNote {
                                    on_tick,
                                    off_tick: tick,
                                    pitch,
                                    velocity,
                                });
                            }
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pitch = key.as_int();
                            if let Some((on_tick, velocity)) = open.remove(&(channel, pitch)) {
                                notes.push(RawNote {
                                    on_tick,
                                    off_tick: tick,
                                    pitch,
                                    velocity,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter)) => {
                    tempo_points.insert(tick, us_per_quarter.as_int());
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_pow, ..)) => {
                    if time_signature.is_none() {
                        time_signature = Some(TimeSignature {
                            numerator: (*numerator).max(1),
                            denominator: 1u8 << (*denominator_pow).min(7),
                        });
                    }
                }
                TrackEventKind::Meta(MetaMessage::KeySignature(fifths, minor)) => {
                    if key_signature.is_none() {
                        key_signature = Some((*fifths, *minor));
                    }
                }
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    let name = String::from_utf8_lossy(name).trim().to_string();
                    if title.is_none() && !name.is_empty() {
                        title = Some(name);
                    }
                }
                _ => {}
            }
        }

        dangling += open.len();
        let end_tick = tick.saturating_add(ppq.max(1) as Tick);
        for ((_, pitch), (on_tick, velocity)) in open {
            notes.push(RawNote {
                on_tick,
                off_tick: end_tick,
                pitch,
                velocity,
            });
        }
    }

    if dangling > 0 {
        tracing::warn!(dangling, "closing notes without a note-off");
    }

    let tempo_map = build_tempo_map(ppq, tempo_points, tempo_override);
    let mut events: Vec<ScoreNoteEvent> = notes
        .into_iter()
        .map(|note| {
            let onset_seconds = tempo_map.tick_to_seconds(note.on_tick);
            let end_seconds = tempo_map.tick_to_seconds(note.off_tick.max(note.on_tick));
            ScoreNoteEvent {
                onset_seconds,
                pitch: note.pitch,
                duration_seconds: end_seconds - onset_seconds,
                velocity: note.velocity,
            }
        })
        .collect();
    events.sort_by(|a, b| {
        a.onset_seconds
            .total_cmp(&b.onset_seconds)
            .then_with(|| a.pitch.cmp(&b.pitch))
    });

    let (fifths, minor) = key_signature.unwrap_or((0, false));
    let mode = if minor { KeyMode::Minor } else { KeyMode::Major };
    let time_signature = time_signature.unwrap_or_default();
    let bpm = tempo_map.initial_bpm();
    let end_seconds = tempo_map
        .tick_to_seconds(last_tick)
        .max(events.iter().map(ScoreNoteEvent::end_seconds).fold(0.0, f64::max));
    let measure = measure_seconds(time_signature, bpm);
    let total_measures = if measure > 0.0 && !events.is_empty() {
        (end_seconds / measure - 1e-9).ceil().max(1.0) as u32
    } else {
        0
    };

    tracing::debug!(
        notes = events.len(),
        bpm,
        total_measures,
        "imported midi score"
    );

    Ok(DictationScore {
        title: title.unwrap_or_else(|| "Untitled".to_string()),
        key: key_from_signature(fifths, mode),
        mode,
        time_signature,
        bpm,
        total_measures,
        events,
    })
}

fn build_tempo_map(
    ppq: u16,
    tempo_points: BTreeMap<Tick, u32>,
    override_us_per_quarter: Option<u32>,
) -> TempoMap {
    let points = match override_us_per_quarter {
        Some(us_per_quarter) => vec![TempoPoint {
            tick: 0,
            us_per_quarter,
        }],
        None => tempo_points
            .into_iter()
            .map(|(tick, us_per_quarter)| TempoPoint {
                tick,
                us_per_quarter,
            })
            .collect(),
    };
    TempoMap::new(ppq, points)
}

/// SMPTE timing: one "quarter" is treated as one second of frames.
fn timecode_ppq_and_tempo(fps: Fps, ticks_per_frame: u8) -> (u16, u32) {
    let ticks_per_frame = ticks_per_frame.max(1) as u16;
    match fps {
        Fps::Fps24 => (24 * ticks_per_frame, 1_000_000),
        Fps::Fps25 => (25 * ticks_per_frame, 1_000_000),
        Fps::Fps29 => (30 * ticks_per_frame, 1_001_000),
        Fps::Fps30 => (30 * ticks_per_frame, 1_000_000),
    }
}
