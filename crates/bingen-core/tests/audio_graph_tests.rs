mod support;

use bingen_core::{
    db_to_linear, AudioClock, AudioGraph, AudioParams, ClockScheduler, GainRamp, InstrumentRack,
    Limiter, LimiterConfig, MASTER_BOOST,
};
use bingen_ports::audio::AudioRenderCallback;
use bingen_ports::instrument::{Instrument, InstrumentName, MidiLikeEvent};
use bingen_ports::scheduler::SchedulerPort;
use bingen_ports::types::Volume01;
use std::sync::Arc;
use support::{RecordingInstrument, TEST_SAMPLE_RATE};

fn graph_rig() -> (
    AudioGraph,
    Arc<ClockScheduler>,
    Arc<InstrumentRack>,
    Arc<RecordingInstrument>,
) {
    let scheduler = Arc::new(ClockScheduler::new(Arc::new(AudioClock::new(
        TEST_SAMPLE_RATE,
    ))));
    let rack = Arc::new(InstrumentRack::new(
        Arc::new(RecordingInstrument::default()),
        AudioParams::default(),
    ));
    let piano = Arc::new(RecordingInstrument::default());
    rack.set_active(InstrumentName::AcousticGrandPiano, piano.clone());
    let graph = AudioGraph::new(rack.clone(), scheduler.clone(), 64);
    (graph, scheduler, rack, piano)
}

#[test]
fn jobs_fire_at_their_sample_offset_inside_a_block() {
    let (mut graph, scheduler, _rack, piano) = graph_rig();
    let target: Arc<dyn Instrument> = piano.clone();
    scheduler.schedule(
        0.05,
        Box::new(move || target.handle_event(MidiLikeEvent::NoteOn { note: 60, velocity: 100 })),
    );

    let mut left = vec![0.0_f32; 100];
    let mut right = vec![0.0_f32; 100];
    graph.render(0, &mut left, &mut right);

    assert!(left[..50].iter().all(|sample| *sample == 0.0));
    assert!(left[50..].iter().all(|sample| *sample > 0.0));
    assert_eq!(piano.note_ons(), vec![(60, 100)]);
    assert_eq!(scheduler.clock().get(), 100);
}

#[test]
fn boosted_output_never_exceeds_full_scale() {
    let (mut graph, _scheduler, _rack, piano) = graph_rig();
    piano.handle_event(MidiLikeEvent::NoteOn { note: 60, velocity: 127 });

    let mut left = vec![0.0_f32; 500];
    let mut right = vec![0.0_f32; 500];
    graph.render(0, &mut left, &mut right);

    assert!(left.iter().chain(right.iter()).all(|s| s.abs() <= 1.0));
    // Settled: the limiter holds the level just above its threshold.
    let settled = left[499];
    assert!(settled > db_to_linear(-3.0) && settled < 1.0, "settled at {settled}");
}

#[test]
fn master_volume_changes_are_ramped() {
    let (mut graph, _scheduler, rack, piano) = graph_rig();
    rack.params().set_master(Volume01::new(0.0));
    piano.handle_event(MidiLikeEvent::NoteOn { note: 60, velocity: 127 });

    let mut left = vec![0.0_f32; 4];
    let mut right = vec![0.0_f32; 4];
    graph.render(0, &mut left, &mut right);

    // Still fading out from the initial volume, not cut to silence.
    assert!(left[0] > 0.0);

    let mut left = vec![0.0_f32; 1_000];
    let mut right = vec![0.0_f32; 1_000];
    graph.render(4, &mut left, &mut right);
    assert!(left[999].abs() < 0.01);
}

#[test]
fn gain_ramp_converges_on_its_target() {
    let mut ramp = GainRamp::new(1_000, 0.05, 0.0);
    let target = 0.7 * MASTER_BOOST;
    let mut value = 0.0;
    for _ in 0..250 {
        value = ramp.next(target);
    }
    assert!((value - target).abs() < target * 0.01);
}

#[test]
fn limiter_leaves_quiet_signals_alone() {
    let mut limiter = Limiter::new(1_000, LimiterConfig::default());
    for _ in 0..100 {
        assert_eq!(limiter.process(0.1, -0.1), (0.1, -0.1));
    }
    assert_eq!(limiter.gain(), 1.0);
}

#[test]
fn limiter_compresses_loud_signals_towards_the_threshold() {
    let mut limiter = Limiter::new(1_000, LimiterConfig::default());
    let mut out = (0.0, 0.0);
    for _ in 0..200 {
        out = limiter.process(2.0, 2.0);
    }
    assert!(out.0 > 0.70 && out.0 < 0.80, "limited to {}", out.0);
    assert!(limiter.gain() < 0.5);

    limiter.reset();
    assert_eq!(limiter.gain(), 1.0);
}
