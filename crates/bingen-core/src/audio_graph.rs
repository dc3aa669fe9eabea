use crate::clock::ClockScheduler;
use crate::dynamics::{GainRamp, Limiter, LimiterConfig, MASTER_RAMP_SECONDS};
use crate::rack::InstrumentRack;
use bingen_ports::audio::AudioRenderCallback;
use bingen_ports::types::SampleTime;
use std::sync::Arc;

/// Render callback: fires due jobs at their exact sample offset, then mixes
/// instrument and click through the master ramp and the limiter.
pub struct AudioGraph {
    rack: Arc<InstrumentRack>,
    scheduler: Arc<ClockScheduler>,
    scratch_l: Vec<f32>,
    scratch_r: Vec<f32>,
    master: GainRamp,
    limiter: Limiter,
}

impl AudioGraph {
    pub fn new(rack: Arc<InstrumentRack>, scheduler: Arc<ClockScheduler>, max_frames: usize) -> Self {
        let sample_rate_hz = scheduler.clock().sample_rate_hz();
        let master = GainRamp::new(
            sample_rate_hz,
            MASTER_RAMP_SECONDS,
            rack.params().master_target(),
        );
        Self {
            rack,
            scheduler,
            scratch_l: vec![0.0; max_frames],
            scratch_r: vec![0.0; max_frames],
            master,
            limiter: Limiter::new(sample_rate_hz, LimiterConfig::default()),
        }
    }

    fn ensure_scratch(&mut self, frames: usize) {
        if self.scratch_l.len() < frames {
            self.scratch_l.resize(frames, 0.0);
            self.scratch_r.resize(frames, 0.0);
        }
    }

    fn render_segment(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        out_l.fill(0.0);
        out_r.fill(0.0);

        let scratch_l = &mut self.scratch_l[..frames];
        let scratch_r = &mut self.scratch_r[..frames];

        if let Some(active) = self.rack.active() {
            active.instrument.render(scratch_l, scratch_r);
            let gain = active.source_gain();
            for i in 0..frames {
                out_l[i] += scratch_l[i] * gain;
                out_r[i] += scratch_r[i] * gain;
            }
        }

        self.rack.click().render(scratch_l, scratch_r);
        let click_gain = self.rack.params().metronome();
        for i in 0..frames {
            out_l[i] += scratch_l[i] * click_gain;
            out_r[i] += scratch_r[i] * click_gain;
        }

        let target = self.rack.params().master_target();
        for i in 0..frames {
            let gain = self.master.next(target);
            let (l, r) = self.limiter.process(out_l[i] * gain, out_r[i] * gain);
            out_l[i] = l;
            out_r[i] = r;
        }
    }
}

impl AudioRenderCallback for AudioGraph {
    fn render(&mut self, sample_time_start: SampleTime, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        let sample_time_end = sample_time_start.saturating_add(frames as u64);
        self.ensure_scratch(frames);

        let clock = self.scheduler.clock().clone();
        let mut cursor_sample = sample_time_start;
        let mut cursor_frame = 0usize;

        while let Some(job) = self.scheduler.pop_due_before(sample_time_end) {
            let job_sample = job.due.max(cursor_sample);
            let offset = (job_sample - cursor_sample) as usize;
            if offset > 0 {
                let end = cursor_frame + offset;
                self.render_segment(
                    &mut out_l[cursor_frame..end],
                    &mut out_r[cursor_frame..end],
                );
                cursor_frame = end;
                cursor_sample = job_sample;
            }
            clock.set(cursor_sample);
            job.run();
        }

        if cursor_frame < frames {
            self.render_segment(
                &mut out_l[cursor_frame..frames],
                &mut out_r[cursor_frame..frames],
            );
        }

        clock.set(sample_time_end);
    }
}
