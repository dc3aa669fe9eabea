use serde::{Deserialize, Serialize};

pub type Tick = i64;

pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoPoint {
    pub tick: Tick,
    pub us_per_quarter: u32,
}

#[derive(Clone, Copy, Debug)]
struct TempoSegment {
    start_tick: Tick,
    start_us: i64,
    us_per_quarter: u32,
}

/// Piecewise-constant tempo: converts MIDI ticks to wall-clock time.
#[derive(Clone, Debug)]
pub struct TempoMap {
    ppq: u16,
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    pub fn new(ppq: u16, mut points: Vec<TempoPoint>) -> Self {
        points.sort_by_key(|point| point.tick);
        if points.first().map_or(true, |point| point.tick != 0) {
            points.insert(
                0,
                TempoPoint {
                    tick: 0,
                    us_per_quarter: DEFAULT_US_PER_QUARTER,
                },
            );
        }

        let ppq = ppq.max(1);
        let mut segments: Vec<TempoSegment> = Vec::with_capacity(points.len());
        for point in points {
            let start_us = match segments.last() {
                Some(prev) => {
                    prev.start_us
                        + ticks_to_us(point.tick - prev.start_tick, prev.us_per_quarter, ppq)
                }
                None => 0,
            };
            segments.push(TempoSegment {
                start_tick: point.tick,
                start_us,
                us_per_quarter: point.us_per_quarter.max(1),
            });
        }

        Self { ppq, segments }
    }

    pub fn ppq(&self) -> u16 {
        self.ppq
    }

    /// Tempo in effect at tick 0, in quarter notes per minute.
    pub fn initial_bpm(&self) -> f64 {
        let us_per_quarter = self
            .segments
            .first()
            .map_or(DEFAULT_US_PER_QUARTER, |segment| segment.us_per_quarter);
        60_000_000.0 / us_per_quarter as f64
    }

    pub fn tick_to_micros(&self, tick: Tick) -> i64 {
        let segment = self
            .segments
            .iter()
            .take_while(|segment| segment.start_tick <= tick)
            .last()
            .or_else(|| self.segments.first());
        match segment {
            Some(segment) => {
                segment.start_us
                    + ticks_to_us(tick - segment.start_tick, segment.us_per_quarter, self.ppq)
            }
            None => ticks_to_us(tick, DEFAULT_US_PER_QUARTER, self.ppq),
        }
    }

    pub fn tick_to_seconds(&self, tick: Tick) -> f64 {
        self.tick_to_micros(tick) as f64 / 1_000_000.0
    }
}

fn ticks_to_us(ticks: Tick, us_per_quarter: u32, ppq: u16) -> i64 {
    ((ticks as i128 * us_per_quarter as i128) / ppq as i128) as i64
}
