/// One-pole smoothing coefficient for time constant `tau_seconds`.
pub fn one_pole_coeff(sample_rate_hz: u32, tau_seconds: f32) -> f32 {
    if tau_seconds <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / (tau_seconds * sample_rate_hz.max(1) as f32)).exp()
}

pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub const MASTER_RAMP_SECONDS: f32 = 0.05;

/// Exponential approach towards a moving target, so volume changes do not click.
#[derive(Clone, Copy, Debug)]
pub struct GainRamp {
    current: f32,
    coeff: f32,
}

impl GainRamp {
    pub fn new(sample_rate_hz: u32, tau_seconds: f32, initial: f32) -> Self {
        Self {
            current: initial,
            coeff: one_pole_coeff(sample_rate_hz, tau_seconds),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn next(&mut self, target: f32) -> f32 {
        self.current += self.coeff * (target - self.current);
        self.current
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimiterConfig {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_seconds: f32,
    pub release_seconds: f32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            threshold_db: -3.0,
            ratio: 20.0,
            attack_seconds: 0.005,
            release_seconds: 0.05,
        }
    }
}

/// Stereo-linked hard-knee compressor used as the final stage.
#[derive(Clone, Copy, Debug)]
pub struct Limiter {
    threshold: f32,
    slope: f32,
    attack: f32,
    release: f32,
    envelope: f32,
}

impl Limiter {
    pub fn new(sample_rate_hz: u32, config: LimiterConfig) -> Self {
        Self {
            threshold: db_to_linear(config.threshold_db),
            slope: 1.0 - 1.0 / config.ratio.max(1.0),
            attack: one_pole_coeff(sample_rate_hz, config.attack_seconds),
            release: one_pole_coeff(sample_rate_hz, config.release_seconds),
            envelope: 0.0,
        }
    }

    /// Gain reduction currently applied, in `(0, 1]`.
    pub fn gain(&self) -> f32 {
        if self.envelope > self.threshold {
            (self.threshold / self.envelope).powf(self.slope)
        } else {
            1.0
        }
    }

    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let peak = left.abs().max(right.abs());
        let coeff = if peak > self.envelope {
            self.attack
        } else {
            self.release
        };
        self.envelope += coeff * (peak - self.envelope);
        let gain = self.gain();
        // Ceiling at full scale while the envelope is still catching up.
        (
            (left * gain).clamp(-1.0, 1.0),
            (right * gain).clamp(-1.0, 1.0),
        )
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
