use bingen_ports::storage::SettingsDto;
use bingen_ports::types::Volume01;
use std::sync::atomic::{AtomicU32, Ordering};

/// Fixed boost on top of the user volume, compensating for quiet sample sets.
/// The limiter downstream keeps the result from clipping.
pub const MASTER_BOOST: f32 = 4.0;

#[derive(Debug)]
pub struct AudioParams {
    master: AtomicU32,
    metronome: AtomicU32,
}

impl AudioParams {
    pub fn new(settings: &SettingsDto) -> Self {
        Self {
            master: AtomicU32::new(settings.master_volume.get().to_bits()),
            metronome: AtomicU32::new(1.0_f32.to_bits()),
        }
    }

    pub fn set_master(&self, volume: Volume01) {
        self.master.store(volume.get().to_bits(), Ordering::Relaxed);
    }

    pub fn set_metronome(&self, volume: Volume01) {
        self.metronome
            .store(volume.get().to_bits(), Ordering::Relaxed);
    }

    /// User volume in `[0, 1]`.
    pub fn master(&self) -> f32 {
        f32::from_bits(self.master.load(Ordering::Relaxed))
    }

    /// Gain the master stage ramps towards.
    pub fn master_target(&self) -> f32 {
        self.master() * MASTER_BOOST
    }

    pub fn metronome(&self) -> f32 {
        f32::from_bits(self.metronome.load(Ordering::Relaxed))
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self::new(&SettingsDto::default())
    }
}
