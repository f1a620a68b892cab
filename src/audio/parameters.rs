// Atomic parameters - Lock-free communication engine ↔ audio thread
// Gains are written by the engine and snapshotted by the renderer once per block

use crate::instrument::InstrumentId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe f32 parameter using atomic operations
/// Converts f32 to u32 bits for atomic storage
#[derive(Clone, Debug)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Set the value (called from engine thread)
    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get the value (called from audio thread)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Mixer bus a voice is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    Instrument(InstrumentId),
    Click,
}

impl Bus {
    pub const COUNT: usize = InstrumentId::COUNT + 1;

    /// Dense index in `0..COUNT`
    pub fn index(&self) -> usize {
        match self {
            Bus::Instrument(id) => id.index(),
            Bus::Click => InstrumentId::COUNT,
        }
    }
}

/// Default click bus gain
pub const DEFAULT_CLICK_GAIN: f32 = 0.5;

/// Gain stages of the output graph: one per instrument, one for the click, and master
///
/// Cloning shares the underlying atomics.
#[derive(Clone, Debug)]
pub struct MixerParams {
    master: AtomicF32,
    buses: [AtomicF32; Bus::COUNT],
}

impl MixerParams {
    pub fn new() -> Self {
        let buses = std::array::from_fn(|i| {
            if i == Bus::Click.index() {
                AtomicF32::new(DEFAULT_CLICK_GAIN)
            } else {
                AtomicF32::new(InstrumentId::ALL[i].default_settings().volume())
            }
        });
        Self {
            master: AtomicF32::new(1.0),
            buses,
        }
    }

    pub fn master(&self) -> f32 {
        self.master.get()
    }

    pub fn set_master(&self, gain: f32) {
        self.master.set(gain);
    }

    pub fn bus_gain(&self, bus: Bus) -> f32 {
        self.buses[bus.index()].get()
    }

    pub fn set_bus_gain(&self, bus: Bus, gain: f32) {
        self.buses[bus.index()].set(gain);
    }

    /// Snapshot of every bus gain, indexed by `Bus::index`
    pub fn bus_gains(&self) -> [f32; Bus::COUNT] {
        std::array::from_fn(|i| self.buses[i].get())
    }
}

impl Default for MixerParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_f32_shared_between_clones() {
        let a = AtomicF32::new(0.25);
        let b = a.clone();
        b.set(0.75);
        assert_eq!(a.get(), 0.75);
    }

    #[test]
    fn test_bus_indices_are_dense() {
        let mut seen = [false; Bus::COUNT];
        for id in InstrumentId::ALL {
            seen[Bus::Instrument(id).index()] = true;
        }
        seen[Bus::Click.index()] = true;
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_mixer_defaults() {
        let mixer = MixerParams::new();
        assert_eq!(mixer.master(), 1.0);
        assert_eq!(mixer.bus_gain(Bus::Click), DEFAULT_CLICK_GAIN);
        assert_eq!(mixer.bus_gain(Bus::Instrument(InstrumentId::HihatOpen)), 0.5);
    }

    #[test]
    fn test_gain_update_is_visible_to_clone() {
        let engine_side = MixerParams::new();
        let audio_side = engine_side.clone();
        engine_side.set_bus_gain(Bus::Instrument(InstrumentId::Kick), 0.0);
        assert_eq!(audio_side.bus_gain(Bus::Instrument(InstrumentId::Kick)), 0.0);
    }
}
