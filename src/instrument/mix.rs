// Mix - Per-instrument volume, mute and solo resolution

use super::InstrumentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mixer settings of one instrument
///
/// `pan` is kept with the settings but the output is mono for now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSettings")]
pub struct InstrumentSettings {
    volume: f32,
    pub muted: bool,
    pan: f32,
}

impl InstrumentSettings {
    /// Volume is clamped to [0, 1] and pan to [-1, 1]
    pub fn new(volume: f32, muted: bool, pan: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            muted,
            pan: pan.clamp(-1.0, 1.0),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self::new(0.8, false, 0.0)
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSettings {
    volume: f32,
    muted: bool,
    pan: f32,
}

impl Default for RawSettings {
    fn default() -> Self {
        let settings = InstrumentSettings::default();
        Self {
            volume: settings.volume,
            muted: settings.muted,
            pan: settings.pan,
        }
    }
}

impl From<RawSettings> for InstrumentSettings {
    fn from(raw: RawSettings) -> Self {
        Self::new(raw.volume, raw.muted, raw.pan)
    }
}

/// Gain an instrument's bus should have
///
/// A soloed instrument plays at its volume even when muted and silences every other
/// instrument. Without solo, muted instruments are silent.
pub fn effective_gain(
    instrument: InstrumentId,
    settings: &InstrumentSettings,
    solo: Option<InstrumentId>,
) -> f32 {
    match solo {
        Some(soloed) if soloed == instrument => settings.volume,
        Some(_) => 0.0,
        None if settings.muted => 0.0,
        None => settings.volume,
    }
}

/// Settings of every instrument plus the solo target
///
/// Instruments without explicit settings fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixState {
    settings: HashMap<InstrumentId, InstrumentSettings>,
    solo: Option<InstrumentId>,
}

impl MixState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole settings mapping
    pub fn set_all(&mut self, settings: HashMap<InstrumentId, InstrumentSettings>) {
        self.settings = settings;
    }

    pub fn set(&mut self, instrument: InstrumentId, settings: InstrumentSettings) {
        self.settings.insert(instrument, settings);
    }

    pub fn settings(&self, instrument: InstrumentId) -> InstrumentSettings {
        self.settings
            .get(&instrument)
            .copied()
            .unwrap_or_else(|| instrument.default_settings())
    }

    pub fn set_solo(&mut self, solo: Option<InstrumentId>) {
        self.solo = solo;
    }

    pub fn solo(&self) -> Option<InstrumentId> {
        self.solo
    }

    pub fn gain(&self, instrument: InstrumentId) -> f32 {
        effective_gain(instrument, &self.settings(instrument), self.solo)
    }

    /// Gains of every instrument, indexed by `InstrumentId::index`
    pub fn gains(&self) -> [f32; InstrumentId::COUNT] {
        let mut gains = [0.0; InstrumentId::COUNT];
        for id in InstrumentId::ALL {
            gains[id.index()] = self.gain(id);
        }
        gains
    }
}
