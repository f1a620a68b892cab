// Progressive tempo - Moves the tempo toward a target every few measures

use serde::{Deserialize, Serialize};

use crate::sequencer::timeline::{MAX_BPM, MIN_BPM};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProgressiveSettings {
    pub enabled: bool,
    pub start_tempo: f64,
    pub target_tempo: f64,
    /// BPM added (or removed) per increment, 1..=20
    pub increment_bpm: f64,
    /// Measures between increments, 1..=16
    pub increment_every: u32,
}

impl ProgressiveSettings {
    pub fn normalized(self) -> Self {
        Self {
            start_tempo: clamp_bpm(self.start_tempo),
            target_tempo: clamp_bpm(self.target_tempo),
            increment_bpm: if self.increment_bpm.is_nan() {
                1.0
            } else {
                self.increment_bpm.clamp(1.0, 20.0)
            },
            increment_every: self.increment_every.clamp(1, 16),
            ..self
        }
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() {
        MIN_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}

impl Default for ProgressiveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_tempo: 80.0,
            target_tempo: 120.0,
            increment_bpm: 5.0,
            increment_every: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressiveTempo {
    settings: ProgressiveSettings,
    measure_count: u32,
}

impl ProgressiveTempo {
    pub fn new(settings: ProgressiveSettings) -> Self {
        Self {
            settings: settings.normalized(),
            measure_count: 0,
        }
    }

    pub fn settings(&self) -> ProgressiveSettings {
        self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Tempo to apply when playback starts
    pub fn start(&mut self) -> Option<f64> {
        self.measure_count = 0;
        self.settings.enabled.then_some(self.settings.start_tempo)
    }

    /// Counts one measure; returns the new tempo when an increment is due
    pub fn advance(&mut self, current_tempo: f64) -> Option<f64> {
        if !self.settings.enabled {
            return None;
        }

        self.measure_count += 1;
        if self.measure_count < self.settings.increment_every {
            return None;
        }
        self.measure_count = 0;

        let target = self.settings.target_tempo;
        let step = self.settings.increment_bpm;
        let next = if current_tempo < target {
            (current_tempo + step).min(target)
        } else if current_tempo > target {
            (current_tempo - step).max(target)
        } else {
            return None;
        };
        Some(next)
    }
}
