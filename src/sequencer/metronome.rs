// Metronome - Click track generator for musical timing
// Clicks are synthesized like drum hits and routed to their own click bus

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::parameters::{Bus, DEFAULT_CLICK_GAIN};
use crate::synth::envelope::Ramp;
use crate::synth::filter::FilterParams;
use crate::synth::noise::{NoiseBuffer, shared_noise};
use crate::synth::oscillator::WaveformType;
use crate::synth::voice::{LayerSpec, VoiceSink};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    pub fn from_downbeat(is_downbeat: bool) -> Self {
        if is_downbeat {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }
}

/// Click timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickSound {
    /// Short sine burst
    #[default]
    Beep,
    /// Resonant band-passed noise, like a wood block
    Wood,
    /// Triangle and square pair, like a stick on a rim
    Stick,
}

/// Metronome click generator
///
/// Holds the click timbre and volume. The volume is applied by the click bus gain,
/// so changing it also affects clicks already scheduled.
#[derive(Debug, Clone)]
pub struct Metronome {
    sound: ClickSound,
    volume: f32,
    noise: Arc<NoiseBuffer>,
}

impl Metronome {
    /// Create new metronome
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sound: ClickSound::default(),
            volume: DEFAULT_CLICK_GAIN,
            noise: shared_noise(sample_rate),
        }
    }

    pub fn set_click_sound(&mut self, sound: ClickSound) {
        self.sound = sound;
    }

    pub fn click_sound(&self) -> ClickSound {
        self.sound
    }

    /// Set metronome volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Get metronome volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Follows a sample rate change of the output
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.noise.sample_rate() != sample_rate {
            self.noise = shared_noise(sample_rate);
        }
    }

    /// Schedules one click at `time` (audio clock seconds)
    pub fn click<S: VoiceSink + ?Sized>(&self, time: f64, is_downbeat: bool, sink: &mut S) {
        let click_type = ClickType::from_downbeat(is_downbeat);
        match self.sound {
            ClickSound::Beep => self.beep(time, click_type, sink),
            ClickSound::Wood => self.wood(time, click_type, sink),
            ClickSound::Stick => self.stick(time, click_type, sink),
        }
    }

    fn beep<S: VoiceSink + ?Sized>(&self, t: f64, click_type: ClickType, sink: &mut S) {
        let (frequency, level) = match click_type {
            ClickType::Accent => (1000.0, 1.0),
            ClickType::Regular => (800.0, 0.7),
        };
        sink.schedule(
            Bus::Click,
            LayerSpec::tone(
                WaveformType::Sine,
                Ramp::constant(frequency),
                Ramp::decay(level, 0.05),
                t,
                t + 0.06,
            ),
        );
    }

    fn wood<S: VoiceSink + ?Sized>(&self, t: f64, click_type: ClickType, sink: &mut S) {
        let (center, level) = match click_type {
            ClickType::Accent => (2500.0, 1.0),
            ClickType::Regular => (2000.0, 0.7),
        };
        sink.schedule(
            Bus::Click,
            LayerSpec::noise(Arc::clone(&self.noise), Ramp::decay(level, 0.03), t, t + 0.04)
                .with_filter(FilterParams::band_pass(center, 15.0)),
        );
    }

    fn stick<S: VoiceSink + ?Sized>(&self, t: f64, click_type: ClickType, sink: &mut S) {
        let (triangle, square, level) = match click_type {
            ClickType::Accent => (3000.0, 4500.0, 0.4),
            ClickType::Regular => (2500.0, 4000.0, 0.3),
        };
        for (waveform, frequency) in [
            (WaveformType::Triangle, triangle),
            (WaveformType::Square, square),
        ] {
            sink.schedule(
                Bus::Click,
                LayerSpec::tone(
                    waveform,
                    Ramp::constant(frequency),
                    Ramp::decay(level, 0.02),
                    t,
                    t + 0.025,
                ),
            );
        }
    }
}
