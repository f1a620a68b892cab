// Voice - One scheduled sound layer and its render state
//
// A drum hit is a handful of layers (an oscillator or a noise burst, optional filters and an
// exponential gain envelope) with absolute start/stop times on the audio clock. The synth
// describes layers with `LayerSpec`, the renderer plays them as `Voice`s.

use std::sync::Arc;

use crate::audio::parameters::Bus;
use crate::audio::timing::seconds_to_samples;
use crate::synth::envelope::Ramp;
use crate::synth::filter::{BiquadFilter, FilterParams};
use crate::synth::noise::NoiseBuffer;
use crate::synth::oscillator::{Oscillator, SimpleOscillator, WaveformType};

/// Maximum number of filters chained on one layer
pub const MAX_LAYER_FILTERS: usize = 2;

/// Sound source of a layer
#[derive(Debug, Clone)]
pub enum LayerSource {
    /// Oscillator whose frequency follows `frequency`
    Tone {
        waveform: WaveformType,
        frequency: Ramp,
    },
    /// Plays the buffer once from its first sample
    Noise(Arc<NoiseBuffer>),
}

/// Description of one layer of a hit, times in audio clock seconds
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub source: LayerSource,
    pub filters: [Option<FilterParams>; MAX_LAYER_FILTERS],
    pub gain: Ramp,
    pub start: f64,
    pub stop: f64,
}

impl LayerSpec {
    pub fn tone(waveform: WaveformType, frequency: Ramp, gain: Ramp, start: f64, stop: f64) -> Self {
        Self {
            source: LayerSource::Tone {
                waveform,
                frequency,
            },
            filters: [None; MAX_LAYER_FILTERS],
            gain,
            start,
            stop,
        }
    }

    pub fn noise(buffer: Arc<NoiseBuffer>, gain: Ramp, start: f64, stop: f64) -> Self {
        Self {
            source: LayerSource::Noise(buffer),
            filters: [None; MAX_LAYER_FILTERS],
            gain,
            start,
            stop,
        }
    }

    /// Appends a filter stage. Stages past `MAX_LAYER_FILTERS` are ignored.
    pub fn with_filter(mut self, params: FilterParams) -> Self {
        if let Some(slot) = self.filters.iter_mut().find(|f| f.is_none()) {
            *slot = Some(params);
        }
        self
    }

    /// Peak gain of the layer
    pub fn peak_gain(&self) -> f32 {
        self.gain.start
    }
}

/// Destination for scheduled layers
///
/// Implemented by the engine's audio graph (forwards to the audio thread) and by
/// `Vec<(Bus, LayerSpec)>` for inspection.
pub trait VoiceSink {
    fn schedule(&mut self, bus: Bus, layer: LayerSpec);
}

impl VoiceSink for Vec<(Bus, LayerSpec)> {
    fn schedule(&mut self, bus: Bus, layer: LayerSpec) {
        self.push((bus, layer));
    }
}

#[derive(Debug, Clone)]
enum VoiceSource {
    Tone {
        oscillator: SimpleOscillator,
        frequency: Ramp,
    },
    Noise {
        buffer: Arc<NoiseBuffer>,
        position: usize,
    },
}

/// A layer being played by the renderer, positioned in samples
#[derive(Debug, Clone)]
pub struct Voice {
    bus: Bus,
    start_sample: u64,
    stop_sample: u64,
    sample_rate: f64,
    source: VoiceSource,
    filters: [Option<BiquadFilter>; MAX_LAYER_FILTERS],
    gain: Ramp,
    finished: bool,
}

impl Voice {
    /// Prepare `layer` for playback at `sample_rate`
    pub fn new(bus: Bus, layer: LayerSpec, sample_rate: f32) -> Self {
        let rate = sample_rate as f64;
        let start_sample = seconds_to_samples(layer.start, rate);
        let stop_sample = seconds_to_samples(layer.stop, rate).max(start_sample);

        let source = match layer.source {
            LayerSource::Tone {
                waveform,
                frequency,
            } => VoiceSource::Tone {
                oscillator: SimpleOscillator::new(waveform, sample_rate),
                frequency,
            },
            LayerSource::Noise(buffer) => VoiceSource::Noise {
                buffer,
                position: 0,
            },
        };

        let filters = layer
            .filters
            .map(|params| params.map(|p| BiquadFilter::new(p, sample_rate)));

        Self {
            bus,
            start_sample,
            stop_sample,
            sample_rate: rate,
            source,
            filters,
            gain: layer.gain,
            finished: false,
        }
    }

    pub fn bus(&self) -> Bus {
        self.bus
    }

    pub fn start_sample(&self) -> u64 {
        self.start_sample
    }

    pub fn stop_sample(&self) -> u64 {
        self.stop_sample
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Output at absolute sample `now`
    ///
    /// Silent before the start sample. The voice finishes at its stop sample.
    #[inline]
    pub fn render(&mut self, now: u64) -> f32 {
        if self.finished || now < self.start_sample {
            return 0.0;
        }
        if now >= self.stop_sample {
            self.finished = true;
            return 0.0;
        }

        let elapsed = (now - self.start_sample) as f64 / self.sample_rate;
        let mut sample = match &mut self.source {
            VoiceSource::Tone {
                oscillator,
                frequency,
            } => {
                oscillator.set_frequency(frequency.value_at(elapsed));
                oscillator.next_sample()
            }
            VoiceSource::Noise { buffer, position } => {
                let value = buffer.sample(*position);
                *position += 1;
                value
            }
        };

        for filter in self.filters.iter_mut().flatten() {
            sample = filter.process(sample);
        }

        sample * self.gain.value_at(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentId;
    use crate::synth::envelope::DECAY_FLOOR;

    const SAMPLE_RATE: f32 = 48000.0;

    fn sine_layer(start: f64, stop: f64) -> LayerSpec {
        LayerSpec::tone(
            WaveformType::Sine,
            Ramp::constant(1000.0),
            Ramp::constant(1.0),
            start,
            stop,
        )
    }

    #[test]
    fn test_with_filter_fills_slots_in_order() {
        let layer = sine_layer(0.0, 1.0)
            .with_filter(FilterParams::high_pass(3000.0))
            .with_filter(FilterParams::low_pass(12000.0))
            .with_filter(FilterParams::low_pass(100.0));
        assert_eq!(layer.filters[0], Some(FilterParams::high_pass(3000.0)));
        assert_eq!(layer.filters[1], Some(FilterParams::low_pass(12000.0)));
    }

    #[test]
    fn test_voice_is_silent_before_start() {
        let mut voice = Voice::new(Bus::Click, sine_layer(0.01, 0.02), SAMPLE_RATE);
        assert_eq!(voice.start_sample(), 480);
        assert_eq!(voice.stop_sample(), 960);
        for now in 0..480 {
            assert_eq!(voice.render(now), 0.0);
        }
        assert!(!voice.is_finished());
    }

    #[test]
    fn test_voice_plays_then_finishes() {
        let mut voice = Voice::new(Bus::Click, sine_layer(0.0, 0.01), SAMPLE_RATE);
        let energy: f32 = (0..480).map(|n| voice.render(n).abs()).sum();
        assert!(energy > 100.0);
        assert_eq!(voice.render(480), 0.0);
        assert!(voice.is_finished());
    }

    #[test]
    fn test_noise_voice_reads_buffer() {
        let buffer = Arc::new(NoiseBuffer::generate(48000));
        let first = buffer.sample(0);
        let layer = LayerSpec::noise(buffer, Ramp::constant(1.0), 0.0, 0.1);
        let mut voice = Voice::new(Bus::Instrument(InstrumentId::Snare), layer, SAMPLE_RATE);
        assert_eq!(voice.render(0), first);
        assert_eq!(voice.bus(), Bus::Instrument(InstrumentId::Snare));
    }

    #[test]
    fn test_gain_envelope_applied() {
        let layer = LayerSpec::tone(
            WaveformType::Square,
            Ramp::constant(100.0),
            Ramp::decay(0.5, 0.01),
            0.0,
            0.1,
        );
        let mut voice = Voice::new(Bus::Click, layer, SAMPLE_RATE);
        assert!((voice.render(0) - 0.5).abs() < 1e-6);
        // Past the ramp the square wave is scaled by the floor
        let late = voice.render(2400).abs();
        assert!((late - DECAY_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_negative_start_clamps_to_zero() {
        let voice = Voice::new(Bus::Click, sine_layer(-1.0, 0.5), SAMPLE_RATE);
        assert_eq!(voice.start_sample(), 0);
    }
}
