// Drum synthesizer - Procedural drum voices, no samples
//
// Every hit is built from oscillators, the shared noise buffer, biquad filters and
// exponential envelopes, scheduled at an exact audio clock time. Each layer stops itself
// shortly after its envelope has decayed.

use std::sync::Arc;

use crate::audio::parameters::Bus;
use crate::instrument::InstrumentId;
use crate::synth::envelope::Ramp;
use crate::synth::filter::FilterParams;
use crate::synth::kit::{DrumKit, KitParams, OPEN_HIHAT_DECAY_FACTOR};
use crate::synth::noise::{NoiseBuffer, shared_noise};
use crate::synth::oscillator::WaveformType;
use crate::synth::voice::{LayerSpec, VoiceSink};

/// Time a layer keeps running after its envelope reached the floor (seconds)
const TAIL: f64 = 0.1;

/// Length of the attack transients of kick and toms (seconds)
const TRANSIENT_DECAY: f64 = 0.02;
const TRANSIENT_STOP: f64 = 0.03;

/// Lowest frequency of the kick sweep
const KICK_SWEEP_END: f32 = 30.0;

/// Second snare body oscillator, relative to the first
const SNARE_DETUNE_RATIO: f32 = 1.89;
const SNARE_BODY_DECAY: f64 = 0.1;

const RIDE_PARTIALS: [f32; 4] = [300.0, 450.0, 600.0, 800.0];
const CRASH_PARTIALS: [f32; 3] = [400.0, 600.0, 900.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TomPitch {
    High,
    Mid,
    Low,
}

impl TomPitch {
    fn base_frequency(&self) -> f32 {
        match self {
            TomPitch::High => 200.0,
            TomPitch::Mid => 150.0,
            TomPitch::Low => 100.0,
        }
    }
}

/// Drum voice synthesizer
///
/// Stateless apart from the selected kit and a handle on the shared noise buffer.
#[derive(Debug, Clone)]
pub struct DrumSynth {
    kit: DrumKit,
    noise: Arc<NoiseBuffer>,
}

impl DrumSynth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            kit: DrumKit::default(),
            noise: shared_noise(sample_rate),
        }
    }

    pub fn kit(&self) -> DrumKit {
        self.kit
    }

    pub fn set_kit(&mut self, kit: DrumKit) {
        self.kit = kit;
    }

    /// Follows a sample rate change of the output
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.noise.sample_rate() != sample_rate {
            self.noise = shared_noise(sample_rate);
        }
    }

    fn params(&self) -> &'static KitParams {
        self.kit.params()
    }

    /// Schedules one hit of `instrument` at `time` (audio clock seconds)
    ///
    /// # Arguments
    /// * `instrument` - Voice to play
    /// * `time` - Start time, now or in the future
    /// * `velocity` - Peak amplitude in [0, 1], accents already resolved
    /// * `sink` - Receives the layers, routed to the instrument's bus
    pub fn trigger<S: VoiceSink + ?Sized>(
        &self,
        instrument: InstrumentId,
        time: f64,
        velocity: f32,
        sink: &mut S,
    ) {
        let velocity = velocity.clamp(0.0, 1.0);
        let bus = Bus::Instrument(instrument);
        match instrument {
            InstrumentId::Kick => self.kick(time, velocity, bus, sink),
            InstrumentId::Snare => self.snare(time, velocity, bus, sink),
            InstrumentId::HihatClosed => self.hihat(time, velocity, false, bus, sink),
            InstrumentId::HihatOpen => self.hihat(time, velocity, true, bus, sink),
            InstrumentId::Ride => self.ride(time, velocity, bus, sink),
            InstrumentId::Crash => self.crash(time, velocity, bus, sink),
            InstrumentId::TomHigh => self.tom(time, velocity, TomPitch::High, bus, sink),
            InstrumentId::TomMid => self.tom(time, velocity, TomPitch::Mid, bus, sink),
            InstrumentId::TomLow => self.tom(time, velocity, TomPitch::Low, bus, sink),
        }
    }

    /// Pitch-swept sine body plus a triangle attack click
    fn kick<S: VoiceSink + ?Sized>(&self, t: f64, velocity: f32, bus: Bus, sink: &mut S) {
        let p = self.params().kick;
        let decay = p.decay as f64;

        sink.schedule(
            bus,
            LayerSpec::tone(
                WaveformType::Sine,
                Ramp::exponential(p.pitch, KICK_SWEEP_END, decay),
                Ramp::decay(velocity, decay),
                t,
                t + decay + TAIL,
            ),
        );
        sink.schedule(
            bus,
            LayerSpec::tone(
                WaveformType::Triangle,
                Ramp::exponential(p.pitch * 3.0, KICK_SWEEP_END, TRANSIENT_DECAY),
                Ramp::decay(velocity * p.click, TRANSIENT_DECAY),
                t,
                t + TRANSIENT_STOP,
            ),
        );
    }

    /// Two detuned triangles for the body, high-passed noise for the wires
    fn snare<S: VoiceSink + ?Sized>(&self, t: f64, velocity: f32, bus: Bus, sink: &mut S) {
        let p = self.params().snare;
        let decay = p.decay as f64;

        for frequency in [p.pitch, p.pitch * SNARE_DETUNE_RATIO] {
            sink.schedule(
                bus,
                LayerSpec::tone(
                    WaveformType::Triangle,
                    Ramp::constant(frequency),
                    Ramp::decay(velocity * 0.5, SNARE_BODY_DECAY),
                    t,
                    t + SNARE_BODY_DECAY,
                ),
            );
        }
        sink.schedule(
            bus,
            LayerSpec::noise(
                Arc::clone(&self.noise),
                Ramp::decay(velocity * p.noise, decay),
                t,
                t + decay + TAIL,
            )
            .with_filter(FilterParams::high_pass(1000.0)),
        );
    }

    fn hihat<S: VoiceSink + ?Sized>(
        &self,
        t: f64,
        velocity: f32,
        open: bool,
        bus: Bus,
        sink: &mut S,
    ) {
        let p = self.params().hihat;
        let decay = if open {
            (p.decay * OPEN_HIHAT_DECAY_FACTOR) as f64
        } else {
            p.decay as f64
        };

        sink.schedule(
            bus,
            LayerSpec::noise(
                Arc::clone(&self.noise),
                Ramp::decay(velocity * 0.3, decay),
                t,
                t + decay + TAIL,
            )
            .with_filter(FilterParams::high_pass(5000.0))
            .with_filter(FilterParams::band_pass(10000.0, 1.0)),
        );
    }

    /// Four sine partials with staggered decays over a band-passed shimmer
    fn ride<S: VoiceSink + ?Sized>(&self, t: f64, velocity: f32, bus: Bus, sink: &mut S) {
        let p = self.params().ride;
        let decay = p.decay as f64;

        for (i, partial) in RIDE_PARTIALS.iter().enumerate() {
            let level = velocity * 0.15 * (1.0 - i as f32 * 0.2);
            let partial_decay = decay * (1.0 - i as f64 * 0.15);
            sink.schedule(
                bus,
                LayerSpec::tone(
                    WaveformType::Sine,
                    Ramp::constant(partial * p.pitch),
                    Ramp::decay(level, partial_decay),
                    t,
                    t + decay + TAIL,
                ),
            );
        }
        sink.schedule(
            bus,
            LayerSpec::noise(
                Arc::clone(&self.noise),
                Ramp::decay(velocity * 0.08, decay * 0.5),
                t,
                t + decay + TAIL,
            )
            .with_filter(FilterParams::band_pass(8000.0, 2.0)),
        );
    }

    /// Wide-band noise wash with three quiet tonal partials
    fn crash<S: VoiceSink + ?Sized>(&self, t: f64, velocity: f32, bus: Bus, sink: &mut S) {
        let p = self.params().crash;
        let decay = p.decay as f64;

        sink.schedule(
            bus,
            LayerSpec::noise(
                Arc::clone(&self.noise),
                Ramp::decay(velocity * 0.6, decay),
                t,
                t + decay + TAIL,
            )
            .with_filter(FilterParams::high_pass(3000.0))
            .with_filter(FilterParams::low_pass(12000.0)),
        );
        for partial in CRASH_PARTIALS {
            sink.schedule(
                bus,
                LayerSpec::tone(
                    WaveformType::Sine,
                    Ramp::constant(partial * p.pitch),
                    Ramp::decay(velocity * 0.1, decay * 0.7),
                    t,
                    t + decay + TAIL,
                ),
            );
        }
    }

    /// Sine body dropping from 1.5x to its pitch, plus a triangle attack
    fn tom<S: VoiceSink + ?Sized>(
        &self,
        t: f64,
        velocity: f32,
        tom: TomPitch,
        bus: Bus,
        sink: &mut S,
    ) {
        let p = self.params().tom;
        let decay = p.decay as f64;
        let pitch = tom.base_frequency() * p.pitch;

        sink.schedule(
            bus,
            LayerSpec::tone(
                WaveformType::Sine,
                Ramp::exponential(pitch * 1.5, pitch, 0.05),
                Ramp::decay(velocity * 0.7, decay),
                t,
                t + decay + TAIL,
            ),
        );
        sink.schedule(
            bus,
            LayerSpec::tone(
                WaveformType::Triangle,
                Ramp::constant(pitch * 2.0),
                Ramp::decay(velocity * 0.3, TRANSIENT_DECAY),
                t,
                t + TRANSIENT_STOP,
            ),
        );
    }
}
