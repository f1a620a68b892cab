// Renderer - Real-time mix of scheduled voices
//
// Lives on the audio thread. Each block it drains the command ring buffer, renders every
// voice sample-accurately against the audio clock, applies bus and master gains and
// finally advances the clock.
//
// ========== SACRED ZONE ==========
// No allocations, No I/O, No blocking locks in `render_*`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cpal::{FromSample, Sample};
use ringbuf::traits::Consumer;

use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::audio::parameters::{Bus, MixerParams};
use crate::audio::timing::AudioTiming;
use crate::messaging::channels::CommandConsumer;
use crate::messaging::command::AudioCommand;
use crate::synth::voice::Voice;

/// Size of the preallocated voice pool
pub const MAX_VOICES: usize = 256;

/// Master gain smoothing time constant
const MASTER_SMOOTHING_MS: f32 = 10.0;

/// Counters shared with the engine thread for diagnostics
#[derive(Clone, Debug)]
pub struct RenderStats {
    started: Arc<[AtomicU64; Bus::COUNT]>,
    dropped: Arc<AtomicU64>,
}

impl RenderStats {
    fn new() -> Self {
        Self {
            started: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Voices accepted on `bus` since the renderer was created
    pub fn voices_started(&self, bus: Bus) -> u64 {
        self.started[bus.index()].load(Ordering::Relaxed)
    }

    pub fn total_voices_started(&self) -> u64 {
        self.started.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Voices rejected because the pool was full
    pub fn voices_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct Renderer {
    timing: AudioTiming,
    commands: CommandConsumer,
    mixer: MixerParams,
    master: OnePoleSmoother,
    voices: Vec<Voice>,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(timing: AudioTiming, commands: CommandConsumer, mixer: MixerParams) -> Self {
        let master = OnePoleSmoother::new(mixer.master(), MASTER_SMOOTHING_MS, timing.sample_rate());
        Self {
            timing,
            commands,
            mixer,
            master,
            voices: Vec::with_capacity(MAX_VOICES),
            stats: RenderStats::new(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.clone()
    }

    pub fn timing(&self) -> &AudioTiming {
        &self.timing
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                AudioCommand::Play(voice) => {
                    if self.voices.len() < MAX_VOICES {
                        self.stats.started[voice.bus().index()].fetch_add(1, Ordering::Relaxed);
                        self.voices.push(voice);
                    } else {
                        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
                AudioCommand::ClearVoices => self.voices.clear(),
            }
        }
    }

    #[inline]
    fn mix_sample(&mut self, now: u64, gains: &[f32; Bus::COUNT], master_target: f32) -> f32 {
        let mut sum = 0.0;
        for voice in self.voices.iter_mut() {
            sum += voice.render(now) * gains[voice.bus().index()];
        }
        let master = self.master.process(master_target);
        soft_clip(flush_denormals_to_zero(sum * master))
    }

    fn finish_block(&mut self, frames: usize) {
        self.voices.retain(|voice| !voice.is_finished());
        self.timing.advance(frames);
    }

    /// Renders one mono block and advances the audio clock by its length
    pub fn render_mono(&mut self, output: &mut [f32]) {
        self.drain_commands();
        let start = self.timing.current_sample();
        let gains = self.mixer.bus_gains();
        let master_target = self.mixer.master();

        for (i, sample) in output.iter_mut().enumerate() {
            *sample = self.mix_sample(start + i as u64, &gains, master_target);
        }
        self.finish_block(output.len());
    }

    /// Renders into an interleaved device buffer, same signal on every channel
    pub fn render_interleaved<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        let channels = channels.max(1);
        self.drain_commands();
        let start = self.timing.current_sample();
        let gains = self.mixer.bus_gains();
        let master_target = self.mixer.master();

        let mut frames = 0;
        for (i, frame) in data.chunks_mut(channels).enumerate() {
            let sample = self.mix_sample(start + i as u64, &gains, master_target);
            write_mono_to_interleaved_frame(sample, frame);
            frames += 1;
        }
        self.finish_block(frames);
    }
}
