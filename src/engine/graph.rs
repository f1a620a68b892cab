// Audio graph - Engine-side end of the connection to the renderer
//
// Holds the command producer, the shared gain stages and the audio clock. Scheduling a
// layer converts it to a sample-positioned voice and hands it to the audio thread.

use log::warn;
use ringbuf::traits::Producer;

use crate::audio::parameters::{Bus, MixerParams};
use crate::audio::timing::AudioTiming;
use crate::messaging::channels::CommandProducer;
use crate::messaging::command::AudioCommand;
use crate::synth::voice::{LayerSpec, Voice, VoiceSink};

pub struct AudioGraph {
    commands: CommandProducer,
    mixer: MixerParams,
    timing: AudioTiming,
    dropped: u64,
}

impl AudioGraph {
    pub fn new(commands: CommandProducer, mixer: MixerParams, timing: AudioTiming) -> Self {
        Self {
            commands,
            mixer,
            timing,
            dropped: 0,
        }
    }

    pub fn mixer(&self) -> &MixerParams {
        &self.mixer
    }

    pub fn current_time(&self) -> f64 {
        self.timing.current_time()
    }

    pub fn sample_rate(&self) -> f32 {
        self.timing.sample_rate()
    }

    /// Layers lost because the command queue was full
    pub fn dropped_layers(&self) -> u64 {
        self.dropped
    }

    /// Asks the renderer to drop every voice, including the ones not started yet
    pub fn clear_voices(&mut self) {
        if self.commands.try_push(AudioCommand::ClearVoices).is_err() {
            warn!("Audio command queue full, voices were not cleared");
        }
    }
}

impl VoiceSink for AudioGraph {
    fn schedule(&mut self, bus: Bus, layer: LayerSpec) {
        let voice = Voice::new(bus, layer, self.timing.sample_rate());
        if self.commands.try_push(AudioCommand::Play(voice)).is_err() {
            self.dropped += 1;
            warn!("Audio command queue full, dropping layer on {:?}", bus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_command_channel;
    use crate::synth::envelope::Ramp;
    use crate::synth::oscillator::WaveformType;
    use ringbuf::traits::Consumer;

    fn layer() -> LayerSpec {
        LayerSpec::tone(
            WaveformType::Sine,
            Ramp::constant(440.0),
            Ramp::decay(1.0, 0.1),
            0.5,
            0.6,
        )
    }

    #[test]
    fn test_schedule_positions_voice() {
        let (tx, mut rx) = create_command_channel(4);
        let mut graph = AudioGraph::new(tx, MixerParams::new(), AudioTiming::new(48000.0));
        graph.schedule(Bus::Click, layer());

        match rx.try_pop() {
            Some(AudioCommand::Play(voice)) => {
                assert_eq!(voice.bus(), Bus::Click);
                assert_eq!(voice.start_sample(), 24000);
                assert_eq!(voice.stop_sample(), 28800);
            }
            other => panic!("expected a Play command, got {:?}", other),
        }
    }

    #[test]
    fn test_full_queue_drops_layer() {
        let (tx, _rx) = create_command_channel(1);
        let mut graph = AudioGraph::new(tx, MixerParams::new(), AudioTiming::new(48000.0));
        graph.schedule(Bus::Click, layer());
        graph.schedule(Bus::Click, layer());
        assert_eq!(graph.dropped_layers(), 1);
    }
}
