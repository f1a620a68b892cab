// Commands - Engine → audio thread

use crate::synth::voice::Voice;

/// Message consumed by the renderer at the start of each block
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Start playing a prepared voice at its scheduled sample
    Play(Voice),
    /// Drop every voice, including the ones already scheduled
    ClearVoices,
}
