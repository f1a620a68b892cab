// Drum Trainer - Library exports for tests and benchmarks

pub mod audio;
pub mod config;
pub mod engine;
pub mod instrument;
pub mod messaging;
pub mod practice;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::export::{ExportDuration, ExportError, ExportSettings, render_to_wav};
pub use audio::output::{AudioOutput, ContextState, CpalOutput, OfflineHandle, OfflineOutput};
pub use audio::timing::AudioTiming;
pub use config::{ConfigError, SessionConfig};
pub use engine::{Engine, EngineError, EngineState};
pub use instrument::{InstrumentId, InstrumentSettings};
pub use messaging::subscription::SubscriptionId;
pub use practice::{PracticeSession, PracticeSettings, PracticeUpdate};
pub use sequencer::{
    ClickSound, MeasureEvent, Position, Scheduler, SchedulerEvent, Step, StepEvent, StepPattern,
    Tempo, TimeSignature,
};
pub use synth::kit::DrumKit;
