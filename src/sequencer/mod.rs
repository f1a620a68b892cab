// Sequencer module
// Timeline, step patterns, lookahead scheduling and the metronome

pub mod metronome;
pub mod pattern;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use metronome::{ClickSound, ClickType, Metronome};
pub use pattern::{Step, StepPattern};
pub use scheduler::{MeasureEvent, Scheduler, SchedulerEvent, StepEvent};
pub use timeline::{Swing, Tempo, TimeSignature};
pub use transport::{Position, TransportState};
