// Audio clock - Rendered frame counter shared with the audio thread
//
// The renderer advances the counter after each block, so the clock moves in block-sized
// jumps exactly like a hardware output clock. Every scheduled time in the crate is
// expressed in seconds on this clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sample index of a time on an audio clock, rounded to the nearest frame
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> u64 {
    (seconds.max(0.0) * sample_rate).round() as u64
}

/// Shared audio clock
#[derive(Clone, Debug)]
pub struct AudioTiming {
    /// Frames rendered so far (incremented by the audio callback)
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Frames rendered so far (read from the engine thread)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Acquire)
    }

    /// Current audio time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }

    /// Advance the clock (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}
