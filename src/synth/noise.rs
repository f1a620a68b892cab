// Noise - Shared white noise buffer for the noise-based drum layers
//
// One buffer is generated lazily for the whole process and reused by every hit.
// It is only regenerated when a different sample rate asks for it.

use rand::Rng;
use std::sync::{Arc, Mutex};

/// Length of the shared noise buffer in seconds
pub const NOISE_DURATION_SECONDS: f32 = 0.5;

/// Pre-generated white noise in [-1, 1]
#[derive(Debug)]
pub struct NoiseBuffer {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl NoiseBuffer {
    /// Generate `NOISE_DURATION_SECONDS` of white noise at `sample_rate`
    pub fn generate(sample_rate: u32) -> Self {
        let len = (sample_rate as f32 * NOISE_DURATION_SECONDS) as usize;
        let mut rng = rand::thread_rng();
        let samples = (0..len).map(|_| rng.gen_range(-1.0f32..=1.0)).collect();
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`, silence past the end of the buffer
    #[inline]
    pub fn sample(&self, index: usize) -> f32 {
        self.samples.get(index).copied().unwrap_or(0.0)
    }
}

static SHARED_NOISE: Mutex<Option<Arc<NoiseBuffer>>> = Mutex::new(None);

/// Process-wide noise buffer for `sample_rate`
///
/// Returns the cached buffer when its sample rate matches, otherwise generates and caches
/// a new one. Never called from the audio callback.
pub fn shared_noise(sample_rate: u32) -> Arc<NoiseBuffer> {
    let mut cache = match SHARED_NOISE.lock() {
        Ok(guard) => guard,
        // The cache only ever holds a finished Arc, a poisoned lock is still consistent
        Err(poisoned) => poisoned.into_inner(),
    };

    match cache.as_ref() {
        Some(buffer) if buffer.sample_rate == sample_rate => Arc::clone(buffer),
        _ => {
            log::debug!("Generating shared noise buffer at {} Hz", sample_rate);
            let buffer = Arc::new(NoiseBuffer::generate(sample_rate));
            *cache = Some(Arc::clone(&buffer));
            buffer
        }
    }
}
