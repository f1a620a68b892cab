// DSP utilities - Output hygiene for the real-time mix
//
// Applied once per output sample at the end of the render path.

/// Flush denormals to zero
///
/// Decaying envelopes and filter tails produce very small values that are slow on
/// some CPUs. Anything below 1e-15 is treated as silence.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Keeps the summed drum buses inside [-1, 1] when several loud hits overlap.
/// Nearly linear around zero.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// One-pole smoother for gain changes
///
/// y[n] = y[n-1] + a * (x[n] - y[n-1])
#[derive(Debug, Clone)]
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// # Arguments
    /// * `initial_value` - Starting value
    /// * `time_constant_ms` - Time to cover ~63% of a step change
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = (time_constant_ms * 0.001 * sample_rate).max(1.0);
        Self {
            current: initial_value,
            coefficient: (1.0 / time_constant_samples).min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }
}
