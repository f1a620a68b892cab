// Envelope - Exponential parameter ramps
//
// Drum hits are shaped by a single exponential segment: a value set at the hit time that
// ramps exponentially toward a target and then holds it. The same curve drives gain
// envelopes and pitch sweeps.

/// Floor used as the end of every decay (-60 dB)
pub const DECAY_FLOOR: f32 = 0.001;

/// Exponential ramp from `start` to `end` over `duration` seconds
///
/// v(t) = start * (end / start)^(t / duration), holding `end` once `t >= duration`.
/// A ramp that starts at (or below) zero cannot move exponentially and stays silent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f32,
    pub end: f32,
    pub duration: f64,
}

impl Ramp {
    /// Fixed value
    pub fn constant(value: f32) -> Self {
        Self {
            start: value,
            end: value,
            duration: 0.0,
        }
    }

    pub fn exponential(start: f32, end: f32, duration: f64) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }

    /// Decay from `peak` down to `DECAY_FLOOR` over `duration` seconds
    pub fn decay(peak: f32, duration: f64) -> Self {
        Self::exponential(peak, DECAY_FLOOR, duration)
    }

    /// Value `elapsed` seconds after the ramp started
    #[inline]
    pub fn value_at(&self, elapsed: f64) -> f32 {
        if self.start <= 0.0 || self.end <= 0.0 {
            return if self.start <= 0.0 { 0.0 } else { self.start };
        }
        if elapsed <= 0.0 {
            return self.start;
        }
        if elapsed >= self.duration {
            return self.end;
        }

        let progress = elapsed / self.duration;
        let ratio = (self.end / self.start) as f64;
        (self.start as f64 * ratio.powf(progress)) as f32
    }

    /// True once the ramp has reached its end value
    pub fn is_finished(&self, elapsed: f64) -> bool {
        elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_constant_ramp() {
        let ramp = Ramp::constant(0.4);
        assert_eq!(ramp.value_at(0.0), 0.4);
        assert_eq!(ramp.value_at(10.0), 0.4);
    }

    #[test]
    fn test_exponential_midpoint() {
        // Halfway through a 1 -> 0.01 ramp the value is the geometric mean
        let ramp = Ramp::exponential(1.0, 0.01, 0.2);
        assert!((ramp.value_at(0.1) - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_ramp_holds_end_value() {
        let ramp = Ramp::decay(0.8, 0.05);
        assert_eq!(ramp.value_at(0.0), 0.8);
        assert_eq!(ramp.value_at(0.05), DECAY_FLOOR);
        assert_eq!(ramp.value_at(3.0), DECAY_FLOOR);
        assert!(ramp.is_finished(0.05));
    }

    #[test]
    fn test_pitch_sweep_is_monotonic() {
        let ramp = Ramp::exponential(150.0, 30.0, 0.5);
        let mut previous = ramp.value_at(0.0);
        for i in 1..=50 {
            let value = ramp.value_at(i as f64 * 0.01);
            assert!(value < previous);
            previous = value;
        }
        assert_eq!(previous, 30.0);
    }

    #[test]
    fn test_zero_start_is_silent() {
        let ramp = Ramp::decay(0.0, 0.1);
        assert_eq!(ramp.value_at(0.0), 0.0);
        assert_eq!(ramp.value_at(0.05), 0.0);
    }
}
