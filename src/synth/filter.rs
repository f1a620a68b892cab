// Filter - Biquad (RBJ cookbook)
//
// Second-order IIR sections for the drum voices. Noise bursts go through high-pass,
// band-pass and low-pass stages well above 8 kHz (hi-hats, crash), so the filter must
// stay stable up to Nyquist.
//
// Reference: Robert Bristow-Johnson, "Cookbook formulae for audio EQ biquad filter
// coefficients"

use std::f32::consts::PI;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (constant 0 dB peak gain)
    BandPass,
}

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff (or center) frequency in Hz
    pub cutoff: f32,
    /// Q factor
    pub resonance: f32,
    pub filter_type: FilterType,
}

impl FilterParams {
    /// Butterworth Q for low/high-pass stages
    pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

    pub fn low_pass(cutoff: f32) -> Self {
        Self {
            cutoff,
            resonance: Self::BUTTERWORTH_Q,
            filter_type: FilterType::LowPass,
        }
    }

    pub fn high_pass(cutoff: f32) -> Self {
        Self {
            cutoff,
            resonance: Self::BUTTERWORTH_Q,
            filter_type: FilterType::HighPass,
        }
    }

    pub fn band_pass(center: f32, q: f32) -> Self {
        Self {
            cutoff: center,
            resonance: q,
            filter_type: FilterType::BandPass,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::low_pass(1000.0)
    }
}

/// Biquad filter in transposed direct form II
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    params: FilterParams,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl BiquadFilter {
    /// Create a filter with coefficients computed for `sample_rate`
    ///
    /// # Arguments
    /// * `params` - Filter type, cutoff and Q
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(params: FilterParams, sample_rate: f32) -> Self {
        let mut filter = Self {
            params,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.update_coefficients(sample_rate);
        filter
    }

    fn update_coefficients(&mut self, sample_rate: f32) {
        // Keep the cutoff strictly below Nyquist
        let cutoff = self.params.cutoff.clamp(10.0, sample_rate * 0.49);
        let q = self.params.resonance.max(0.01);

        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2) = match self.params.filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Process one sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Peak output amplitude for a sine input, after the filter settled
    fn response(params: FilterParams, frequency: f32) -> f32 {
        let mut filter = BiquadFilter::new(params, SAMPLE_RATE);
        let mut peak: f32 = 0.0;
        for i in 0..9600 {
            let input = (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin();
            let output = filter.process(input);
            if i > 4800 {
                peak = peak.max(output.abs());
            }
        }
        peak
    }

    #[test]
    fn test_low_pass_attenuates_highs() {
        let params = FilterParams::low_pass(1000.0);
        assert!(response(params, 100.0) > 0.9);
        assert!(response(params, 10000.0) < 0.05);
    }

    #[test]
    fn test_high_pass_attenuates_lows() {
        let params = FilterParams::high_pass(5000.0);
        assert!(response(params, 200.0) < 0.01);
        assert!(response(params, 15000.0) > 0.8);
    }

    #[test]
    fn test_band_pass_peaks_at_center() {
        let params = FilterParams::band_pass(2500.0, 15.0);
        let center = response(params, 2500.0);
        assert!((center - 1.0).abs() < 0.05, "center gain {}", center);
        assert!(response(params, 500.0) < 0.1);
    }

    #[test]
    fn test_stable_near_nyquist() {
        let params = FilterParams::band_pass(10000.0, 1.0);
        let mut filter = BiquadFilter::new(params, 22050.0);
        for i in 0..10000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!(filter.process(x).is_finite());
        }
    }
}
