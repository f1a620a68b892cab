// Format conversion for device streams and WAV export
//
// The renderer works in mono f32. Device buffers may be f32, i16 or u16 and have any
// channel count; WAV export writes 16-bit integers.

use cpal::{FromSample, Sample};

/// Convert f32 sample to i16
///
/// Maps [-1.0, 1.0] to [i16::MIN, i16::MAX], clamping out of range input
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Writes a mono sample to every channel of one interleaved frame
///
/// # Arguments
/// * `internal_sample` - The mono f32 sample to write
/// * `output_frame` - One audio frame (e.g., [L, R] for stereo)
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}
