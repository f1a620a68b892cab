// Timeline - Musical time representation
// Time signatures, tempo and swing, and the step durations derived from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted tempo (BPM)
pub const MIN_BPM: f64 = 40.0;
/// Highest accepted tempo (BPM)
pub const MAX_BPM: f64 = 240.0;

/// Supported time signatures
///
/// Each signature maps to a fixed `(beats_per_measure, steps_per_beat, steps_per_measure)`
/// triple. Steps are sixteenth-note equivalents, so a signature changes the step *count*
/// of a measure and never the step *duration*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeSignature {
    #[serde(rename = "3/4")]
    ThreeFour,
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "6/8")]
    SixEight,
    #[serde(rename = "5/4")]
    FiveFour,
}

impl TimeSignature {
    pub const ALL: [TimeSignature; 4] = [
        TimeSignature::ThreeFour,
        TimeSignature::FourFour,
        TimeSignature::SixEight,
        TimeSignature::FiveFour,
    ];

    /// Number of beats per measure
    pub fn beats_per_measure(&self) -> u32 {
        match self {
            TimeSignature::ThreeFour => 3,
            TimeSignature::FourFour => 4,
            TimeSignature::SixEight => 6,
            TimeSignature::FiveFour => 5,
        }
    }

    /// Number of steps in one beat (4 for quarter-note beats, 2 for eighth-note beats)
    pub fn steps_per_beat(&self) -> u32 {
        match self {
            TimeSignature::SixEight => 2,
            _ => 4,
        }
    }

    /// Number of steps in one measure
    pub fn steps_per_measure(&self) -> u32 {
        self.beats_per_measure() * self.steps_per_beat()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FourFour => "4/4",
            TimeSignature::SixEight => "6/8",
            TimeSignature::FiveFour => "5/4",
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSignature::ALL
            .into_iter()
            .find(|sig| sig.as_str() == s.trim())
            .ok_or_else(|| format!("Unsupported time signature: {}", s))
    }
}

/// Tempo in BPM (Beats Per Minute)
///
/// Always within [`MIN_BPM`, `MAX_BPM`]: out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo, clamped to the supported range
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: Self::clamp_bpm(bpm),
        }
    }

    fn clamp_bpm(bpm: f64) -> f64 {
        if bpm.is_nan() {
            return Self::default().bpm;
        }
        bpm.clamp(MIN_BPM, MAX_BPM)
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value (clamped)
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = Self::clamp_bpm(bpm);
    }

    /// Duration of one beat (quarter note) in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one unswung step (sixteenth note) in seconds
    pub fn step_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() / 4.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Swing amount in percent, 50 = straight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swing(u8);

impl Swing {
    pub const STRAIGHT: Swing = Swing(50);

    /// Creates a swing amount, clamped to [0, 100]
    pub fn new(percent: i32) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Duration of `step` once swing is applied to `base`
    ///
    /// Even steps are stretched by `swing/100 - 0.5` of the base duration and odd steps
    /// shrunk by the same amount, so every even/odd pair lasts exactly two base steps.
    pub fn apply(&self, base: f64, step: u32) -> f64 {
        if self.0 == 50 {
            return base;
        }

        let offset = self.0 as f64 / 100.0 - 0.5;
        if step % 2 == 0 {
            base * (1.0 + offset)
        } else {
            base * (1.0 - offset)
        }
    }
}

impl Default for Swing {
    fn default() -> Self {
        Self::STRAIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature_constants() {
        let expected = [
            (TimeSignature::ThreeFour, 3, 4, 12),
            (TimeSignature::FourFour, 4, 4, 16),
            (TimeSignature::SixEight, 6, 2, 12),
            (TimeSignature::FiveFour, 5, 4, 20),
        ];

        for (sig, beats, per_beat, per_measure) in expected {
            assert_eq!(sig.beats_per_measure(), beats, "{}", sig);
            assert_eq!(sig.steps_per_beat(), per_beat, "{}", sig);
            assert_eq!(sig.steps_per_measure(), per_measure, "{}", sig);
            assert_eq!(sig.steps_per_measure() % sig.steps_per_beat(), 0);
        }
    }

    #[test]
    fn test_time_signature_parse() {
        assert_eq!("6/8".parse::<TimeSignature>(), Ok(TimeSignature::SixEight));
        assert_eq!(" 5/4 ".parse::<TimeSignature>(), Ok(TimeSignature::FiveFour));
        assert!("7/8".parse::<TimeSignature>().is_err());
        assert_eq!(TimeSignature::default(), TimeSignature::FourFour);
    }

    #[test]
    fn test_time_signature_serde() {
        let json = serde_json::to_string(&TimeSignature::ThreeFour).unwrap();
        assert_eq!(json, "\"3/4\"");
        let sig: TimeSignature = serde_json::from_str("\"6/8\"").unwrap();
        assert_eq!(sig, TimeSignature::SixEight);
    }

    #[test]
    fn test_tempo_clamping() {
        assert_eq!(Tempo::new(10.0).bpm(), 40.0);
        assert_eq!(Tempo::new(500.0).bpm(), 240.0);
        assert_eq!(Tempo::new(97.5).bpm(), 97.5);

        let mut tempo = Tempo::default();
        tempo.set_bpm(f64::NAN);
        assert_eq!(tempo.bpm(), 120.0);
    }

    #[test]
    fn test_step_duration_at_120() {
        let tempo = Tempo::new(120.0);
        assert_eq!(tempo.beat_duration_seconds(), 0.5);
        assert_eq!(tempo.step_duration_seconds(), 0.125);
    }

    #[test]
    fn test_swing_straight_is_identity() {
        let swing = Swing::STRAIGHT;
        for step in 0..16 {
            assert_eq!(swing.apply(0.125, step), 0.125);
        }
    }

    #[test]
    fn test_swing_pairs_keep_total_duration() {
        for percent in [0, 25, 60, 75, 100] {
            let swing = Swing::new(percent);
            let pair = swing.apply(0.125, 0) + swing.apply(0.125, 1);
            assert!((pair - 0.25).abs() < 1e-12, "swing {}: {}", percent, pair);
        }

        let swing = Swing::new(75);
        assert!((swing.apply(0.125, 2) - 0.15625).abs() < 1e-12);
        assert!((swing.apply(0.125, 3) - 0.09375).abs() < 1e-12);
    }

    #[test]
    fn test_swing_clamping() {
        assert_eq!(Swing::new(-20).percent(), 0);
        assert_eq!(Swing::new(180).percent(), 100);
    }
}
