// Instruments - The nine drum voices and their mixer settings

pub mod mix;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use mix::{InstrumentSettings, MixState, effective_gain};

/// Drum voice identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstrumentId {
    Kick,
    Snare,
    HihatClosed,
    HihatOpen,
    Ride,
    Crash,
    TomHigh,
    TomMid,
    TomLow,
}

impl InstrumentId {
    pub const COUNT: usize = 9;

    /// Every instrument, in trigger order
    pub const ALL: [InstrumentId; Self::COUNT] = [
        InstrumentId::Kick,
        InstrumentId::Snare,
        InstrumentId::HihatClosed,
        InstrumentId::HihatOpen,
        InstrumentId::Ride,
        InstrumentId::Crash,
        InstrumentId::TomHigh,
        InstrumentId::TomMid,
        InstrumentId::TomLow,
    ];

    /// Dense index in `0..COUNT`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentId::Kick => "kick",
            InstrumentId::Snare => "snare",
            InstrumentId::HihatClosed => "hihat-closed",
            InstrumentId::HihatOpen => "hihat-open",
            InstrumentId::Ride => "ride",
            InstrumentId::Crash => "crash",
            InstrumentId::TomHigh => "tom-high",
            InstrumentId::TomMid => "tom-mid",
            InstrumentId::TomLow => "tom-low",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstrumentId::Kick => "Kick",
            InstrumentId::Snare => "Snare",
            InstrumentId::HihatClosed => "Hi-Hat Closed",
            InstrumentId::HihatOpen => "Hi-Hat Open",
            InstrumentId::Ride => "Ride",
            InstrumentId::Crash => "Crash",
            InstrumentId::TomHigh => "Tom High",
            InstrumentId::TomMid => "Tom Mid",
            InstrumentId::TomLow => "Tom Low",
        }
    }

    /// Label used in compact grid views
    pub fn short_name(&self) -> &'static str {
        match self {
            InstrumentId::Kick => "K",
            InstrumentId::Snare => "S",
            InstrumentId::HihatClosed => "HH",
            InstrumentId::HihatOpen => "OH",
            InstrumentId::Ride => "R",
            InstrumentId::Crash => "C",
            InstrumentId::TomHigh => "T1",
            InstrumentId::TomMid => "T2",
            InstrumentId::TomLow => "T3",
        }
    }

    /// Mixer settings of a fresh session
    pub fn default_settings(&self) -> InstrumentSettings {
        let (volume, pan) = match self {
            InstrumentId::Kick => (0.8, 0.0),
            InstrumentId::Snare => (0.8, 0.0),
            InstrumentId::HihatClosed => (0.6, 0.2),
            InstrumentId::HihatOpen => (0.5, 0.2),
            InstrumentId::Ride => (0.5, 0.3),
            InstrumentId::Crash => (0.6, -0.3),
            InstrumentId::TomHigh => (0.7, -0.2),
            InstrumentId::TomMid => (0.7, 0.0),
            InstrumentId::TomLow => (0.7, 0.2),
        };
        InstrumentSettings::new(volume, false, pan)
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstrumentId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown instrument: {}", s))
    }
}
