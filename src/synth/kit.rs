// Drum kits - Synthesis constants per voice
// A kit changes pitches, decays and mixes; the recipe of every voice stays the same

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumKit {
    #[default]
    Acoustic,
    Electronic,
    Percussion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KickParams {
    /// Start frequency of the pitch sweep (Hz)
    pub pitch: f32,
    pub decay: f32,
    /// Level of the attack transient relative to velocity
    pub click: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnareParams {
    /// Body frequency (Hz)
    pub pitch: f32,
    /// Level of the noise rattle relative to velocity
    pub noise: f32,
    pub decay: f32,
}

/// Decay multiplier of an open hi-hat
pub const OPEN_HIHAT_DECAY_FACTOR: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HihatParams {
    /// Closed decay, open hats ring `OPEN_HIHAT_DECAY_FACTOR` times longer
    pub decay: f32,
}

/// Shared shape of toms and cymbals: `pitch` is a multiplier on the voice's base frequencies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonalParams {
    pub pitch: f32,
    pub decay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KitParams {
    pub kick: KickParams,
    pub snare: SnareParams,
    pub hihat: HihatParams,
    pub tom: TonalParams,
    pub ride: TonalParams,
    pub crash: TonalParams,
}

const ACOUSTIC: KitParams = KitParams {
    kick: KickParams { pitch: 150.0, decay: 0.5, click: 0.3 },
    snare: SnareParams { pitch: 185.0, noise: 0.8, decay: 0.2 },
    hihat: HihatParams { decay: 0.05 },
    tom: TonalParams { pitch: 1.0, decay: 0.3 },
    ride: TonalParams { pitch: 1.0, decay: 0.8 },
    crash: TonalParams { pitch: 1.0, decay: 1.2 },
};

const ELECTRONIC: KitParams = KitParams {
    kick: KickParams { pitch: 100.0, decay: 0.4, click: 0.5 },
    snare: SnareParams { pitch: 200.0, noise: 0.5, decay: 0.15 },
    hihat: HihatParams { decay: 0.03 },
    tom: TonalParams { pitch: 1.2, decay: 0.25 },
    ride: TonalParams { pitch: 1.3, decay: 0.6 },
    crash: TonalParams { pitch: 1.2, decay: 0.8 },
};

const PERCUSSION: KitParams = KitParams {
    kick: KickParams { pitch: 120.0, decay: 0.3, click: 0.2 },
    snare: SnareParams { pitch: 250.0, noise: 0.6, decay: 0.1 },
    hihat: HihatParams { decay: 0.04 },
    tom: TonalParams { pitch: 0.9, decay: 0.35 },
    ride: TonalParams { pitch: 0.9, decay: 0.5 },
    crash: TonalParams { pitch: 0.8, decay: 1.0 },
};

impl DrumKit {
    pub const ALL: [DrumKit; 3] = [DrumKit::Acoustic, DrumKit::Electronic, DrumKit::Percussion];

    pub fn params(&self) -> &'static KitParams {
        match self {
            DrumKit::Acoustic => &ACOUSTIC,
            DrumKit::Electronic => &ELECTRONIC,
            DrumKit::Percussion => &PERCUSSION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrumKit::Acoustic => "acoustic",
            DrumKit::Electronic => "electronic",
            DrumKit::Percussion => "percussion",
        }
    }
}

impl fmt::Display for DrumKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrumKit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrumKit::ALL
            .into_iter()
            .find(|kit| kit.as_str() == s)
            .ok_or_else(|| format!("Unknown drum kit: {}", s))
    }
}
