// Practice mode - Measure-driven automation of mute and tempo
//
// The session listens to measure events and answers with the changes the host should
// apply to the engine (see `Engine::apply_practice_update`).

pub mod cutout;
pub mod progressive;

pub use cutout::{Cutout, CutoutPhase, CutoutSettings};
pub use progressive::{ProgressiveSettings, ProgressiveTempo};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeSettings {
    pub cutout: CutoutSettings,
    pub progressive: ProgressiveSettings,
}

/// Changes requested by the practice session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PracticeUpdate {
    pub muted: Option<bool>,
    pub tempo: Option<f64>,
}

impl PracticeUpdate {
    pub fn is_empty(&self) -> bool {
        self.muted.is_none() && self.tempo.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct PracticeSession {
    cutout: Cutout,
    progressive: ProgressiveTempo,
}

impl PracticeSession {
    pub fn new(settings: PracticeSettings) -> Self {
        Self {
            cutout: Cutout::new(settings.cutout),
            progressive: ProgressiveTempo::new(settings.progressive),
        }
    }

    pub fn cutout(&self) -> &Cutout {
        &self.cutout
    }

    pub fn progressive(&self) -> &ProgressiveTempo {
        &self.progressive
    }

    /// Playback (re)started: back to the play phase and the start tempo
    pub fn on_start(&mut self) -> PracticeUpdate {
        self.cutout.reset();
        PracticeUpdate {
            muted: self.cutout.is_enabled().then_some(false),
            tempo: self.progressive.start(),
        }
    }

    /// A measure boundary was reached while playing at `current_tempo`
    pub fn on_measure(&mut self, current_tempo: f64) -> PracticeUpdate {
        let muted = if self.cutout.advance() {
            Some(self.cutout.phase().is_muted())
        } else {
            None
        };
        PracticeUpdate {
            muted,
            tempo: self.progressive.advance(current_tempo),
        }
    }
}
