// Cutout - Alternating play/mute phases for internal-time practice

use serde::{Deserialize, Serialize};

pub const MIN_PHASE_MEASURES: u32 = 1;
pub const MAX_PHASE_MEASURES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CutoutSettings {
    pub enabled: bool,
    /// Measures played before the drums drop out
    pub play_measures: u32,
    /// Measures of silence before the drums return
    pub mute_measures: u32,
}

impl CutoutSettings {
    /// Same settings with phase lengths clamped to 1..=8
    pub fn normalized(self) -> Self {
        Self {
            play_measures: self.play_measures.clamp(MIN_PHASE_MEASURES, MAX_PHASE_MEASURES),
            mute_measures: self.mute_measures.clamp(MIN_PHASE_MEASURES, MAX_PHASE_MEASURES),
            ..self
        }
    }
}

impl Default for CutoutSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            play_measures: 2,
            mute_measures: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoutPhase {
    #[default]
    Play,
    Mute,
}

impl CutoutPhase {
    pub fn is_muted(&self) -> bool {
        matches!(self, CutoutPhase::Mute)
    }
}

#[derive(Debug, Clone)]
pub struct Cutout {
    settings: CutoutSettings,
    phase: CutoutPhase,
    measure_count: u32,
}

impl Cutout {
    pub fn new(settings: CutoutSettings) -> Self {
        Self {
            settings: settings.normalized(),
            phase: CutoutPhase::Play,
            measure_count: 0,
        }
    }

    pub fn settings(&self) -> CutoutSettings {
        self.settings
    }

    pub fn phase(&self) -> CutoutPhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Back to the start of the play phase
    pub fn reset(&mut self) {
        self.phase = CutoutPhase::Play;
        self.measure_count = 0;
    }

    /// Counts one measure. Returns true when the phase flipped.
    pub fn advance(&mut self) -> bool {
        if !self.settings.enabled {
            return false;
        }

        self.measure_count += 1;
        let target = match self.phase {
            CutoutPhase::Play => self.settings.play_measures,
            CutoutPhase::Mute => self.settings.mute_measures,
        };

        if self.measure_count >= target {
            self.phase = match self.phase {
                CutoutPhase::Play => CutoutPhase::Mute,
                CutoutPhase::Mute => CutoutPhase::Play,
            };
            self.measure_count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(play: u32, mute: u32) -> Cutout {
        Cutout::new(CutoutSettings {
            enabled: true,
            play_measures: play,
            mute_measures: mute,
        })
    }

    #[test]
    fn test_phase_cycle() {
        let mut cutout = enabled(2, 1);
        assert!(!cutout.advance());
        assert_eq!(cutout.phase(), CutoutPhase::Play);
        assert!(cutout.advance());
        assert_eq!(cutout.phase(), CutoutPhase::Mute);
        assert!(cutout.advance());
        assert_eq!(cutout.phase(), CutoutPhase::Play);
    }

    #[test]
    fn test_disabled_never_flips() {
        let mut cutout = Cutout::new(CutoutSettings::default());
        for _ in 0..10 {
            assert!(!cutout.advance());
        }
        assert_eq!(cutout.phase(), CutoutPhase::Play);
    }

    #[test]
    fn test_settings_are_clamped() {
        let cutout = enabled(0, 20);
        assert_eq!(cutout.settings().play_measures, 1);
        assert_eq!(cutout.settings().mute_measures, 8);
    }

    #[test]
    fn test_reset() {
        let mut cutout = enabled(1, 4);
        cutout.advance();
        assert!(cutout.phase().is_muted());
        cutout.reset();
        assert_eq!(cutout.phase(), CutoutPhase::Play);
    }
}
