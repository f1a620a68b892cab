// Session configuration - JSON description of a practice session
//
// Everything is optional: missing fields take the engine defaults. Instrument keys are
// plain strings so that a file written for another kit layout still loads; unknown ids
// are skipped with a warning.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::{InstrumentId, InstrumentSettings};
use crate::practice::PracticeSettings;
use crate::sequencer::metronome::ClickSound;
use crate::sequencer::pattern::{Step, StepPattern};
use crate::sequencer::timeline::TimeSignature;
use crate::synth::kit::DrumKit;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub enabled: bool,
    pub volume: f32,
    pub click_sound: ClickSound,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            volume: 0.5,
            click_sound: ClickSound::Beep,
        }
    }
}

/// A pattern written either as a grid string or as a list of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    Grid(String),
    Steps(Vec<Step>),
}

impl PatternSource {
    pub fn to_pattern(&self) -> Option<StepPattern> {
        match self {
            PatternSource::Grid(grid) => StepPattern::from_grid(grid),
            PatternSource::Steps(steps) => Some(StepPattern::new(steps.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tempo: f64,
    pub time_signature: TimeSignature,
    pub swing: i32,
    pub measures: u32,
    pub kit: DrumKit,
    pub muted: bool,
    pub master_volume: f32,
    pub metronome: MetronomeConfig,
    pub instruments: BTreeMap<String, InstrumentSettings>,
    pub soloed: Option<String>,
    pub patterns: BTreeMap<String, PatternSource>,
    pub practice: PracticeSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            time_signature: TimeSignature::FourFour,
            swing: 50,
            measures: 1,
            kit: DrumKit::Acoustic,
            muted: false,
            master_volume: 1.0,
            metronome: MetronomeConfig::default(),
            instruments: BTreeMap::new(),
            soloed: None,
            patterns: BTreeMap::new(),
            practice: PracticeSettings::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Kick, snare and eighth-note hi-hat over one 4/4 measure
    pub fn basic_rock() -> Self {
        let patterns = [
            ("kick", "X-------x-x-----"),
            ("snare", "----x-------x---"),
            ("hihat-closed", "x-x-x-x-x-x-x-x-"),
        ];
        Self {
            patterns: patterns
                .into_iter()
                .map(|(id, grid)| (id.to_string(), PatternSource::Grid(grid.to_string())))
                .collect(),
            ..Self::default()
        }
    }

    /// Patterns keyed by instrument, skipping unknown ids and malformed grids
    pub fn patterns(&self) -> HashMap<InstrumentId, StepPattern> {
        let mut patterns = HashMap::new();
        for (key, source) in &self.patterns {
            let Some(id) = parse_instrument(key) else {
                continue;
            };
            match source.to_pattern() {
                Some(pattern) => {
                    patterns.insert(id, pattern);
                }
                None => warn!("Invalid pattern grid for {}, ignoring", key),
            }
        }
        patterns
    }

    pub fn instrument_settings(&self) -> HashMap<InstrumentId, InstrumentSettings> {
        self.instruments
            .iter()
            .filter_map(|(key, settings)| parse_instrument(key).map(|id| (id, *settings)))
            .collect()
    }

    pub fn soloed_instrument(&self) -> Option<InstrumentId> {
        self.soloed.as_deref().and_then(parse_instrument)
    }
}

fn parse_instrument(key: &str) -> Option<InstrumentId> {
    match InstrumentId::from_str(key) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("{}, skipping", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = SessionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_full_session() {
        let json = r#"{
            "tempo": 96,
            "time_signature": "6/8",
            "swing": 62,
            "measures": 2,
            "kit": "electronic",
            "metronome": { "enabled": true, "volume": 0.3, "click_sound": "wood" },
            "instruments": { "snare": { "volume": 0.4, "muted": true } },
            "soloed": "kick",
            "patterns": {
                "kick": "X-----x-----",
                "snare": [{ "active": true, "velocity": 0.3, "accent": true }]
            },
            "practice": { "cutout": { "enabled": true, "play_measures": 3 } }
        }"#;
        let config = SessionConfig::from_json_str(json).unwrap();

        assert_eq!(config.tempo, 96.0);
        assert_eq!(config.time_signature, TimeSignature::SixEight);
        assert_eq!(config.kit, DrumKit::Electronic);
        assert_eq!(config.metronome.click_sound, ClickSound::Wood);
        assert_eq!(config.soloed_instrument(), Some(InstrumentId::Kick));
        assert!(config.practice.cutout.enabled);
        assert_eq!(config.practice.cutout.play_measures, 3);
        assert_eq!(config.practice.cutout.mute_measures, 1);

        let settings = config.instrument_settings();
        assert_eq!(settings[&InstrumentId::Snare].volume(), 0.4);
        assert!(settings[&InstrumentId::Snare].muted);

        let patterns = config.patterns();
        assert_eq!(patterns[&InstrumentId::Kick].len(), 12);
        let snare = &patterns[&InstrumentId::Snare];
        assert_eq!(snare.len(), 1);
        assert_eq!(snare.steps()[0].effective_velocity(), 1.0);
    }

    #[test]
    fn test_unknown_instruments_are_skipped() {
        let json = r#"{
            "instruments": { "cowbell": { "volume": 1.0 } },
            "patterns": { "cowbell": "x---", "kick": "x---" },
            "soloed": "cowbell"
        }"#;
        let config = SessionConfig::from_json_str(json).unwrap();
        assert!(config.instrument_settings().is_empty());
        assert_eq!(config.patterns().len(), 1);
        assert_eq!(config.soloed_instrument(), None);
    }

    #[test]
    fn test_malformed_grid_is_skipped() {
        let json = r#"{ "patterns": { "kick": "x?x?" } }"#;
        let config = SessionConfig::from_json_str(json).unwrap();
        assert!(config.patterns().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = SessionConfig::from_json_str("{ tempo: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "tempo": 140 }}"#).unwrap();
        let config = SessionConfig::from_path(file.path()).unwrap();
        assert_eq!(config.tempo, 140.0);

        let missing = SessionConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_basic_rock_round_trips_through_json() {
        let config = SessionConfig::basic_rock();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(SessionConfig::from_json_str(&json).unwrap(), config);
        assert_eq!(config.patterns().len(), 3);
    }
}
