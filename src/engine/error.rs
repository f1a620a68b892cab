// Erreurs du moteur

use thiserror::Error;

/// Errors raised while bringing up or driving the audio output
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Cannot read output configuration: {0}")]
    OutputConfig(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("Error in stream creation: {0}")]
    BuildStream(String),

    #[error("Cannot start audio stream: {0}")]
    PlayStream(String),

    #[error("Engine has been disposed")]
    Disposed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::BuildStream("device busy".to_string());
        assert_eq!(err.to_string(), "Error in stream creation: device busy");
        assert_eq!(EngineError::Disposed.to_string(), "Engine has been disposed");
    }
}
