// Audio Export - Offline rendering to WAV files
//
// Runs the real engine against an offline output as fast as possible: the same
// scheduler, synthesis and renderer as live playback, with the audio clock advanced by
// the export loop instead of the sound card.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use hound::{WavSpec, WavWriter};
use log::info;
use thiserror::Error;

use crate::audio::format_conversion::f32_to_i16;
use crate::audio::output::OfflineOutput;
use crate::config::{ConfigError, SessionConfig};
use crate::engine::{Engine, EngineError};
use crate::practice::PracticeSession;
use crate::sequencer::timeline::Tempo;

/// Frames rendered between two lookahead polls
const EXPORT_BLOCK_FRAMES: usize = 256;

/// Steps due this close to the musical end belong to the next loop (seconds)
const END_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Length of the exported loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportDuration {
    /// Whole measures at the session's starting tempo
    Measures(u32),
    Seconds(f64),
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub sample_rate: u32,
    pub duration: ExportDuration,
    /// Extra time rendered after the last step so decays can ring out
    pub tail_seconds: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            duration: ExportDuration::Measures(4),
            tail_seconds: 1.0,
        }
    }
}

/// Progress callback for export (reports 0.0 to 1.0)
pub type ProgressCallback = Box<dyn FnMut(f32)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames: u64,
    pub peak: f32,
}

impl ExportSummary {
    pub fn duration_seconds(&self, sample_rate: u32) -> f64 {
        self.frames as f64 / sample_rate as f64
    }
}

/// Seconds covered by `duration` for a session
pub fn musical_length_seconds(config: &SessionConfig, duration: ExportDuration) -> f64 {
    match duration {
        ExportDuration::Measures(measures) => {
            let tempo = Tempo::new(start_tempo(config));
            measures as f64
                * config.time_signature.steps_per_measure() as f64
                * tempo.step_duration_seconds()
        }
        ExportDuration::Seconds(seconds) => seconds.max(0.0),
    }
}

fn start_tempo(config: &SessionConfig) -> f64 {
    let progressive = config.practice.progressive.normalized();
    if progressive.enabled {
        progressive.start_tempo
    } else {
        config.tempo
    }
}

pub struct AudioExporter {
    settings: ExportSettings,
}

impl AudioExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Renders `config` into a 16-bit mono WAV file at `path`
    pub fn export(
        &self,
        config: &SessionConfig,
        path: impl AsRef<Path>,
        mut progress_callback: Option<ProgressCallback>,
    ) -> Result<ExportSummary, ExportError> {
        let sample_rate = self.settings.sample_rate;
        let music_seconds = musical_length_seconds(config, self.settings.duration);
        let music_frames = (music_seconds * sample_rate as f64) as u64;
        // Step 0 of the next loop falls on the end itself
        let music_end = music_seconds - END_TOLERANCE;
        let tail_frames = (self.settings.tail_seconds.max(0.0) * sample_rate as f64) as u64;
        let total_frames = music_frames + tail_frames;

        info!(
            "Exporting {:.2}s ({} frames) at {} Hz to {}",
            total_frames as f64 / sample_rate as f64,
            total_frames,
            sample_rate,
            path.as_ref().display()
        );

        let output = OfflineOutput::new(sample_rate);
        let handle = output.handle();
        let mut engine = Engine::new(output);
        engine.apply_config(config);
        engine.init()?;

        let measures = Rc::new(RefCell::new(Vec::new()));
        let measure_sink = Rc::clone(&measures);
        engine.on_measure(move |measure, _| measure_sink.borrow_mut().push(measure));

        let mut practice = PracticeSession::new(config.practice);
        engine.apply_practice_update(practice.on_start());

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path.as_ref(), spec)?;

        let mut block = vec![0.0f32; EXPORT_BLOCK_FRAMES];
        let mut rendered: u64 = 0;
        let mut peak = 0.0f32;
        let progress_interval = sample_rate as u64;
        let mut next_progress = progress_interval;

        engine.start();
        while rendered < total_frames {
            if rendered >= music_frames && engine.is_playing() {
                engine.stop();
            }

            engine.poll_scheduler_until(music_end);
            for _ in measures.borrow_mut().drain(..) {
                let update = practice.on_measure(engine.tempo());
                engine.apply_practice_update(update);
            }

            let frames = EXPORT_BLOCK_FRAMES.min((total_frames - rendered) as usize);
            let chunk = &mut block[..frames];
            handle.render_into(chunk);
            for &sample in chunk.iter() {
                peak = peak.max(sample.abs());
                writer.write_sample(f32_to_i16(sample))?;
            }
            rendered += frames as u64;

            if rendered >= next_progress {
                next_progress += progress_interval;
                if let Some(callback) = progress_callback.as_mut() {
                    callback(rendered as f32 / total_frames as f32);
                }
            }
        }

        engine.dispose();
        writer.finalize()?;

        if let Some(callback) = progress_callback.as_mut() {
            callback(1.0);
        }
        info!("Export complete, peak {:.3}", peak);

        Ok(ExportSummary {
            frames: rendered,
            peak,
        })
    }
}

/// Renders a session to a WAV file with the given settings
pub fn render_to_wav(
    config: &SessionConfig,
    path: impl AsRef<Path>,
    settings: ExportSettings,
) -> Result<ExportSummary, ExportError> {
    AudioExporter::new(settings).export(config, path, None)
}

/// Loads a session file and renders it
pub fn render_file_to_wav(
    session_path: impl AsRef<Path>,
    wav_path: impl AsRef<Path>,
    settings: ExportSettings,
) -> Result<ExportSummary, ExportError> {
    let config = SessionConfig::from_path(session_path)?;
    render_to_wav(&config, wav_path, settings)
}
