// Sorties audio - Device stream (cpal) et rendu hors ligne
//
// # Format Support
//
// The cpal output picks the device's preferred sample format (F32, I16 or U16) and builds
// the matching stream. The renderer always works in f32 and converts while writing the
// interleaved device buffer.
//
// # Stream Limitations
//
// On macOS (CoreAudio) the Stream is not Send/Sync, so the output stays on the thread that
// created it. Stream errors are reported through the notification ring buffer and
// drained by the engine thread.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{debug, info, warn};
use ringbuf::traits::{Consumer, Producer};

use crate::audio::renderer::{RenderStats, Renderer};
use crate::engine::EngineError;
use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel,
};
use crate::messaging::notification::{Notification, NotificationCategory};

const NOTIFICATION_CAPACITY: usize = 64;

/// State of the audio context backing the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Built but not producing audio, the clock does not move
    Suspended = 0,
    Running = 1,
    Closed = 2,
    /// The device reported a stream error
    Interrupted = 3,
}

impl From<u8> for ContextState {
    fn from(value: u8) -> Self {
        match value {
            1 => ContextState::Running,
            2 => ContextState::Closed,
            3 => ContextState::Interrupted,
            _ => ContextState::Suspended,
        }
    }
}

/// Atomic wrapper pour partager l'état entre threads
#[derive(Clone, Debug)]
pub struct AtomicContextState {
    inner: Arc<AtomicU8>,
}

impl AtomicContextState {
    pub fn new(state: ContextState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state as u8)),
        }
    }

    pub fn get(&self) -> ContextState {
        ContextState::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, state: ContextState) {
        self.inner.store(state as u8, Ordering::Relaxed);
    }
}

impl Default for AtomicContextState {
    fn default() -> Self {
        Self::new(ContextState::Suspended)
    }
}

/// Negotiated output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Destination of the rendered mix
///
/// `configure` is called first so the engine can size its clock, then `start` hands over
/// the renderer. A started output may report `Suspended` until `resume` is called.
pub trait AudioOutput {
    fn configure(&mut self) -> Result<OutputConfig, EngineError>;

    fn start(&mut self, renderer: Renderer) -> Result<ContextState, EngineError>;

    fn resume(&mut self) -> Result<(), EngineError>;

    fn state(&self) -> ContextState;

    /// Stops producing audio and releases the renderer
    fn close(&mut self);

    /// Notifications raised outside the engine thread since the last call
    fn drain_notifications(&mut self) -> Vec<Notification> {
        Vec::new()
    }
}

/// Default output device through cpal
pub struct CpalOutput {
    device: Option<Device>,
    stream_config: Option<StreamConfig>,
    sample_format: Option<SampleFormat>,
    stream: Option<Stream>,
    state: AtomicContextState,
    notification_rx: Option<NotificationConsumer>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            device: None,
            stream_config: None,
            sample_format: None,
            stream: None,
            state: AtomicContextState::default(),
            notification_rx: None,
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        renderer: Arc<Mutex<Renderer>>,
        state: AtomicContextState,
        mut notification_tx: NotificationProducer,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = config.channels as usize;

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No blocking locks
                    if let Ok(mut renderer) = renderer.try_lock() {
                        renderer.render_interleaved(data, channels);
                    } else {
                        data.fill(T::EQUILIBRIUM);
                    }
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the audio callback
                    state.set(ContextState::Interrupted);
                    let notification = Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {}", err),
                    );
                    let _ = notification_tx.try_push(notification);
                },
                None,
            )
            .map_err(|e| EngineError::BuildStream(e.to_string()))
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for CpalOutput {
    fn configure(&mut self) -> Result<OutputConfig, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;

        if let Ok(name) = device.name() {
            info!("Output device: {}", name);
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| EngineError::OutputConfig(e.to_string()))?;
        debug!("Output config: {:?}", supported_config);

        let sample_format = supported_config.sample_format();
        let stream_config: StreamConfig = supported_config.into();
        let config = OutputConfig {
            sample_rate: stream_config.sample_rate.0,
            channels: stream_config.channels,
        };

        self.device = Some(device);
        self.stream_config = Some(stream_config);
        self.sample_format = Some(sample_format);
        Ok(config)
    }

    fn start(&mut self, renderer: Renderer) -> Result<ContextState, EngineError> {
        let (Some(device), Some(config), Some(sample_format)) =
            (&self.device, &self.stream_config, self.sample_format)
        else {
            return Err(EngineError::OutputConfig(
                "output was not configured".to_string(),
            ));
        };

        let (notification_tx, notification_rx) =
            create_notification_channel(NOTIFICATION_CAPACITY);
        let renderer = Arc::new(Mutex::new(renderer));
        let state = self.state.clone();

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(device, config, renderer, state, notification_tx)?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(device, config, renderer, state, notification_tx)?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(device, config, renderer, state, notification_tx)?
            }
            other => {
                return Err(EngineError::UnsupportedSampleFormat(format!("{:?}", other)));
            }
        };

        // Le stream reste en pause jusqu'à resume()
        self.stream = Some(stream);
        self.notification_rx = Some(notification_rx);
        self.state.set(ContextState::Suspended);
        Ok(ContextState::Suspended)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let Some(stream) = &self.stream else {
            return Err(EngineError::PlayStream("no stream".to_string()));
        };
        stream
            .play()
            .map_err(|e| EngineError::PlayStream(e.to_string()))?;
        self.state.set(ContextState::Running);
        Ok(())
    }

    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Cannot pause stream while closing: {}", e);
            }
        }
        self.state.set(ContextState::Closed);
    }

    fn drain_notifications(&mut self) -> Vec<Notification> {
        match &mut self.notification_rx {
            Some(rx) => rx.pop_iter().collect(),
            None => Vec::new(),
        }
    }
}

/// Output without a device: audio is pulled on demand through an [`OfflineHandle`]
///
/// Used for WAV export and for driving the engine deterministically in tests.
pub struct OfflineOutput {
    sample_rate: u32,
    failing_starts: u32,
    renderer: Arc<Mutex<Option<Renderer>>>,
    state: AtomicContextState,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            failing_starts: 0,
            renderer: Arc::new(Mutex::new(None)),
            state: AtomicContextState::default(),
        }
    }

    /// The next `count` calls to `start` fail as if the device refused the stream
    pub fn with_failing_starts(mut self, count: u32) -> Self {
        self.failing_starts = count;
        self
    }

    pub fn handle(&self) -> OfflineHandle {
        OfflineHandle {
            renderer: Arc::clone(&self.renderer),
            state: self.state.clone(),
        }
    }
}

fn lock_renderer(renderer: &Mutex<Option<Renderer>>) -> MutexGuard<'_, Option<Renderer>> {
    renderer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AudioOutput for OfflineOutput {
    fn configure(&mut self) -> Result<OutputConfig, EngineError> {
        Ok(OutputConfig {
            sample_rate: self.sample_rate,
            channels: 1,
        })
    }

    fn start(&mut self, renderer: Renderer) -> Result<ContextState, EngineError> {
        if self.failing_starts > 0 {
            self.failing_starts -= 1;
            return Err(EngineError::BuildStream("device refused the stream".to_string()));
        }
        *lock_renderer(&self.renderer) = Some(renderer);
        self.state.set(ContextState::Suspended);
        Ok(ContextState::Suspended)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if lock_renderer(&self.renderer).is_none() {
            return Err(EngineError::PlayStream("no renderer".to_string()));
        }
        self.state.set(ContextState::Running);
        Ok(())
    }

    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn close(&mut self) {
        *lock_renderer(&self.renderer) = None;
        self.state.set(ContextState::Closed);
    }
}

/// Pulls audio out of an [`OfflineOutput`] owned by an engine
#[derive(Clone)]
pub struct OfflineHandle {
    renderer: Arc<Mutex<Option<Renderer>>>,
    state: AtomicContextState,
}

impl OfflineHandle {
    /// Renders `frames` mono samples
    ///
    /// Returns silence and leaves the clock untouched unless the output is running.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames];
        self.render_into(&mut buffer);
        buffer
    }

    pub fn render_into(&self, buffer: &mut [f32]) {
        if self.state.get() != ContextState::Running {
            buffer.fill(0.0);
            return;
        }
        match lock_renderer(&self.renderer).as_mut() {
            Some(renderer) => renderer.render_mono(buffer),
            None => buffer.fill(0.0),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state.get()
    }

    /// Simulates the platform suspending the context (e.g. an interruption)
    pub fn suspend(&self) {
        if self.state.get() == ContextState::Running {
            self.state.set(ContextState::Suspended);
        }
    }

    pub fn stats(&self) -> Option<RenderStats> {
        lock_renderer(&self.renderer).as_ref().map(Renderer::stats)
    }

    pub fn active_voices(&self) -> usize {
        lock_renderer(&self.renderer)
            .as_ref()
            .map_or(0, Renderer::active_voices)
    }
}
