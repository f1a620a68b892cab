// Engine - Orchestrateur: scheduler, synthèse, métronome et notifications UI
//
// The engine is driven by a single cooperative loop (`pump`). Two timers share it:
// the 25ms lookahead poll that commits steps to the audio thread ahead of time, and the
// ~60Hz display frame that tells listeners about steps once the audio clock has
// reached them. Sound timing comes only from the audio clock; the loop's jitter only
// affects when listeners hear about a step.

pub mod error;
pub mod graph;
pub mod step;
pub mod timer;
pub mod ui_queue;

pub use error::EngineError;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::audio::output::{AudioOutput, ContextState, CpalOutput};
use crate::audio::parameters::{Bus, MixerParams};
use crate::audio::renderer::Renderer;
use crate::audio::timing::AudioTiming;
use crate::config::SessionConfig;
use crate::instrument::{InstrumentId, InstrumentSettings, MixState};
use crate::messaging::channels::create_command_channel;
use crate::messaging::subscription::{SubscriptionId, Subscribers};
use crate::practice::PracticeUpdate;
use crate::sequencer::metronome::{ClickSound, ClickType, Metronome};
use crate::sequencer::pattern::StepPattern;
use crate::sequencer::scheduler::{
    LOOKAHEAD_INTERVAL, MeasureEvent, Scheduler, SchedulerEvent, StepEvent,
};
use crate::sequencer::timeline::TimeSignature;
use crate::sequencer::transport::Position;
use crate::synth::drums::DrumSynth;
use crate::synth::kit::DrumKit;

use graph::AudioGraph;
use step::{StepContext, plan_step};
use timer::IntervalTimer;
use ui_queue::UiQueue;

/// Display refresh period of the UI dispatch loop
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Capacity of the engine → audio thread command queue
pub const COMMAND_CAPACITY: usize = 1024;

/// Sample rate assumed until the output reports its own
const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Lifecycle of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    /// Terminal: a disposed engine must be rebuilt
    Disposed,
}

pub struct Engine<O: AudioOutput = CpalOutput> {
    output: O,
    state: EngineState,
    graph: Option<AudioGraph>,

    scheduler: Scheduler,
    drums: DrumSynth,
    metronome: Metronome,

    patterns: HashMap<InstrumentId, StepPattern>,
    mix: MixState,
    time_signature: TimeSignature,
    metronome_enabled: bool,
    muted: bool,
    master_volume: f32,

    step_listeners: Subscribers<StepEvent>,
    measure_listeners: Subscribers<MeasureEvent>,
    ui_queue: UiQueue,

    poll_timer: IntervalTimer,
    frame_timer: IntervalTimer,
    scratch: Vec<SchedulerEvent>,
}

impl Engine<CpalOutput> {
    /// Engine playing through the default output device
    pub fn with_default_output() -> Self {
        Self::new(CpalOutput::new())
    }
}

impl<O: AudioOutput> Engine<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            state: EngineState::Uninitialized,
            graph: None,
            scheduler: Scheduler::new(),
            drums: DrumSynth::new(DEFAULT_SAMPLE_RATE),
            metronome: Metronome::new(DEFAULT_SAMPLE_RATE),
            patterns: HashMap::new(),
            mix: MixState::new(),
            time_signature: TimeSignature::default(),
            metronome_enabled: false,
            muted: false,
            master_volume: 1.0,
            step_listeners: Subscribers::new(),
            measure_listeners: Subscribers::new(),
            ui_queue: UiQueue::new(),
            poll_timer: IntervalTimer::new(LOOKAHEAD_INTERVAL),
            frame_timer: IntervalTimer::new(FRAME_INTERVAL),
            scratch: Vec::with_capacity(64),
        }
    }

    // ========== Lifecycle ==========

    /// Builds the audio graph and starts the output
    ///
    /// Idempotent once it succeeded. A suspended output is resumed before returning. On
    /// failure the engine stays uninitialized and `init` can be called again.
    pub fn init(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Ready => return Ok(()),
            EngineState::Disposed => return Err(EngineError::Disposed),
            EngineState::Uninitialized => {}
        }

        let config = self.output.configure()?;
        let timing = AudioTiming::new(config.sample_rate as f32);
        let mixer = MixerParams::new();
        let (commands_tx, commands_rx) = create_command_channel(COMMAND_CAPACITY);
        let renderer = Renderer::new(timing.clone(), commands_rx, mixer.clone());

        if self.output.start(renderer)? == ContextState::Suspended {
            debug!("Audio context starts suspended, resuming");
            if let Err(e) = self.output.resume() {
                self.output.close();
                return Err(e);
            }
        }

        self.drums.set_sample_rate(config.sample_rate);
        self.metronome.set_sample_rate(config.sample_rate);
        self.graph = Some(AudioGraph::new(commands_tx, mixer, timing));
        self.state = EngineState::Ready;
        self.push_gains();
        self.frame_timer.arm(Instant::now());

        info!(
            "Audio engine ready: {} Hz, {} channel(s)",
            config.sample_rate, config.channels
        );
        Ok(())
    }

    /// Resumes a suspended output. No-op when already running.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Ready => {}
            EngineState::Disposed => return Err(EngineError::Disposed),
            EngineState::Uninitialized => {
                warn!("resume() called before init(), ignoring");
                return Ok(());
            }
        }

        match self.output.state() {
            ContextState::Running => Ok(()),
            state => {
                debug!("Resuming audio context from {:?}", state);
                self.output.resume()
            }
        }
    }

    /// Stops playback and releases the audio graph. The engine cannot be reused.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }

        self.scheduler.stop();
        if let Some(graph) = self.graph.as_mut() {
            graph.clear_voices();
        }
        self.output.close();
        self.graph = None;

        self.step_listeners.clear();
        self.measure_listeners.clear();
        self.ui_queue.clear();
        self.poll_timer.cancel();
        self.frame_timer.cancel();
        self.state = EngineState::Disposed;
        info!("Audio engine disposed");
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn context_state(&self) -> ContextState {
        self.output.state()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn ensure_ready(&self, operation: &str) -> bool {
        match self.state {
            EngineState::Ready => true,
            EngineState::Uninitialized => {
                warn!("{}() called before init(), ignoring", operation);
                false
            }
            EngineState::Disposed => {
                warn!("{}() called on a disposed engine, ignoring", operation);
                false
            }
        }
    }

    // ========== Transport ==========

    /// Starts playback from the first step of the loop
    pub fn start(&mut self) {
        if !self.ensure_ready("start") || self.scheduler.is_running() {
            return;
        }

        let now = self.current_time();
        self.scheduler.start(now);
        self.poll_timer.arm(Instant::now());
        info!(
            "Playback started: {} in {}",
            self.scheduler.tempo(),
            self.time_signature
        );

        // Le premier pas part tout de suite, sans attendre le timer
        self.poll_scheduler();
    }

    /// Stops scheduling. Sounds already committed still play out.
    pub fn stop(&mut self) {
        if !self.ensure_ready("stop") {
            return;
        }
        self.scheduler.stop();
        self.poll_timer.cancel();
        self.ui_queue.clear();
        debug!("Playback stopped");
    }

    /// Back to the first step; while playing, the next step is due now
    pub fn reset(&mut self) {
        if !self.ensure_ready("reset") {
            return;
        }
        let now = self.current_time();
        self.scheduler.reset(now);
        self.ui_queue.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Audio clock in seconds, 0 before `init`
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, AudioGraph::current_time)
    }

    /// Position of the next step to be committed
    pub fn current_position(&self) -> Position {
        self.scheduler.position()
    }

    // ========== Configuration ==========

    pub fn set_tempo(&mut self, bpm: f64) {
        self.scheduler.set_tempo(bpm);
    }

    pub fn tempo(&self) -> f64 {
        self.scheduler.tempo().bpm()
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.scheduler
            .set_steps_per_measure(time_signature.steps_per_measure());
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_total_measures(&mut self, measures: u32) {
        self.scheduler.set_total_measures(measures);
    }

    pub fn total_measures(&self) -> u32 {
        self.scheduler.total_measures()
    }

    pub fn set_swing(&mut self, percent: i32) {
        self.scheduler.set_swing(percent);
    }

    pub fn swing(&self) -> u8 {
        self.scheduler.swing().percent()
    }

    /// Replaces every pattern. Instruments missing from `patterns` stay silent.
    pub fn set_patterns(&mut self, patterns: HashMap<InstrumentId, StepPattern>) {
        self.patterns = patterns;
    }

    pub fn set_pattern(&mut self, instrument: InstrumentId, pattern: StepPattern) {
        self.patterns.insert(instrument, pattern);
    }

    pub fn pattern(&self, instrument: InstrumentId) -> Option<&StepPattern> {
        self.patterns.get(&instrument)
    }

    pub fn set_instrument_settings(&mut self, settings: HashMap<InstrumentId, InstrumentSettings>) {
        self.mix.set_all(settings);
        self.push_instrument_gains();
    }

    pub fn set_instrument_setting(&mut self, instrument: InstrumentId, settings: InstrumentSettings) {
        self.mix.set(instrument, settings);
        self.push_instrument_gains();
    }

    pub fn instrument_settings(&self, instrument: InstrumentId) -> InstrumentSettings {
        self.mix.settings(instrument)
    }

    pub fn set_soloed(&mut self, instrument: Option<InstrumentId>) {
        self.mix.set_solo(instrument);
        self.push_instrument_gains();
    }

    pub fn soloed(&self) -> Option<InstrumentId> {
        self.mix.solo()
    }

    /// Gain currently applied to an instrument's bus
    pub fn instrument_gain(&self, instrument: InstrumentId) -> f32 {
        self.mix.gain(instrument)
    }

    pub fn set_kit(&mut self, kit: DrumKit) {
        self.drums.set_kit(kit);
    }

    pub fn kit(&self) -> DrumKit {
        self.drums.kit()
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.metronome_enabled = enabled;
    }

    pub fn metronome_enabled(&self) -> bool {
        self.metronome_enabled
    }

    pub fn set_metronome_volume(&mut self, volume: f32) {
        self.metronome.set_volume(volume);
        if let Some(graph) = &self.graph {
            graph.mixer().set_bus_gain(Bus::Click, self.metronome.volume());
        }
    }

    pub fn metronome_volume(&self) -> f32 {
        self.metronome.volume()
    }

    pub fn set_click_sound(&mut self, sound: ClickSound) {
        self.metronome.set_click_sound(sound);
    }

    pub fn click_sound(&self) -> ClickSound {
        self.metronome.click_sound()
    }

    /// Silences drum triggers from the next step on. The metronome keeps clicking.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        if let Some(graph) = &self.graph {
            graph.mixer().set_master(self.master_volume);
        }
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Applies every field of a session configuration
    pub fn apply_config(&mut self, config: &SessionConfig) {
        self.set_tempo(config.tempo);
        self.set_time_signature(config.time_signature);
        self.set_swing(config.swing);
        self.set_total_measures(config.measures);
        self.set_kit(config.kit);
        self.set_muted(config.muted);
        self.set_master_volume(config.master_volume);
        self.set_metronome_enabled(config.metronome.enabled);
        self.set_metronome_volume(config.metronome.volume);
        self.set_click_sound(config.metronome.click_sound);
        self.mix.set_all(config.instrument_settings());
        self.mix.set_solo(config.soloed_instrument());
        self.push_instrument_gains();
        self.set_patterns(config.patterns());
    }

    pub fn apply_practice_update(&mut self, update: PracticeUpdate) {
        if let Some(muted) = update.muted {
            debug!("Practice: drums {}", if muted { "muted" } else { "back" });
            self.set_muted(muted);
        }
        if let Some(tempo) = update.tempo {
            debug!("Practice: tempo {}", tempo);
            self.set_tempo(tempo);
        }
    }

    fn push_instrument_gains(&self) {
        let Some(graph) = &self.graph else {
            return;
        };
        for id in InstrumentId::ALL {
            graph
                .mixer()
                .set_bus_gain(Bus::Instrument(id), self.mix.gain(id));
        }
    }

    fn push_gains(&self) {
        self.push_instrument_gains();
        if let Some(graph) = &self.graph {
            graph.mixer().set_bus_gain(Bus::Click, self.metronome.volume());
            graph.mixer().set_master(self.master_volume);
        }
    }

    // ========== Listeners ==========

    /// Called with `(step, measure)` once the step is audible
    pub fn on_step(&mut self, mut listener: impl FnMut(u32, u32) + 'static) -> SubscriptionId {
        self.step_listeners
            .subscribe(move |event: &StepEvent| listener(event.step, event.measure))
    }

    pub fn remove_step_listener(&mut self, id: SubscriptionId) -> bool {
        self.step_listeners.unsubscribe(id)
    }

    /// Called with `(measure, time)` when a measure boundary is scheduled
    pub fn on_measure(&mut self, mut listener: impl FnMut(u32, f64) + 'static) -> SubscriptionId {
        self.measure_listeners
            .subscribe(move |event: &MeasureEvent| listener(event.measure, event.time))
    }

    pub fn remove_measure_listener(&mut self, id: SubscriptionId) -> bool {
        self.measure_listeners.unsubscribe(id)
    }

    // ========== Loop ==========

    /// Runs whatever is due at this instant
    pub fn pump(&mut self) {
        self.pump_at(Instant::now());
    }

    pub fn pump_at(&mut self, now: Instant) {
        if self.state != EngineState::Ready {
            return;
        }

        for notification in self.output.drain_notifications() {
            notification.log();
        }

        if self.poll_timer.fire_if_due(now) {
            self.poll_scheduler();
        }
        if self.frame_timer.fire_if_due(now) {
            self.dispatch_ui();
        }
    }

    /// Time until the next timer tick, for hosts that sleep between pumps
    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        [
            self.poll_timer.time_until_due(now),
            self.frame_timer.time_until_due(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(FRAME_INTERVAL)
    }

    /// One lookahead pass: commits every step due within the schedule-ahead window
    ///
    /// Returns the number of steps committed.
    pub fn poll_scheduler(&mut self) -> usize {
        self.poll_scheduler_until(f64::INFINITY)
    }

    /// Lookahead pass that leaves every step due at or after `end` uncommitted
    ///
    /// Used by renderers with a fixed length so that the next loop never leaks in.
    pub fn poll_scheduler_until(&mut self, end: f64) -> usize {
        if self.graph.is_none() {
            return 0;
        }
        let now = self.current_time();

        let mut events = std::mem::take(&mut self.scratch);
        events.clear();
        let committed = self.scheduler.schedule_until(now, end, &mut events);
        for event in &events {
            match *event {
                SchedulerEvent::Step(step) => self.handle_step(step),
                SchedulerEvent::Measure(measure) => self.handle_measure(measure),
            }
        }
        self.scratch = events;
        committed
    }

    fn handle_step(&mut self, event: StepEvent) {
        self.ui_queue.push(event);

        let plan = plan_step(
            &StepContext {
                patterns: &self.patterns,
                time_signature: self.time_signature,
                metronome_enabled: self.metronome_enabled,
                muted: self.muted,
            },
            event.step,
            event.measure,
        );

        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        if let Some(click) = plan.click {
            self.metronome
                .click(event.time, click == ClickType::Accent, &mut *graph);
        }
        for hit in &plan.hits {
            self.drums
                .trigger(hit.instrument, event.time, hit.velocity, &mut *graph);
        }
    }

    fn handle_measure(&mut self, event: MeasureEvent) {
        self.measure_listeners.notify(&event);
    }

    /// Fires step listeners for every queued step the audio clock has reached
    ///
    /// Returns the number of notifications delivered.
    pub fn dispatch_ui(&mut self) -> usize {
        if self.graph.is_none() {
            return 0;
        }
        let now = self.current_time();

        let mut fired = 0;
        while let Some(event) = self.ui_queue.pop_due(now) {
            self.step_listeners.notify(&event);
            fired += 1;
        }
        fired
    }

    /// Steps committed to the audio thread but not yet announced to listeners
    pub fn pending_ui_events(&self) -> usize {
        self.ui_queue.len()
    }
}
