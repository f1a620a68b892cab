// Scheduler - Lookahead step scheduling against the audio clock
//
// The host polls the scheduler from a coarse timer. Each poll commits every step that
// falls inside the schedule-ahead window to an exact audio-clock timestamp, so a late
// poll only delays notifications, never the sound itself.

use std::time::Duration;

use super::timeline::{Swing, Tempo};
use super::transport::{Position, TransportState};

/// How often the host should poll `Scheduler::schedule`
pub const LOOKAHEAD_INTERVAL: Duration = Duration::from_millis(25);

/// How far ahead of the audio clock steps are committed (seconds)
pub const SCHEDULE_AHEAD_TIME: f64 = 0.1;

/// A step that must sound at `time` (audio clock seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub step: u32,
    pub measure: u32,
    pub time: f64,
}

/// Start of a measure, emitted right after the step-0 event of that measure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureEvent {
    pub measure: u32,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerEvent {
    Step(StepEvent),
    Measure(MeasureEvent),
}

/// Lookahead scheduler
///
/// Owns the playhead. Tempo, swing and loop size changes only affect steps that have
/// not been committed yet.
#[derive(Debug, Clone)]
pub struct Scheduler {
    state: TransportState,
    tempo: Tempo,
    swing: Swing,
    steps_per_measure: u32,
    total_measures: u32,
    position: Position,
    next_step_time: f64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            tempo: Tempo::default(),
            swing: Swing::default(),
            steps_per_measure: 16,
            total_measures: 1,
            position: Position::default(),
            next_step_time: 0.0,
        }
    }

    /// Starts from (0, 0) with the first step due at `now`. No-op while running.
    pub fn start(&mut self, now: f64) {
        if self.state.is_running() {
            return;
        }
        self.state = TransportState::Running;
        self.position.rewind();
        self.next_step_time = now;
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
    }

    /// Back to (0, 0); when running the next step is due at `now`
    pub fn reset(&mut self, now: f64) {
        self.position.rewind();
        if self.state.is_running() {
            self.next_step_time = now;
        }
    }

    /// Commits every step due before `now + SCHEDULE_AHEAD_TIME`
    ///
    /// Events are appended to `events` in playback order. Returns the number of steps
    /// committed by this call.
    pub fn schedule(&mut self, now: f64, events: &mut Vec<SchedulerEvent>) -> usize {
        self.schedule_until(now, f64::INFINITY, events)
    }

    /// Same as `schedule`, but never commits a step due at or after `end`
    pub fn schedule_until(
        &mut self,
        now: f64,
        end: f64,
        events: &mut Vec<SchedulerEvent>,
    ) -> usize {
        if !self.state.is_running() {
            return 0;
        }

        let horizon = (now + SCHEDULE_AHEAD_TIME).min(end);
        let mut committed = 0;
        while self.next_step_time < horizon {
            let Position { step, measure } = self.position;
            events.push(SchedulerEvent::Step(StepEvent {
                step,
                measure,
                time: self.next_step_time,
            }));
            if step == 0 {
                events.push(SchedulerEvent::Measure(MeasureEvent {
                    measure,
                    time: self.next_step_time,
                }));
            }
            self.advance();
            committed += 1;
        }
        committed
    }

    fn advance(&mut self) {
        self.next_step_time += self.step_duration(self.position.step);
        self.position
            .advance(self.steps_per_measure, self.total_measures);
    }

    /// Duration of `step` at the current tempo and swing (seconds)
    pub fn step_duration(&self, step: u32) -> f64 {
        self.swing.apply(self.tempo.step_duration_seconds(), step)
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
    }

    pub fn set_swing(&mut self, percent: i32) {
        self.swing = Swing::new(percent);
    }

    pub fn set_steps_per_measure(&mut self, steps: u32) {
        self.steps_per_measure = steps.max(1);
    }

    pub fn set_total_measures(&mut self, measures: u32) {
        self.total_measures = measures.max(1);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn swing(&self) -> Swing {
        self.swing
    }

    pub fn steps_per_measure(&self) -> u32 {
        self.steps_per_measure
    }

    pub fn total_measures(&self) -> u32 {
        self.total_measures
    }

    /// Position of the next step to be committed
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn current_step(&self) -> u32 {
        self.position.step
    }

    pub fn current_measure(&self) -> u32 {
        self.position.measure
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
