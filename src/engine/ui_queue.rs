// UI queue - Step events waiting for the audio clock to reach them
//
// Steps are scheduled up to 100ms ahead; listeners must only hear about a step once it
// is audible, so the events wait here until the display frame that follows their time.

use std::collections::VecDeque;

use crate::sequencer::scheduler::StepEvent;

#[derive(Debug, Default)]
pub struct UiQueue {
    events: VecDeque<StepEvent>,
}

impl UiQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events arrive in time order from the scheduler
    pub fn push(&mut self, event: StepEvent) {
        self.events.push_back(event);
    }

    /// Next event whose time has been reached, in FIFO order
    pub fn pop_due(&mut self, now: f64) -> Option<StepEvent> {
        match self.events.front() {
            Some(event) if event.time <= now => self.events.pop_front(),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
