// Transport - Playback state and playhead position
// The position is counted in steps and measures and wraps at both boundaries

use std::fmt;

/// Transport state (running or stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

/// Playhead position: current step inside the measure and current measure inside the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub step: u32,
    pub measure: u32,
}

impl Position {
    pub fn new(step: u32, measure: u32) -> Self {
        Self { step, measure }
    }

    /// Back to (0, 0)
    pub fn rewind(&mut self) {
        *self = Self::default();
    }

    /// Moves one step forward
    ///
    /// Rolls into the next measure after `steps_per_measure` steps and loops back to
    /// measure 0 after `total_measures` measures. Returns true when a new measure starts.
    pub fn advance(&mut self, steps_per_measure: u32, total_measures: u32) -> bool {
        self.step += 1;
        if self.step < steps_per_measure.max(1) {
            return false;
        }

        self.step = 0;
        self.measure += 1;
        if self.measure >= total_measures.max(1) {
            self.measure = 0;
        }
        true
    }

    /// Absolute step index counted from the start of measure 0
    pub fn global_step(&self, steps_per_measure: u32) -> u64 {
        self.measure as u64 * steps_per_measure as u64 + self.step as u64
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based like a bar counter
        write!(f, "{}.{}", self.measure + 1, self.step + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_state_default() {
        assert_eq!(TransportState::default(), TransportState::Stopped);
        assert!(!TransportState::Stopped.is_running());
        assert!(TransportState::Running.is_running());
    }

    #[test]
    fn test_advance_within_measure() {
        let mut pos = Position::default();
        assert!(!pos.advance(16, 1));
        assert_eq!(pos, Position::new(1, 0));
    }

    #[test]
    fn test_measure_wraparound() {
        let mut pos = Position::default();
        for _ in 0..(3 * 16) {
            pos.advance(16, 3);
            assert!(pos.measure < 3);
            assert!(pos.step < 16);
        }
        assert_eq!(pos, Position::default());
    }

    #[test]
    fn test_advance_after_step_count_shrinks() {
        // A 4/4 position at step 14 after switching to 3/4
        let mut pos = Position::new(14, 0);
        assert!(pos.advance(12, 2));
        assert_eq!(pos, Position::new(0, 1));
    }

    #[test]
    fn test_global_step() {
        assert_eq!(Position::new(3, 1).global_step(16), 19);
        assert_eq!(Position::new(0, 0).global_step(12), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(0, 0).to_string(), "1.1");
        assert_eq!(Position::new(15, 2).to_string(), "3.16");
    }
}
