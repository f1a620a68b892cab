// Pattern - Step grid for one instrument
// A pattern is a flat list of steps covering every measure of the loop

use crate::sequencer::timeline::TimeSignature;
use serde::{Deserialize, Serialize};

/// Velocity given to newly activated steps
pub const DEFAULT_VELOCITY: f32 = 0.8;

/// One cell of a step pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub active: bool,
    pub velocity: f32,
    pub accent: bool,
}

impl Step {
    /// An active step with the given velocity
    pub fn hit(velocity: f32) -> Self {
        Self {
            active: true,
            velocity: velocity.clamp(0.0, 1.0),
            accent: false,
        }
    }

    /// An active, accented step
    pub fn accented() -> Self {
        Self {
            accent: true,
            ..Self::hit(DEFAULT_VELOCITY)
        }
    }

    /// Velocity actually sent to the synth: accents always play at full velocity
    pub fn effective_velocity(&self) -> f32 {
        if self.accent { 1.0 } else { self.velocity }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            velocity: DEFAULT_VELOCITY,
            accent: false,
        }
    }
}

/// Ordered steps of one instrument, `steps_per_measure * measures` long
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPattern {
    steps: Vec<Step>,
}

impl StepPattern {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Empty pattern sized for `measures` measures of `time_signature`
    pub fn empty(time_signature: TimeSignature, measures: u32) -> Self {
        let len = time_signature.steps_per_measure() * measures.max(1);
        Self {
            steps: vec![Step::default(); len as usize],
        }
    }

    /// Builds a pattern from 0/1 values (any non-zero value is a hit)
    ///
    /// # Arguments
    /// * `values` - One entry per step
    /// * `velocity` - Velocity of every active step
    pub fn from_array(values: &[u8], velocity: f32) -> Self {
        let steps = values
            .iter()
            .map(|&v| if v != 0 { Step::hit(velocity) } else { Step::default() })
            .collect();
        Self { steps }
    }

    /// Parses a compact grid such as `"x---x---X---x---"`
    ///
    /// `x` is a hit, `X` an accented hit, `-` or `.` a rest. Whitespace and `|`
    /// separators are ignored. Returns `None` on any other character.
    pub fn from_grid(grid: &str) -> Option<Self> {
        let mut steps = Vec::with_capacity(grid.len());
        for c in grid.chars() {
            match c {
                'x' => steps.push(Step::hit(DEFAULT_VELOCITY)),
                'X' => steps.push(Step::accented()),
                '-' | '.' => steps.push(Step::default()),
                '|' => {}
                c if c.is_whitespace() => {}
                _ => return None,
            }
        }
        Some(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Step played at an absolute step index, wrapping on the pattern's own length
    pub fn step_at(&self, global_step: u64) -> Option<&Step> {
        if self.steps.is_empty() {
            return None;
        }
        let index = (global_step % self.steps.len() as u64) as usize;
        self.steps.get(index)
    }

    /// Flips a step on or off. Out of range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(step) = self.steps.get_mut(index) {
            step.active = !step.active;
        }
    }

    pub fn set_step(&mut self, index: usize, step: Step) {
        if let Some(slot) = self.steps.get_mut(index) {
            *slot = step;
        }
    }

    /// Resizes the pattern to `measures` measures
    ///
    /// Growing repeats the existing content, shrinking truncates it.
    pub fn resize_measures(&mut self, time_signature: TimeSignature, measures: u32) {
        let new_len = (time_signature.steps_per_measure() * measures.max(1)) as usize;
        if self.steps.is_empty() {
            self.steps = vec![Step::default(); new_len];
            return;
        }

        let old_len = self.steps.len();
        if new_len > old_len {
            let repeated: Vec<Step> = (old_len..new_len).map(|i| self.steps[i % old_len]).collect();
            self.steps.extend(repeated);
        } else {
            self.steps.truncate(new_len);
        }
    }

    /// Indices of the active steps
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step() {
        let step = Step::default();
        assert!(!step.active);
        assert_eq!(step.velocity, 0.8);
        assert!(!step.accent);
    }

    #[test]
    fn test_accent_overrides_velocity() {
        let step = Step {
            active: true,
            velocity: 0.3,
            accent: true,
        };
        assert_eq!(step.effective_velocity(), 1.0);
        assert_eq!(Step::hit(0.3).effective_velocity(), 0.3);
    }

    #[test]
    fn test_empty_pattern_length() {
        assert_eq!(StepPattern::empty(TimeSignature::FourFour, 2).len(), 32);
        assert_eq!(StepPattern::empty(TimeSignature::SixEight, 1).len(), 12);
        assert_eq!(StepPattern::empty(TimeSignature::FiveFour, 0).len(), 20);
    }

    #[test]
    fn test_from_array() {
        let pattern = StepPattern::from_array(&[1, 0, 0, 0, 1, 0, 0, 0], 0.6);
        assert_eq!(pattern.len(), 8);
        assert_eq!(pattern.active_indices().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(pattern.get(4).map(|s| s.velocity), Some(0.6));
    }

    #[test]
    fn test_from_grid() {
        let pattern = StepPattern::from_grid("X--- x--- | ..x. ----").unwrap();
        assert_eq!(pattern.len(), 16);
        assert_eq!(pattern.active_indices().collect::<Vec<_>>(), vec![0, 4, 10]);
        assert!(pattern.get(0).unwrap().accent);
        assert!(!pattern.get(4).unwrap().accent);
        assert!(StepPattern::from_grid("x-o-").is_none());
    }

    #[test]
    fn test_step_at_wraps_on_own_length() {
        let pattern = StepPattern::from_array(&[1, 0, 0, 0], DEFAULT_VELOCITY);
        assert!(pattern.step_at(0).unwrap().active);
        assert!(pattern.step_at(4).unwrap().active);
        assert!(!pattern.step_at(5).unwrap().active);
        assert!(StepPattern::default().step_at(3).is_none());
    }

    #[test]
    fn test_toggle() {
        let mut pattern = StepPattern::empty(TimeSignature::FourFour, 1);
        pattern.toggle(3);
        assert!(pattern.get(3).unwrap().active);
        pattern.toggle(3);
        assert!(!pattern.get(3).unwrap().active);
        pattern.toggle(99);
    }

    #[test]
    fn test_resize_measures_repeats_content() {
        let mut pattern = StepPattern::from_grid("x---------------").unwrap();
        pattern.resize_measures(TimeSignature::FourFour, 2);
        assert_eq!(pattern.len(), 32);
        assert_eq!(pattern.active_indices().collect::<Vec<_>>(), vec![0, 16]);

        pattern.resize_measures(TimeSignature::ThreeFour, 1);
        assert_eq!(pattern.len(), 12);
    }

    #[test]
    fn test_serde_transparent() {
        let pattern = StepPattern::from_array(&[1, 0], 0.5);
        let json = serde_json::to_string(&pattern).unwrap();
        assert!(json.starts_with('['));
        let back: StepPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }
}
