// Step handling - What a fired step triggers
//
// Pure decision logic, kept apart from the audio graph so it can be checked without an
// output device. The engine turns a `StepPlan` into clicks and drum layers.

use std::collections::HashMap;

use crate::instrument::InstrumentId;
use crate::sequencer::metronome::ClickType;
use crate::sequencer::pattern::StepPattern;
use crate::sequencer::timeline::TimeSignature;

/// Snapshot of the configuration read by one step
pub struct StepContext<'a> {
    pub patterns: &'a HashMap<InstrumentId, StepPattern>,
    pub time_signature: TimeSignature,
    pub metronome_enabled: bool,
    pub muted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumHit {
    pub instrument: InstrumentId,
    pub velocity: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPlan {
    pub click: Option<ClickType>,
    pub hits: Vec<DrumHit>,
}

/// Decides the click and drum hits for `(step, measure)`
///
/// Each pattern is indexed by `measure * steps_per_measure + step` modulo its own length,
/// so a one-measure pattern repeats over a longer loop. Hits come out in instrument
/// table order.
pub fn plan_step(ctx: &StepContext<'_>, step: u32, measure: u32) -> StepPlan {
    let click = if ctx.metronome_enabled && step % ctx.time_signature.steps_per_beat() == 0 {
        Some(ClickType::from_downbeat(step == 0))
    } else {
        None
    };

    let mut hits = Vec::new();
    if !ctx.muted {
        let global_step =
            measure as u64 * ctx.time_signature.steps_per_measure() as u64 + step as u64;
        for id in InstrumentId::ALL {
            let Some(pattern) = ctx.patterns.get(&id) else {
                continue;
            };
            if let Some(cell) = pattern.step_at(global_step) {
                if cell.active {
                    hits.push(DrumHit {
                        instrument: id,
                        velocity: cell.effective_velocity(),
                    });
                }
            }
        }
    }

    StepPlan { click, hits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::pattern::Step;

    fn context(patterns: &HashMap<InstrumentId, StepPattern>) -> StepContext<'_> {
        StepContext {
            patterns,
            time_signature: TimeSignature::FourFour,
            metronome_enabled: false,
            muted: false,
        }
    }

    fn four_on_the_floor() -> StepPattern {
        StepPattern::from_array(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0], 0.8)
    }

    fn kick_steps(ctx: &StepContext<'_>, measures: u32) -> Vec<(u32, u32)> {
        let mut fired = Vec::new();
        for measure in 0..measures {
            for step in 0..16 {
                let plan = plan_step(ctx, step, measure);
                if plan.hits.iter().any(|h| h.instrument == InstrumentId::Kick) {
                    fired.push((measure, step));
                }
            }
        }
        fired
    }

    #[test]
    fn test_kick_on_quarter_notes() {
        let patterns = HashMap::from([(InstrumentId::Kick, four_on_the_floor())]);
        let ctx = context(&patterns);
        assert_eq!(kick_steps(&ctx, 1), vec![(0, 0), (0, 4), (0, 8), (0, 12)]);
    }

    #[test]
    fn test_short_pattern_repeats_every_measure() {
        let patterns = HashMap::from([(InstrumentId::Kick, four_on_the_floor())]);
        let ctx = context(&patterns);
        let fired = kick_steps(&ctx, 2);
        assert_eq!(
            fired,
            vec![
                (0, 0),
                (0, 4),
                (0, 8),
                (0, 12),
                (1, 0),
                (1, 4),
                (1, 8),
                (1, 12)
            ]
        );
    }

    #[test]
    fn test_two_measure_pattern_uses_global_step() {
        let mut pattern = StepPattern::empty(TimeSignature::FourFour, 2);
        pattern.set_step(20, Step::hit(0.5));
        let patterns = HashMap::from([(InstrumentId::Snare, pattern)]);
        let ctx = context(&patterns);

        assert!(plan_step(&ctx, 4, 0).hits.is_empty());
        assert_eq!(
            plan_step(&ctx, 4, 1).hits,
            vec![DrumHit {
                instrument: InstrumentId::Snare,
                velocity: 0.5
            }]
        );
    }

    #[test]
    fn test_accent_overrides_velocity() {
        let mut pattern = StepPattern::empty(TimeSignature::FourFour, 1);
        pattern.set_step(
            0,
            Step {
                active: true,
                velocity: 0.3,
                accent: true,
            },
        );
        let patterns = HashMap::from([(InstrumentId::Kick, pattern)]);
        let plan = plan_step(&context(&patterns), 0, 0);
        assert_eq!(plan.hits[0].velocity, 1.0);
    }

    #[test]
    fn test_empty_pattern_is_skipped() {
        let patterns = HashMap::from([(InstrumentId::Kick, StepPattern::new(Vec::new()))]);
        assert!(plan_step(&context(&patterns), 0, 0).hits.is_empty());
    }

    #[test]
    fn test_mute_keeps_metronome() {
        let patterns = HashMap::from([(InstrumentId::Kick, four_on_the_floor())]);
        let ctx = StepContext {
            metronome_enabled: true,
            muted: true,
            ..context(&patterns)
        };
        let plan = plan_step(&ctx, 0, 0);
        assert!(plan.hits.is_empty());
        assert_eq!(plan.click, Some(ClickType::Accent));
    }

    #[test]
    fn test_click_on_beats_only() {
        let patterns = HashMap::new();
        let ctx = StepContext {
            time_signature: TimeSignature::SixEight,
            metronome_enabled: true,
            ..context(&patterns)
        };
        let clicks: Vec<_> = (0..12).filter_map(|s| plan_step(&ctx, s, 0).click).collect();
        assert_eq!(clicks.len(), 6);
        assert_eq!(clicks[0], ClickType::Accent);
        assert!(clicks[1..].iter().all(|c| *c == ClickType::Regular));
        assert_eq!(plan_step(&ctx, 1, 0).click, None);
    }

    #[test]
    fn test_hits_follow_instrument_order() {
        let all = StepPattern::from_array(&[1], 0.8);
        let patterns: HashMap<_, _> = InstrumentId::ALL
            .iter()
            .rev()
            .map(|id| (*id, all.clone()))
            .collect();
        let plan = plan_step(&context(&patterns), 3, 2);
        let order: Vec<_> = plan.hits.iter().map(|h| h.instrument).collect();
        assert_eq!(order, InstrumentId::ALL.to_vec());
    }
}
