// Integration test: lookahead scheduler timing
//
// Exercises the scheduler alone, with a simulated audio clock advanced in 25ms ticks
// like the engine's polling loop.

use drumtrainer::sequencer::scheduler::{LOOKAHEAD_INTERVAL, SCHEDULE_AHEAD_TIME};
use drumtrainer::{Position, Scheduler, SchedulerEvent, StepEvent, TimeSignature};

const EPSILON: f64 = 1e-9;

/// Polls every 25ms of simulated audio time until `seconds`
fn poll_for(scheduler: &mut Scheduler, seconds: f64) -> Vec<SchedulerEvent> {
    let tick = LOOKAHEAD_INTERVAL.as_secs_f64();
    let mut events = Vec::new();
    let mut now = 0.0;
    scheduler.start(now);
    while now < seconds {
        scheduler.schedule(now, &mut events);
        now += tick;
    }
    events
}

fn steps(events: &[SchedulerEvent]) -> Vec<StepEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Step(step) => Some(*step),
            SchedulerEvent::Measure(_) => None,
        })
        .collect()
}

#[test]
fn test_straight_steps_are_evenly_spaced() {
    let mut scheduler = Scheduler::new();
    scheduler.set_tempo(120.0);
    let steps = steps(&poll_for(&mut scheduler, 4.0));

    for pair in steps.windows(2) {
        assert!((pair[1].time - pair[0].time - 0.125).abs() < EPSILON);
    }
}

#[test]
fn test_swing_pairs_keep_the_grid() {
    let mut scheduler = Scheduler::new();
    scheduler.set_tempo(100.0);
    scheduler.set_swing(75);
    let steps = steps(&poll_for(&mut scheduler, 4.0));
    let straight = 60.0 / 100.0 / 4.0;

    for (i, step) in steps.iter().enumerate() {
        let grid = i as f64 * straight;
        if i % 2 == 0 {
            // Every pair lasts two straight steps
            assert!((step.time - grid).abs() < EPSILON);
        } else {
            assert!((step.time - grid - 0.25 * straight).abs() < EPSILON);
        }
    }
}

#[test]
fn test_events_never_exceed_the_horizon() {
    let mut scheduler = Scheduler::new();
    let tick = LOOKAHEAD_INTERVAL.as_secs_f64();
    let mut events = Vec::new();
    let mut now = 0.0;
    scheduler.start(now);

    for _ in 0..200 {
        events.clear();
        scheduler.schedule(now, &mut events);
        for step in steps(&events) {
            assert!(step.time < now + SCHEDULE_AHEAD_TIME);
            assert!(step.time >= now - EPSILON);
        }
        now += tick;
    }
}

#[test]
fn test_measure_events_come_with_step_zero() {
    let mut scheduler = Scheduler::new();
    scheduler.set_steps_per_measure(TimeSignature::SixEight.steps_per_measure());
    scheduler.set_total_measures(2);
    let events = poll_for(&mut scheduler, 6.0);

    for (i, event) in events.iter().enumerate() {
        if let SchedulerEvent::Measure(measure) = event {
            match events[i - 1] {
                SchedulerEvent::Step(step) => {
                    assert_eq!(step.step, 0);
                    assert_eq!(step.measure, measure.measure);
                    assert_eq!(step.time, measure.time);
                }
                SchedulerEvent::Measure(_) => panic!("two measure events in a row"),
            }
        }
    }
    let measures: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Measure(m) => Some(m.measure),
            SchedulerEvent::Step(_) => None,
        })
        .collect();
    assert_eq!(&measures[..4], &[0, 1, 0, 1]);
}

#[test]
fn test_full_loop_returns_to_start() {
    let mut scheduler = Scheduler::new();
    scheduler.set_total_measures(3);
    scheduler.start(0.0);

    // A 25ms tick commits at most one 125ms step
    let mut events = Vec::new();
    let mut now = 0.0;
    while steps(&events).len() < 3 * 16 {
        scheduler.schedule(now, &mut events);
        now += LOOKAHEAD_INTERVAL.as_secs_f64();
    }

    let committed = steps(&events);
    assert_eq!(committed.len(), 48);
    assert!(committed.iter().all(|s| s.measure < 3));
    assert_eq!((committed[47].step, committed[47].measure), (15, 2));
    assert_eq!(scheduler.position(), Position::new(0, 0));
}

#[test]
fn test_tempo_change_mid_loop() {
    let mut scheduler = Scheduler::new();
    scheduler.set_tempo(120.0);
    scheduler.start(0.0);
    let mut events = Vec::new();
    scheduler.schedule(0.0, &mut events);
    assert_eq!(scheduler.next_step_time(), 0.125);

    scheduler.set_tempo(60.0);
    events.clear();
    scheduler.schedule(0.2, &mut events);
    let steps = steps(&events);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].time, 0.125);
    assert_eq!(scheduler.next_step_time(), 0.375);
}

#[test]
fn test_tempo_bounds() {
    let mut scheduler = Scheduler::new();
    scheduler.set_tempo(10.0);
    assert_eq!(scheduler.tempo().bpm(), 40.0);
    scheduler.set_tempo(500.0);
    assert_eq!(scheduler.tempo().bpm(), 240.0);
}
