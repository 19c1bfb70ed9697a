//! Clock scheduler timing, idempotence and failed writes.

use logic_clock_core::{
    building::ClockBuilding,
    clock_state::Period,
    clock_subsystem::ClockScheduler,
    engine::SimEngine,
    event::SimEvent,
    types::TilePos,
    wires::Signal,
    world::World,
};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

fn world_with_clock(up: i64, down: i64) -> (World, u64) {
    let mut world = World::new();
    let uid = ClockBuilding::place(&mut world, TilePos::new(0, 0)).unwrap();
    world
        .clock_mut(uid)
        .unwrap()
        .set_periods(Period::new(up).unwrap(), Period::new(down).unwrap());
    (world, uid)
}

/// up=5, down=10, created at t=0 low.
/// t=0.9 nothing; t=1.1 goes high; t=1.6 goes low.
#[test]
fn documented_scenario_up5_down10() {
    let (mut world, uid) = world_with_clock(5, 10);
    let mut scheduler = ClockScheduler::new();

    assert!(scheduler.step(1, 0.9, &mut world).is_empty());
    assert!(!world.clock(uid).unwrap().is_emitting_high());
    assert_eq!(world.pins(uid).unwrap().value(0), None);

    let events = scheduler.step(2, 1.1, &mut world);
    assert_eq!(
        events,
        vec![SimEvent::ClockSignalChanged { tick: 2, uid, signal: Signal::On, at: 1.1 }]
    );
    let clock = world.clock(uid).unwrap();
    assert!(clock.is_emitting_high());
    assert_eq!(clock.last_transition_time(), 1.1);
    assert_eq!(world.pins(uid).unwrap().value(0), Some(Signal::On));

    let events = scheduler.step(3, 1.6, &mut world);
    assert_eq!(events.len(), 1);
    let clock = world.clock(uid).unwrap();
    assert!(!clock.is_emitting_high());
    assert_eq!(clock.last_transition_time(), 1.6);
    assert_eq!(world.pins(uid).unwrap().value(0), Some(Signal::Off));
}

#[test]
fn repeated_step_at_same_time_is_idempotent() {
    let (mut world, uid) = world_with_clock(3, 3);
    let mut scheduler = ClockScheduler::new();

    assert_eq!(scheduler.step(1, 0.5, &mut world).len(), 1);
    let after_first = world.clock(uid).unwrap().clone();

    assert!(scheduler.step(1, 0.5, &mut world).is_empty());
    assert_eq!(world.clock(uid).unwrap(), &after_first);
    assert_eq!(scheduler.transitions(), 1);
}

#[test]
fn detached_slot_holds_state_until_write_succeeds() {
    let (mut world, uid) = world_with_clock(1, 1);
    let other = ClockBuilding::place(&mut world, TilePos::new(1, 0)).unwrap();
    world.pins_mut(uid).unwrap().set_attached(0, false);
    let before = world.clock(uid).unwrap().clone();
    let mut scheduler = ClockScheduler::new();

    // The detached clock is skipped; the other one still flips.
    let events = scheduler.step(1, 0.2, &mut world);
    assert_eq!(
        events,
        vec![SimEvent::ClockSignalChanged { tick: 1, uid: other, signal: Signal::On, at: 0.2 }]
    );
    assert_eq!(world.clock(uid).unwrap(), &before);
    assert_eq!(world.pins(uid).unwrap().value(0), None);
    assert_eq!(scheduler.transitions(), 1);

    // Reattached: the overdue flip happens on the next tick and the slot
    // agrees with the level.
    world.pins_mut(uid).unwrap().set_attached(0, true);
    let events = scheduler.step(2, 0.25, &mut world);

    assert!(events.contains(&SimEvent::ClockSignalChanged { tick: 2, uid, signal: Signal::On, at: 0.25 }));
    let clock = world.clock(uid).unwrap();
    assert!(clock.is_emitting_high());
    assert_eq!(clock.last_transition_time(), 0.25);
    assert_eq!(world.pins(uid).unwrap().value(0), Some(Signal::On));
}

#[test]
fn clock_without_pins_is_not_scheduled() {
    let (mut world, uid) = world_with_clock(1, 1);
    world.remove_pins(uid);
    let mut scheduler = ClockScheduler::new();

    assert!(scheduler.step(1, 10.0, &mut world).is_empty());
    assert!(!world.clock(uid).unwrap().is_emitting_high());
}

/// Collect (time, level) transitions over `seconds` of 0.1s ticks.
fn run_engine_trace(up: &str, down: &str, seconds: f64) -> Vec<(f64, Signal)> {
    let mut engine = SimEngine::build_test("trace".into(), 1).unwrap();
    engine.place_clock(TilePos::new(0, 0)).unwrap();
    engine
        .confirm_dialog(&logic_clock_core::dialog::FormValues::new().with("up", up).with("down", down))
        .unwrap();

    let mut trace = Vec::new();
    let ticks = (seconds / engine.clock.tick_seconds).round() as u64;
    engine.clock.resume();
    for _ in 0..ticks {
        for event in engine.tick().unwrap() {
            if let SimEvent::ClockSignalChanged { at, signal, .. } = event {
                trace.push((at, signal));
            }
        }
    }
    engine.clock.pause();
    trace
}

/// For random positive periods, the signal spends down/10 s low and up/10 s
/// high per cycle, within one tick.
#[test]
fn duty_cycle_matches_periods_for_random_values() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x00C1_0C4);
    let tick = 0.1;

    for _ in 0..20 {
        let up: i64 = rng.gen_range(1..=30);
        let down: i64 = rng.gen_range(1..=30);
        let trace = run_engine_trace(&up.to_string(), &down.to_string(), 30.0);

        assert!(trace.len() >= 2, "up={up} down={down}: too few transitions");
        assert_eq!(trace[0].1, Signal::On, "first flip must go high");
        assert!((trace[0].0 - down as f64 / 10.0).abs() <= tick + 1e-6);

        for pair in trace.windows(2) {
            let (start, level) = pair[0];
            let (end, _) = pair[1];
            let expected = match level {
                Signal::On => up as f64 / 10.0,
                Signal::Off => down as f64 / 10.0,
            };
            let spent = end - start;
            assert!(
                spent + 1e-6 >= expected && spent <= expected + tick + 1e-6,
                "up={up} down={down}: level {level:?} held {spent:.3}s, expected {expected:.1}s"
            );
        }
    }
}

#[test]
fn full_cycle_period_is_sum_of_periods() {
    let trace = run_engine_trace("5", "10", 20.0);
    let highs: Vec<f64> = trace
        .iter()
        .filter(|(_, s)| *s == Signal::On)
        .map(|(t, _)| *t)
        .collect();

    for pair in highs.windows(2) {
        assert!((pair[1] - pair[0] - 1.5).abs() < 1e-6, "cycle was {}", pair[1] - pair[0]);
    }
}
