//! Two engines, same run, same commands.
//! They must produce byte-identical event logs.

use logic_clock_core::{
    command::PlayerCommand,
    dialog::FormValues,
    engine::SimEngine,
    types::{MouseButton, TilePos},
};

const RUN_ID: &str = "det-test";

fn collect_event_log(engine: &SimEngine) -> Vec<String> {
    (0..=engine.clock.current_tick)
        .flat_map(|tick| {
            engine
                .store_events_for_tick(RUN_ID, tick)
                .expect("read events")
                .into_iter()
                .map(|e| e.payload)
        })
        .collect()
}

fn script() -> Vec<(u64, PlayerCommand)> {
    let values = |up: &str, down: &str| FormValues::new().with("up", up).with("down", down);
    vec![
        (0, PlayerCommand::PlaceClock { tile: TilePos::new(0, 0) }),
        (0, PlayerCommand::ConfirmDialog { values: values("5", "10") }),
        (25, PlayerCommand::PlaceClock { tile: TilePos::new(2, 0) }),
        (40, PlayerCommand::ConfirmDialog { values: values("3", "3") }),
        (60, PlayerCommand::ClickTile { tile: TilePos::new(0, 0), button: MouseButton::Left }),
        (75, PlayerCommand::CancelDialog),
        (90, PlayerCommand::PlaceClock { tile: TilePos::new(5, 5) }),
        (95, PlayerCommand::CancelDialog),
    ]
}

fn run_script() -> SimEngine {
    let mut engine = SimEngine::build_test(RUN_ID.into(), 11).expect("build engine");
    for (at, command) in script() {
        engine.run_ticks(at - engine.clock.current_tick).expect("run");
        engine.apply_command(command).expect("command");
    }
    engine.run_ticks(200 - engine.clock.current_tick).expect("run");
    engine
}

#[test]
fn same_commands_produce_identical_event_logs() {
    let engine_a = run_script();
    let engine_b = run_script();

    let log_a = collect_event_log(&engine_a);
    let log_b = collect_event_log(&engine_b);

    assert!(!log_a.is_empty());
    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(
            a, b,
            "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}"
        );
    }
}

#[test]
fn scripted_run_leaves_two_clocks() {
    let engine = run_script();

    assert_eq!(engine.world.clocks().count(), 2);
    assert!(engine.world.entity_at(TilePos::new(5, 5), logic_clock_core::types::Layer::Wires).is_none());
    assert_eq!(engine.store_event_count("clock_periods_updated").unwrap(), 2);
    assert!(engine.store_event_count("clock_signal_changed").unwrap() > 0);
}
