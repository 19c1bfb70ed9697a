//! clock-runner: headless runner for the logic clock simulation.
//!
//! Usage:
//!   clock-runner --ticks 600 --db run.db --data-dir ./data
//!   clock-runner --ipc-mode
//!   clock-runner --resume <run_id> --db run.db --ticks 600

use anyhow::Result;
use logic_clock_core::{
    command::PlayerCommand,
    config::SimConfig,
    dialog::FormValues,
    engine::SimEngine,
    store::SimStore,
    types::{Tick, TilePos, Uid},
    wires::Signal,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Command { command: PlayerCommand },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct ClockView {
    uid: Uid,
    tile: TilePos,
    high: bool,
    up_period: i32,
    down_period: i32,
    output: Option<Signal>,
}

#[derive(serde::Serialize)]
struct DialogView {
    title: String,
    description: String,
    fields: Vec<(String, String)>,
}

#[derive(serde::Serialize)]
struct UiState {
    tick: Tick,
    now: f64,
    paused: bool,
    edit_phase: String,
    dialog: Option<DialogView>,
    clocks: Vec<ClockView>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 0u64);
    let ticks = parse_arg(&args, "--ticks", 600u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let resume = string_arg(&args, "--resume");

    let config = match SimConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; using built-in defaults");
            SimConfig::default()
        }
    };

    let store = SimStore::open(db)?;
    store.migrate()?;

    let mut engine = match resume {
        Some(run_id) => SimEngine::load(run_id.to_string(), config, store)?,
        None => {
            let run_id = format!("run-{}", uuid::Uuid::new_v4());
            store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;
            SimEngine::build(run_id, seed, config, store)
        }
    };

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        println!("Logic Clock: clock-runner");
        println!("  run_id:    {}", engine.run_id);
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();

        if resume.is_none() {
            place_demo_clock(&mut engine)?;
        }
        engine.run_ticks(ticks)?;
        engine.save()?;
        print_summary(&engine)?;
    }

    Ok(())
}

/// Place one clock at the origin and configure it the way a user would.
fn place_demo_clock(engine: &mut SimEngine) -> Result<()> {
    engine.apply_command(PlayerCommand::PlaceClock { tile: TilePos::new(0, 0) })?;
    engine.apply_command(PlayerCommand::ConfirmDialog {
        values: FormValues::new().with("up", "5").with("down", "10"),
    })?;
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                engine.run_ticks(scaled_ticks(count, engine.clock.ticks_per_step()))?;
            }
            IpcCommand::GetState => {}
            IpcCommand::Save => {
                engine.save()?;
            }
            IpcCommand::Command { command } => {
                // Rejected input is reported to the client, not fatal.
                if let Err(e) = engine.apply_command(command) {
                    log::warn!("command rejected: {e}");
                    writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                    stdout.flush()?;
                    continue;
                }
            }
        }
        let state = build_ui_state(engine);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    engine.shutdown();
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let dialog = engine.dialogs.current().map(|(_, d)| DialogView {
        title: d.title.clone(),
        description: d.description.clone(),
        fields: d
            .fields
            .iter()
            .map(|f| (f.id.clone(), f.default_value.clone()))
            .collect(),
    });

    let clocks = engine
        .world
        .clocks()
        .map(|(rec, state)| ClockView {
            uid: rec.uid,
            tile: rec.tile,
            high: state.is_emitting_high(),
            up_period: state.up_period().tenths(),
            down_period: state.down_period().tenths(),
            output: engine.output_signal(rec.uid),
        })
        .collect();

    UiState {
        tick: engine.clock.current_tick,
        now: engine.clock.now(),
        paused: engine.clock.paused,
        edit_phase: format!("{:?}", engine.edit_phase()),
        dialog,
        clocks,
    }
}

fn print_summary(engine: &SimEngine) -> Result<()> {
    let transitions = engine.store_event_count("clock_signal_changed")?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {}", engine.run_id);
    println!("  final tick:   {}", engine.clock.current_tick);
    println!("  sim time:     {:.2}s", engine.clock.now());
    println!("  transitions:  {transitions}");
    println!();
    println!("=== CLOCKS ===");
    for (rec, state) in engine.world.clocks() {
        println!(
            "  #{} at {} | up {} | down {} | {}",
            rec.uid,
            rec.tile,
            state.up_period(),
            state.down_period(),
            if state.is_emitting_high() { "HIGH" } else { "low" }
        );
    }
    Ok(())
}

/// Ticks to run for an IPC `tick` request at the current speed.
fn scaled_ticks(count: u64, ticks_per_step: u64) -> u64 {
    count.saturating_mul(ticks_per_step)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
