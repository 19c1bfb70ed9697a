//! The simulation engine: tick loop, command dispatch, event log, snapshots.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Clock scheduler
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - Player commands (placement, clicks, dialog buttons) are applied
//!     between ticks, never during one.
//!   - No subsystem calls the edit flow directly; placement requests are
//!     routed through the engine.
//!   - All state changes are recorded in the event log.

use crate::{
    building::ClockBuilding,
    clock::SimClock,
    clock_edit::{ClickResponse, ClockEditFlow, EditPhase, EditRequest},
    clock_state::ClockState,
    clock_subsystem::ClockScheduler,
    command::PlayerCommand,
    config::SimConfig,
    dialog::{DialogHost, FormValues},
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    snapshot::{SavedClockEntity, SimSnapshot},
    store::SimStore,
    subsystem::{SimSubsystem, TickContext},
    types::{MouseButton, RunId, Tick, TilePos, Uid},
    wires::Signal,
    world::{EntityKind, World},
};

pub struct SimEngine {
    pub run_id:  RunId,
    pub clock:   SimClock,
    pub config:  SimConfig,
    pub world:   World,
    pub dialogs: DialogHost,
    seed:        u64,
    initialized: bool,
    subsystems:  Vec<Box<dyn SimSubsystem>>,
    editor:      ClockEditFlow,
    store:       SimStore,
}

impl SimEngine {
    pub fn new(run_id: RunId, seed: u64, config: SimConfig, store: SimStore) -> Self {
        Self {
            clock:       SimClock::new(run_id.clone(), config.tick_seconds),
            world:       World::new(),
            dialogs:     DialogHost::new(),
            seed,
            initialized: false,
            subsystems:  Vec::new(),
            editor:      ClockEditFlow::new(config.dialog.clone()),
            store,
            config,
            run_id,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, config: SimConfig, store: SimStore) -> Self {
        let mut engine = SimEngine::new(run_id, seed, config, store);

        // EXECUTION ORDER is fixed. Never reorder.
        engine.register(Box::new(ClockScheduler::new()));
        engine
    }

    /// Fully wired engine over a fresh in-memory store and test config.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "0.1.0-test")?;
        Ok(Self::build(run_id, seed, SimConfig::default_test(), store))
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push(subsystem);
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let current_tick = self.clock.advance();
        let now = self.clock.now();
        let mut tick_events: Vec<SimEvent> = vec![
            SimEvent::TickStarted { tick: current_tick }
        ];

        // Each subsystem sees all events emitted so far this tick.
        for subsystem in &mut self.subsystems {
            let mut ctx = TickContext {
                tick:      current_tick,
                now,
                events_in: &tick_events,
                world:     &mut self.world,
            };
            let new_events = subsystem.update(&mut ctx)?;
            append_events(&self.store, &self.run_id, current_tick, subsystem.name(), &new_events)?;
            tick_events.extend(new_events);
        }

        tick_events.push(SimEvent::TickCompleted { tick: current_tick });

        let interval = self.config.snapshot_interval;
        if interval > 0 && current_tick.is_multiple_of(interval) {
            self.save()?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        self.ensure_initialized()?;
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Emit RunInitialized once, before anything else is logged.
    fn ensure_initialized(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        let init_event = SimEvent::RunInitialized {
            run_id: self.run_id.clone(),
            seed: self.seed,
        };
        append_events(&self.store, &self.run_id, self.clock.current_tick, "engine", &[init_event])
    }

    // ── Player commands ────────────────────────────────────────

    /// Record and apply one player command between ticks.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        self.ensure_initialized()?;
        let tick = self.clock.current_tick;
        let command_id = self.store.store_player_command(&self.run_id, tick, &command)?;
        let received = SimEvent::PlayerCommandReceived {
            tick,
            command_id,
            command_type: command.type_name().to_string(),
        };
        append_events(&self.store, &self.run_id, tick, "command", std::slice::from_ref(&received))?;

        let mut events = vec![received];
        match command {
            PlayerCommand::Pause => self.clock.pause(),
            PlayerCommand::Resume => self.clock.resume(),
            PlayerCommand::SetSpeed { speed } => self.clock.set_speed(speed),
            PlayerCommand::PlaceClock { tile } => {
                let (_, placed) = self.place_clock(tile)?;
                events.extend(placed);
            }
            PlayerCommand::RemoveEntity { uid } => {
                events.extend(self.remove_entity(uid)?);
            }
            PlayerCommand::ClickTile { tile, button } => {
                if let ClickResponse::Handled(opened) = self.click_tile(tile, button)? {
                    events.extend(opened);
                }
            }
            PlayerCommand::ConfirmDialog { values } => {
                events.extend(self.confirm_dialog(&values)?);
            }
            PlayerCommand::CancelDialog => {
                events.extend(self.cancel_dialog()?);
            }
        }
        Ok(events)
    }

    /// Place a clock building and fire the placement listeners.
    pub fn place_clock(&mut self, tile: TilePos) -> SimResult<(Uid, Vec<SimEvent>)> {
        let tick = self.clock.current_tick;
        let uid = ClockBuilding::place(&mut self.world, tile).ok_or(SimError::TileOccupied {
            tile,
            layer: ClockBuilding::LAYER,
        })?;
        log::info!("tick={tick} engine: placed clock {uid} at {tile}");

        let mut events = vec![SimEvent::ClockPlaced { tick, uid, tile }];
        append_events(&self.store, &self.run_id, tick, "engine", &events)?;

        let requests: Vec<EditRequest> = self
            .subsystems
            .iter_mut()
            .filter_map(|s| s.on_entity_placed(uid, EntityKind::Clock))
            .collect();
        for request in requests {
            events.extend(self.request_edit(request)?);
        }
        Ok((uid, events))
    }

    /// Pointer-down on a tile. `Handled` means the click was consumed.
    pub fn click_tile(&mut self, tile: TilePos, button: MouseButton) -> SimResult<ClickResponse> {
        let tick = self.clock.current_tick;
        let response = self.editor.handle_click(tile, button, tick, &self.world, &mut self.dialogs);
        if let ClickResponse::Handled(events) = &response {
            append_events(&self.store, &self.run_id, tick, "clock_edit", events)?;
        }
        Ok(response)
    }

    /// Open (or queue) an edit dialog for a clock.
    pub fn request_edit(&mut self, request: EditRequest) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let events = self.editor.request(request, tick, &self.world, &mut self.dialogs);
        append_events(&self.store, &self.run_id, tick, "clock_edit", &events)?;
        Ok(events)
    }

    pub fn confirm_dialog(&mut self, values: &FormValues) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let events = self.editor.confirm(values, tick, &mut self.world, &mut self.dialogs)?;
        append_events(&self.store, &self.run_id, tick, "clock_edit", &events)?;
        Ok(events)
    }

    pub fn cancel_dialog(&mut self) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let events = self.editor.cancel(tick, &mut self.world, &mut self.dialogs)?;
        append_events(&self.store, &self.run_id, tick, "clock_edit", &events)?;
        Ok(events)
    }

    pub fn remove_entity(&mut self, uid: Uid) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        if !self.world.try_delete(uid) {
            return Err(SimError::EntityNotFound { uid });
        }
        let events = vec![SimEvent::EntityRemoved { tick, uid }];
        append_events(&self.store, &self.run_id, tick, "engine", &events)?;
        Ok(events)
    }

    /// Tear the world down. Pending dialog callbacks become no-ops.
    pub fn shutdown(&mut self) {
        log::info!("tick={} engine: shutting down run {}", self.clock.current_tick, self.run_id);
        self.world.tear_down();
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn edit_phase(&self) -> EditPhase {
        self.editor.phase()
    }

    pub fn editor(&self) -> &ClockEditFlow {
        &self.editor
    }

    pub fn clock_state(&self, uid: Uid) -> Option<&ClockState> {
        self.world.clock(uid)
    }

    /// Signal currently sitting in a clock's output slot.
    pub fn output_signal(&self, uid: Uid) -> Option<Signal> {
        self.world.pins(uid)?.value(ClockBuilding::OUTPUT_SLOT)
    }

    /// Query the ClockScheduler registered with this engine.
    pub fn scheduler(&self) -> Option<&ClockScheduler> {
        self.subsystems
            .iter()
            .find_map(|sub| sub.as_any().downcast_ref::<ClockScheduler>())
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    pub fn store_event_count(&self, event_type: &str) -> SimResult<i64> {
        self.store.event_count(&self.run_id, event_type)
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    /// Hand the store back, e.g. to resume the run with `load`.
    pub fn into_store(self) -> SimStore {
        self.store
    }

    // ── Save / load ────────────────────────────────────────────

    /// Write a snapshot of the clock and every clock entity. Returns its id.
    pub fn save(&self) -> SimResult<i64> {
        let tick = self.clock.current_tick;
        let snapshot = SimSnapshot {
            run_id: self.run_id.clone(),
            tick,
            clock:  self.clock.clone(),
            clocks: self
                .world
                .clocks()
                .map(|(rec, state)| SavedClockEntity {
                    uid:   rec.uid,
                    tile:  rec.tile,
                    layer: rec.layer,
                    state: state.to_persisted(),
                })
                .collect(),
        };
        let json = serde_json::to_string(&snapshot)?;
        let snapshot_id = self.store.save_snapshot(&self.run_id, tick, &json)?;
        self.store.insert_clock_rows(snapshot_id, &snapshot.clocks)?;
        log::debug!("Snapshot saved at tick {tick} ({} clocks)", snapshot.clocks.len());
        Ok(snapshot_id)
    }

    /// Resume a run from its latest snapshot.
    ///
    /// Each clock's flip timer restarts at the restored simulation time,
    /// and its output slot is rewritten to match the saved level.
    pub fn load(run_id: RunId, config: SimConfig, store: SimStore) -> SimResult<Self> {
        let (_, tick, json) = store
            .latest_snapshot(&run_id)?
            .ok_or_else(|| SimError::SnapshotNotFound { run_id: run_id.clone() })?;
        let snapshot: SimSnapshot = serde_json::from_str(&json)?;
        let seed = store.run_seed(&run_id)?.unwrap_or_default();

        let mut engine = SimEngine::build(run_id, seed, config, store);
        engine.initialized = true;
        engine.clock = snapshot.clock;
        engine.clock.pause();
        let now = engine.clock.now();

        for saved in &snapshot.clocks {
            if !engine.world.restore(saved.uid, EntityKind::Clock, saved.tile, saved.layer) {
                log::warn!("load: skipping clock {} at occupied tile {}", saved.uid, saved.tile);
                continue;
            }
            ClockBuilding::setup_components(
                &mut engine.world,
                saved.uid,
                ClockState::from_persisted(&saved.state, now),
            );
            if let Some(pins) = engine.world.pins_mut(saved.uid) {
                if let Err(e) = pins.write(ClockBuilding::OUTPUT_SLOT, saved.state.is_emitting_high.into()) {
                    log::debug!("load: clock {} output not restored: {e}", saved.uid);
                }
            }
        }

        let loaded = SimEvent::RunLoaded {
            run_id: engine.run_id.clone(),
            tick,
            clocks: snapshot.clocks.len(),
        };
        append_events(&engine.store, &engine.run_id, tick, "engine", &[loaded])?;
        log::info!("Loaded run {} at tick {tick} with {} clocks", engine.run_id, snapshot.clocks.len());
        Ok(engine)
    }
}

/// Persist each event to the log.
fn append_events(
    store: &SimStore,
    run_id: &str,
    tick: Tick,
    subsystem: &str,
    events: &[SimEvent],
) -> SimResult<()> {
    for event in events {
        let entry = EventLogEntry {
            id:         None,
            run_id:     run_id.to_string(),
            tick,
            subsystem:  subsystem.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        store.append_event(&entry)?;
    }
    Ok(())
}
