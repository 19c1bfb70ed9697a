use crate::{
    clock_edit::EditMode,
    types::{RunId, Tick, TilePos, Uid},
    wires::Signal,
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    RunLoaded {
        run_id: RunId,
        tick: Tick,
        clocks: usize,
    },

    // ── Player command events ──────────────────────
    PlayerCommandReceived {
        tick: Tick,
        command_id: i64,
        command_type: String,
    },

    // ── Placement ──────────────────────────────────
    ClockPlaced {
        tick: Tick,
        uid: Uid,
        tile: TilePos,
    },
    EntityRemoved {
        tick: Tick,
        uid: Uid,
    },

    // ── Clock signal ───────────────────────────────
    ClockSignalChanged {
        tick: Tick,
        uid: Uid,
        signal: Signal,
        at: f64,
    },

    // ── Clock editing ──────────────────────────────
    ClockEditOpened {
        tick: Tick,
        uid: Uid,
        mode: EditMode,
    },
    ClockPeriodsUpdated {
        tick: Tick,
        uid: Uid,
        up_period: i32,
        down_period: i32,
    },
    ClockEditCancelled {
        tick: Tick,
        uid: Uid,
        deleted: bool,
    },
    ClockEditDiscarded {
        tick: Tick,
        uid: Uid,
    },
}

impl SimEvent {
    /// Stable name of the variant.
    /// Used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::TickStarted { .. }           => "tick_started",
            SimEvent::TickCompleted { .. }         => "tick_completed",
            SimEvent::RunInitialized { .. }        => "run_initialized",
            SimEvent::RunLoaded { .. }             => "run_loaded",
            SimEvent::PlayerCommandReceived { .. } => "player_command_received",
            SimEvent::ClockPlaced { .. }           => "clock_placed",
            SimEvent::EntityRemoved { .. }         => "entity_removed",
            SimEvent::ClockSignalChanged { .. }    => "clock_signal_changed",
            SimEvent::ClockEditOpened { .. }       => "clock_edit_opened",
            SimEvent::ClockPeriodsUpdated { .. }   => "clock_periods_updated",
            SimEvent::ClockEditCancelled { .. }    => "clock_edit_cancelled",
            SimEvent::ClockEditDiscarded { .. }    => "clock_edit_discarded",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
