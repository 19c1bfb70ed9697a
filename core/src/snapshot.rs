//! Snapshot serialization: simulation state to and from JSON.
//!
//! A snapshot is taken every `snapshot_interval` ticks and on explicit save.
//! It captures everything needed to resume the run from that tick.

use crate::{
    clock::SimClock,
    clock_state::PersistedClock,
    types::{Layer, RunId, Tick, TilePos, Uid},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick:   Tick,
    pub clock:  SimClock,
    pub clocks: Vec<SavedClockEntity>,
}

/// One clock entity as saved: identity, placement, and persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedClockEntity {
    pub uid:   Uid,
    pub tile:  TilePos,
    pub layer: Layer,
    pub state: PersistedClock,
}
