//! Subsystem trait and registry.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every tick.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    clock_edit::EditRequest,
    error::SimResult,
    event::SimEvent,
    types::{Tick, Uid},
    world::{EntityKind, World},
};
use std::any::Any;

/// Everything a subsystem may read or touch during one tick.
pub struct TickContext<'a> {
    /// The current tick number.
    pub tick:      Tick,
    /// Simulation time in seconds at this tick.
    pub now:       f64,
    /// Events emitted by earlier subsystems this tick.
    pub events_in: &'a [SimEvent],
    pub world:     &'a mut World,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    /// Returns a vec of new events to add to the tick's event log.
    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<Vec<SimEvent>>;

    /// Placement listener. Called once for every newly placed entity,
    /// outside the tick loop. A subsystem may answer with an edit request,
    /// which the engine routes to the edit flow.
    fn on_entity_placed(&mut self, _uid: Uid, _kind: EntityKind) -> Option<EditRequest> {
        None
    }

    /// For downcasting in tests and tooling only.
    /// Production sim code never uses this.
    fn as_any(&self) -> &dyn Any;
}
