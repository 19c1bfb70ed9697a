//! Clock scheduler. Flips every clock's output when its active period
//! has elapsed.
//!
//! Each clock is a free-running two-state machine {High, Low}:
//!   High --(elapsed >= up/10)--> Low,   writes Off to slot 0
//!   Low  --(elapsed >= down/10)--> High, writes On to slot 0
//! A failed slot write leaves the clock untouched for that tick.

use crate::{
    building::ClockBuilding,
    clock_edit::{EditMode, EditRequest},
    error::SimResult,
    event::SimEvent,
    subsystem::{SimSubsystem, TickContext},
    types::{Tick, Uid},
    wires::Signal,
    world::{EntityKind, World},
};

/// Float slack when comparing elapsed time against a period, so a tick
/// landing exactly on the boundary counts as having reached it.
pub const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Default)]
pub struct ClockScheduler {
    transitions: u64,
}

impl ClockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total level flips since the scheduler was created.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Run one scheduler pass at simulation time `now`.
    pub fn step(&mut self, tick: Tick, now: f64, world: &mut World) -> Vec<SimEvent> {
        let mut events = Vec::new();

        for uid in world.clock_entities() {
            let Some((clock, pins)) = world.clock_and_pins_mut(uid) else {
                continue;
            };

            let elapsed = now - clock.last_transition_time();
            if elapsed + TIME_EPSILON < clock.active_period().as_seconds() {
                continue;
            }
            let signal = Signal::from(!clock.is_emitting_high());

            // No flip without a successful write. The guard stays true, so
            // the next tick tries again.
            if let Err(e) = pins.write(ClockBuilding::OUTPUT_SLOT, signal) {
                log::debug!("tick={tick} clock: entity {uid} output skipped: {e}");
                continue;
            }

            clock.flip(now);
            self.transitions += 1;
            events.push(SimEvent::ClockSignalChanged { tick, uid, signal, at: now });
        }

        events
    }
}

impl SimSubsystem for ClockScheduler {
    fn name(&self) -> &'static str { "clock" }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> SimResult<Vec<SimEvent>> {
        let events = self.step(ctx.tick, ctx.now, ctx.world);
        if !events.is_empty() {
            log::trace!("tick={} clock: {} transitions", ctx.tick, events.len());
        }
        Ok(events)
    }

    fn on_entity_placed(&mut self, uid: Uid, kind: EntityKind) -> Option<EditRequest> {
        match kind {
            EntityKind::Clock => Some(EditRequest { uid, mode: EditMode::DeleteOnCancel }),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TilePos;

    #[test]
    fn placement_requests_delete_on_cancel_edit() {
        let mut scheduler = ClockScheduler::new();
        let request = scheduler.on_entity_placed(7, EntityKind::Clock);
        assert_eq!(request, Some(EditRequest { uid: 7, mode: EditMode::DeleteOnCancel }));
    }

    #[test]
    fn first_flip_goes_high_after_down_period() {
        let mut world = World::new();
        let uid = ClockBuilding::place(&mut world, TilePos::new(0, 0)).unwrap();
        let mut scheduler = ClockScheduler::new();

        assert!(scheduler.step(1, 0.05, &mut world).is_empty());
        let events = scheduler.step(2, 0.1, &mut world);

        assert_eq!(events.len(), 1);
        assert!(world.clock(uid).unwrap().is_emitting_high());
        assert_eq!(world.pins(uid).unwrap().value(0), Some(Signal::On));
        assert_eq!(scheduler.transitions(), 1);
    }

    #[test]
    fn missing_output_slot_blocks_the_flip() {
        let mut world = World::new();
        let uid = ClockBuilding::place(&mut world, TilePos::new(0, 0)).unwrap();
        world.pins_mut(uid).unwrap().slots.clear();
        let mut scheduler = ClockScheduler::new();

        assert!(scheduler.step(1, 5.0, &mut world).is_empty());
        assert_eq!(world.clock(uid), Some(&crate::clock_state::ClockState::default()));
        assert_eq!(scheduler.transitions(), 0);
    }
}
