//! The clock building: what a placed clock entity is made of.

use crate::{
    clock_state::ClockState,
    types::{Layer, TilePos, Uid},
    wires::{Direction, PinSlot, WiredPins},
    world::{EntityKind, World},
};

pub struct ClockBuilding;

impl ClockBuilding {
    pub const NAME: &'static str = "Clock";
    pub const DESCRIPTION: &'static str = "Activates the wire given a certain interval";
    pub const LAYER: Layer = Layer::Wires;

    /// Output pin index the clock writes its signal into.
    pub const OUTPUT_SLOT: usize = 0;

    /// Spawn a clock at `tile` and attach its components.
    /// Returns None if the tile is already occupied on the wires layer.
    pub fn place(world: &mut World, tile: TilePos) -> Option<Uid> {
        let uid = world.spawn(EntityKind::Clock, tile, Self::LAYER)?;
        Self::setup_components(world, uid, ClockState::default());
        Some(uid)
    }

    pub(crate) fn setup_components(world: &mut World, uid: Uid, clock: ClockState) {
        world.insert_pins(
            uid,
            WiredPins::new(vec![PinSlot::ejector((0, 0), Direction::Top)]),
        );
        world.insert_clock(uid, clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wires::PinSlotType;

    #[test]
    fn placed_clock_has_default_state_and_one_ejector() {
        let mut world = World::new();
        let uid = ClockBuilding::place(&mut world, TilePos::new(4, -2)).unwrap();

        assert_eq!(world.clock(uid), Some(&ClockState::default()));
        let pins = world.pins(uid).unwrap();
        assert_eq!(pins.slots.len(), 1);
        assert_eq!(pins.slots[0].kind, PinSlotType::LogicalEjector);
        assert_eq!(pins.slots[0].direction, Direction::Top);
        assert_eq!(world.find(uid).unwrap().layer, Layer::Wires);
    }

    #[test]
    fn placing_on_occupied_tile_fails() {
        let mut world = World::new();
        let tile = TilePos::new(0, 0);
        assert!(ClockBuilding::place(&mut world, tile).is_some());
        assert!(ClockBuilding::place(&mut world, tile).is_none());
        assert_eq!(world.entity_count(), 1);
    }
}
