//! Entity store: stable uids, a per-layer tile index, and typed component
//! tables keyed by uid.
//!
//! RULE: components are looked up by type, never by name. An entity's
//! capabilities are exactly the tables it has a row in.

use crate::{
    clock_state::ClockState,
    types::{Layer, TilePos, Uid},
    wires::WiredPins,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Clock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub uid:   Uid,
    pub kind:  EntityKind,
    pub tile:  TilePos,
    pub layer: Layer,
}

#[derive(Debug)]
pub struct World {
    next_uid:   Uid,
    running:    bool,
    entities:   BTreeMap<Uid, EntityRecord>,
    tile_index: HashMap<(TilePos, Layer), Uid>,
    clocks:     BTreeMap<Uid, ClockState>,
    pins:       BTreeMap<Uid, WiredPins>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            next_uid:   1,
            running:    true,
            entities:   BTreeMap::new(),
            tile_index: HashMap::new(),
            clocks:     BTreeMap::new(),
            pins:       BTreeMap::new(),
        }
    }

    /// False once the world has been torn down. Lookups then always miss.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Create a bare entity. Returns None if the tile is taken on that layer.
    pub fn spawn(&mut self, kind: EntityKind, tile: TilePos, layer: Layer) -> Option<Uid> {
        if !self.running || self.tile_index.contains_key(&(tile, layer)) {
            return None;
        }
        let uid = self.next_uid;
        self.next_uid += 1;
        self.entities.insert(uid, EntityRecord { uid, kind, tile, layer });
        self.tile_index.insert((tile, layer), uid);
        Some(uid)
    }

    /// Re-create an entity under a uid it held in a saved run.
    /// Later spawns continue above the highest restored uid.
    pub fn restore(&mut self, uid: Uid, kind: EntityKind, tile: TilePos, layer: Layer) -> bool {
        if !self.running
            || self.entities.contains_key(&uid)
            || self.tile_index.contains_key(&(tile, layer))
        {
            return false;
        }
        self.next_uid = self.next_uid.max(uid + 1);
        self.entities.insert(uid, EntityRecord { uid, kind, tile, layer });
        self.tile_index.insert((tile, layer), uid);
        true
    }

    pub fn find(&self, uid: Uid) -> Option<&EntityRecord> {
        if !self.running {
            return None;
        }
        self.entities.get(&uid)
    }

    pub fn entity_at(&self, tile: TilePos, layer: Layer) -> Option<&EntityRecord> {
        let uid = self.tile_index.get(&(tile, layer))?;
        self.find(*uid)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Remove an entity and every component attached to it.
    /// Returns false if it was already gone.
    pub fn try_delete(&mut self, uid: Uid) -> bool {
        let Some(record) = self.entities.remove(&uid) else {
            return false;
        };
        self.tile_index.remove(&(record.tile, record.layer));
        self.clocks.remove(&uid);
        self.pins.remove(&uid);
        log::debug!("world: deleted entity {uid} at {}", record.tile);
        true
    }

    /// Drop every entity and refuse further lookups.
    pub fn tear_down(&mut self) {
        self.running = false;
        self.entities.clear();
        self.tile_index.clear();
        self.clocks.clear();
        self.pins.clear();
    }

    // ── Clock components ──────────────────────────────────────────

    /// Attach a clock component. Ignored if the entity does not exist.
    pub fn insert_clock(&mut self, uid: Uid, clock: ClockState) -> bool {
        if self.find(uid).is_none() {
            return false;
        }
        self.clocks.insert(uid, clock);
        true
    }

    pub fn remove_clock(&mut self, uid: Uid) -> Option<ClockState> {
        self.clocks.remove(&uid)
    }

    pub fn clock(&self, uid: Uid) -> Option<&ClockState> {
        if !self.running {
            return None;
        }
        self.clocks.get(&uid)
    }

    pub fn clock_mut(&mut self, uid: Uid) -> Option<&mut ClockState> {
        if !self.running {
            return None;
        }
        self.clocks.get_mut(&uid)
    }

    // ── Wired pins ────────────────────────────────────────────────

    pub fn insert_pins(&mut self, uid: Uid, pins: WiredPins) -> bool {
        if self.find(uid).is_none() {
            return false;
        }
        self.pins.insert(uid, pins);
        true
    }

    pub fn remove_pins(&mut self, uid: Uid) -> Option<WiredPins> {
        self.pins.remove(&uid)
    }

    pub fn pins(&self, uid: Uid) -> Option<&WiredPins> {
        self.pins.get(&uid)
    }

    pub fn pins_mut(&mut self, uid: Uid) -> Option<&mut WiredPins> {
        self.pins.get_mut(&uid)
    }

    // ── Queries ───────────────────────────────────────────────────

    /// Uids of every entity carrying both a clock and wired pins, ascending.
    pub fn clock_entities(&self) -> Vec<Uid> {
        self.clocks
            .keys()
            .copied()
            .filter(|uid| self.pins.contains_key(uid))
            .collect()
    }

    /// Clock and pins of one entity, borrowed together.
    pub fn clock_and_pins_mut(&mut self, uid: Uid) -> Option<(&mut ClockState, &mut WiredPins)> {
        let clock = self.clocks.get_mut(&uid)?;
        let pins = self.pins.get_mut(&uid)?;
        Some((clock, pins))
    }

    /// Every clock entity with its record and state, ascending uid.
    pub fn clocks(&self) -> impl Iterator<Item = (&EntityRecord, &ClockState)> {
        self.clocks
            .iter()
            .filter_map(|(uid, clock)| self.entities.get(uid).map(|rec| (rec, clock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_not_reused_after_delete() {
        let mut world = World::new();
        let a = world.spawn(EntityKind::Clock, TilePos::new(0, 0), Layer::Wires).unwrap();
        assert!(world.try_delete(a));
        let b = world.spawn(EntityKind::Clock, TilePos::new(0, 0), Layer::Wires).unwrap();

        assert_ne!(a, b);
        assert!(world.find(a).is_none());
        assert!(world.find(b).is_some());
    }

    #[test]
    fn spawn_refuses_occupied_tile_on_same_layer() {
        let mut world = World::new();
        let tile = TilePos::new(2, 3);
        assert!(world.spawn(EntityKind::Clock, tile, Layer::Wires).is_some());
        assert!(world.spawn(EntityKind::Clock, tile, Layer::Wires).is_none());
        assert!(world.spawn(EntityKind::Clock, tile, Layer::Regular).is_some());
    }

    #[test]
    fn delete_drops_components_and_tile_slot() {
        let mut world = World::new();
        let tile = TilePos::new(1, 1);
        let uid = world.spawn(EntityKind::Clock, tile, Layer::Wires).unwrap();
        world.insert_clock(uid, ClockState::default());
        world.insert_pins(uid, WiredPins::default());

        assert!(world.try_delete(uid));
        assert!(!world.try_delete(uid));
        assert!(world.clock(uid).is_none());
        assert!(world.pins(uid).is_none());
        assert!(world.entity_at(tile, Layer::Wires).is_none());
    }

    #[test]
    fn clock_entities_requires_both_components() {
        let mut world = World::new();
        let with_pins = world.spawn(EntityKind::Clock, TilePos::new(0, 0), Layer::Wires).unwrap();
        let without_pins = world.spawn(EntityKind::Clock, TilePos::new(1, 0), Layer::Wires).unwrap();
        world.insert_clock(with_pins, ClockState::default());
        world.insert_pins(with_pins, WiredPins::default());
        world.insert_clock(without_pins, ClockState::default());

        assert_eq!(world.clock_entities(), vec![with_pins]);
    }

    #[test]
    fn torn_down_world_misses_every_lookup() {
        let mut world = World::new();
        let uid = world.spawn(EntityKind::Clock, TilePos::new(0, 0), Layer::Wires).unwrap();
        world.insert_clock(uid, ClockState::default());
        world.tear_down();

        assert!(!world.is_running());
        assert!(world.find(uid).is_none());
        assert!(world.clock(uid).is_none());
        assert!(world.spawn(EntityKind::Clock, TilePos::new(0, 0), Layer::Wires).is_none());
    }
}
