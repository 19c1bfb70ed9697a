//! Wire output pins. The clock only writes into its own slot; propagation
//! across the wire network belongs to the host and is not modelled here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boolean signal token written into a pin slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    On,
    Off,
}

impl From<bool> for Signal {
    fn from(high: bool) -> Self {
        if high { Signal::On } else { Signal::Off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinSlotType {
    LogicalEjector,
    LogicalAcceptor,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("pin slot {0} does not exist")]
    NoSuchSlot(usize),

    #[error("pin slot {0} is detached")]
    SlotDetached(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinSlot {
    /// Offset from the entity origin, in tiles.
    pub pos:       (i32, i32),
    pub direction: Direction,
    pub kind:      PinSlotType,
    pub value:     Option<Signal>,
    pub attached:  bool,
}

impl PinSlot {
    pub fn ejector(pos: (i32, i32), direction: Direction) -> Self {
        Self {
            pos,
            direction,
            kind: PinSlotType::LogicalEjector,
            value: None,
            attached: true,
        }
    }
}

/// The wired-pins component of an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WiredPins {
    pub slots: Vec<PinSlot>,
}

impl WiredPins {
    pub fn new(slots: Vec<PinSlot>) -> Self {
        Self { slots }
    }

    pub fn write(&mut self, slot: usize, signal: Signal) -> Result<(), WireError> {
        let pin = self.slots.get_mut(slot).ok_or(WireError::NoSuchSlot(slot))?;
        if !pin.attached {
            return Err(WireError::SlotDetached(slot));
        }
        pin.value = Some(signal);
        Ok(())
    }

    pub fn value(&self, slot: usize) -> Option<Signal> {
        self.slots.get(slot).and_then(|p| p.value)
    }

    pub fn set_attached(&mut self, slot: usize, attached: bool) {
        if let Some(pin) = self.slots.get_mut(slot) {
            pin.attached = attached;
        }
    }
}
