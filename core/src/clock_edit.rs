//! Clock edit flow: the dialog-driven protocol for changing a clock's
//! up/down periods.
//!
//! Phases: Idle → Opening → AwaitingInput → {Committing | Cancelling} → Idle.
//!
//! RULES:
//!   - At most one dialog open at a time. Further requests queue FIFO and
//!     are opened when the current dialog resolves.
//!   - The flow holds only the entity uid, never a reference into the world.
//!     The world is passed in at open and resolve time and the entity is
//!     re-resolved every time.
//!   - ClockState is untouched while the dialog is open. Commit writes both
//!     periods in a single call.
//!   - Stale references (world torn down, entity gone, clock removed) are
//!     silent no-ops.

use crate::{
    clock_state::Period,
    config::DialogTextConfig,
    dialog::{Dialog, DialogButton, DialogHost, DialogOutcome, DialogTicket, FormField, FormValues},
    error::{SimError, SimResult},
    event::SimEvent,
    types::{Layer, MouseButton, Tick, TilePos, Uid},
    world::World,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const UP_FIELD: &str = "up";
pub const DOWN_FIELD: &str = "down";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Newly placed clock: cancelling removes it again.
    DeleteOnCancel,
    /// Existing clock: cancelling changes nothing.
    KeepOnCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRequest {
    pub uid:  Uid,
    pub mode: EditMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Idle,
    Opening,
    AwaitingInput,
    Committing,
    Cancelling,
}

#[derive(Debug)]
pub enum ClickResponse {
    /// A dialog was opened or queued; the click must not propagate.
    Handled(Vec<SimEvent>),
    Propagate,
}

#[derive(Debug)]
struct EditSession {
    request: EditRequest,
    ticket:  DialogTicket,
}

fn accepts_period(value: &str) -> bool {
    value.parse::<Period>().is_ok()
}

#[derive(Debug)]
pub struct ClockEditFlow {
    text:    DialogTextConfig,
    phase:   EditPhase,
    session: Option<EditSession>,
    queue:   VecDeque<EditRequest>,
}

impl ClockEditFlow {
    pub fn new(text: DialogTextConfig) -> Self {
        Self {
            text,
            phase: EditPhase::Idle,
            session: None,
            queue: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// The request whose dialog is currently open.
    pub fn editing(&self) -> Option<EditRequest> {
        self.session.as_ref().map(|s| s.request)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Start editing a clock, or queue the request behind the open dialog.
    pub fn request(
        &mut self,
        request: EditRequest,
        tick: Tick,
        world: &World,
        dialogs: &mut DialogHost,
    ) -> Vec<SimEvent> {
        let already_pending = self.editing().map(|r| r.uid) == Some(request.uid)
            || self.queue.iter().any(|r| r.uid == request.uid);
        if already_pending {
            log::debug!("tick={tick} clock-edit: entity {} already pending, ignoring", request.uid);
            return vec![];
        }

        if self.phase != EditPhase::Idle {
            log::debug!("tick={tick} clock-edit: dialog busy, queueing entity {}", request.uid);
            self.queue.push_back(request);
            return vec![];
        }

        self.open(request, tick, world, dialogs).into_iter().collect()
    }

    /// Pointer-down on a tile. Only a primary click on a wires-layer clock
    /// is consumed.
    pub fn handle_click(
        &mut self,
        tile: TilePos,
        button: MouseButton,
        tick: Tick,
        world: &World,
        dialogs: &mut DialogHost,
    ) -> ClickResponse {
        let Some(entity) = world.entity_at(tile, Layer::Wires) else {
            return ClickResponse::Propagate;
        };
        if world.clock(entity.uid).is_none() || button != MouseButton::Left {
            return ClickResponse::Propagate;
        }

        let request = EditRequest { uid: entity.uid, mode: EditMode::KeepOnCancel };
        ClickResponse::Handled(self.request(request, tick, world, dialogs))
    }

    /// Press "ok" with the given field values.
    ///
    /// Values failing a field validator are rejected with
    /// `SimError::Validation`; the dialog stays open and nothing changes.
    pub fn confirm(
        &mut self,
        values: &FormValues,
        tick: Tick,
        world: &mut World,
        dialogs: &mut DialogHost,
    ) -> SimResult<Vec<SimEvent>> {
        let ticket = self.open_ticket()?;
        let outcome = dialogs.submit(ticket, values).map_err(|e| {
            log::warn!("tick={tick} clock-edit: {e}");
            e
        })?;
        Ok(self.resolve(outcome, tick, world, dialogs))
    }

    /// Press "cancel".
    pub fn cancel(
        &mut self,
        tick: Tick,
        world: &mut World,
        dialogs: &mut DialogHost,
    ) -> SimResult<Vec<SimEvent>> {
        let ticket = self.open_ticket()?;
        let outcome = dialogs.cancel(ticket)?;
        Ok(self.resolve(outcome, tick, world, dialogs))
    }

    fn open_ticket(&self) -> SimResult<DialogTicket> {
        match (&self.session, self.phase) {
            (Some(session), EditPhase::AwaitingInput) => Ok(session.ticket),
            _ => Err(SimError::NoDialogOpen),
        }
    }

    fn open(
        &mut self,
        request: EditRequest,
        tick: Tick,
        world: &World,
        dialogs: &mut DialogHost,
    ) -> Option<SimEvent> {
        self.phase = EditPhase::Opening;

        let Some(clock) = world.clock(request.uid) else {
            log::debug!("tick={tick} clock-edit: entity {} has no clock, not opening", request.uid);
            self.phase = EditPhase::Idle;
            return None;
        };

        let dialog = Dialog {
            title: self.text.title.clone(),
            description: self.text.description.clone(),
            fields: vec![
                FormField::new(UP_FIELD, &self.text.up_placeholder, clock.up_period().to_string(), accepts_period),
                FormField::new(DOWN_FIELD, &self.text.down_placeholder, clock.down_period().to_string(), accepts_period),
            ],
            buttons: vec![
                DialogButton::parse("cancel:bad:escape"),
                DialogButton::parse("ok:good:enter"),
            ],
            close_button: false,
        };

        let ticket = dialogs.show(dialog);
        self.session = Some(EditSession { request, ticket });
        self.phase = EditPhase::AwaitingInput;

        log::info!("tick={tick} clock-edit: editing entity {} ({:?})", request.uid, request.mode);
        Some(SimEvent::ClockEditOpened { tick, uid: request.uid, mode: request.mode })
    }

    /// Consume the open session with its outcome, then serve the queue.
    fn resolve(
        &mut self,
        outcome: DialogOutcome,
        tick: Tick,
        world: &mut World,
        dialogs: &mut DialogHost,
    ) -> Vec<SimEvent> {
        let Some(session) = self.session.take() else {
            self.phase = EditPhase::Idle;
            return vec![];
        };

        let mut events = match outcome {
            DialogOutcome::Confirmed(values) => {
                self.phase = EditPhase::Committing;
                vec![Self::commit(session.request, &values, tick, world)]
            }
            DialogOutcome::Cancelled => {
                self.phase = EditPhase::Cancelling;
                Self::cancel_edit(session.request, tick, world)
            }
        };
        self.phase = EditPhase::Idle;

        while let Some(next) = self.queue.pop_front() {
            if let Some(opened) = self.open(next, tick, world, dialogs) {
                events.push(opened);
                break;
            }
        }
        events
    }

    fn commit(request: EditRequest, values: &FormValues, tick: Tick, world: &mut World) -> SimEvent {
        let uid = request.uid;
        let discarded = SimEvent::ClockEditDiscarded { tick, uid };

        if !world.is_running() || world.find(uid).is_none() {
            log::debug!("tick={tick} clock-edit: entity {uid} is gone, discarding edit");
            return discarded;
        }

        let up = values.get(UP_FIELD).map(str::parse::<Period>);
        let down = values.get(DOWN_FIELD).map(str::parse::<Period>);
        let (Some(Ok(up)), Some(Ok(down))) = (up, down) else {
            log::warn!("tick={tick} clock-edit: invalid periods for entity {uid}, discarding edit");
            return discarded;
        };

        let Some(clock) = world.clock_mut(uid) else {
            log::debug!("tick={tick} clock-edit: entity {uid} lost its clock, discarding edit");
            return discarded;
        };
        clock.set_periods(up, down);

        log::info!("tick={tick} clock-edit: entity {uid} set to up={up} down={down}");
        SimEvent::ClockPeriodsUpdated {
            tick,
            uid,
            up_period: up.tenths(),
            down_period: down.tenths(),
        }
    }

    fn cancel_edit(request: EditRequest, tick: Tick, world: &mut World) -> Vec<SimEvent> {
        let uid = request.uid;
        let still_a_clock = world.find(uid).is_some() && world.clock(uid).is_some();

        let deleted = match request.mode {
            EditMode::KeepOnCancel => false,
            EditMode::DeleteOnCancel if still_a_clock => world.try_delete(uid),
            EditMode::DeleteOnCancel => {
                log::debug!("tick={tick} clock-edit: entity {uid} already gone on cancel");
                false
            }
        };

        let mut events = vec![SimEvent::ClockEditCancelled { tick, uid, deleted }];
        if deleted {
            log::info!("tick={tick} clock-edit: placement of entity {uid} cancelled, removed");
            events.push(SimEvent::EntityRemoved { tick, uid });
        }
        events
    }
}
