use crate::{
    clock::SimSpeed,
    dialog::FormValues,
    types::{MouseButton, TilePos, Uid},
};
use serde::{Deserialize, Serialize};

/// All player-issued commands.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: SimSpeed },

    // ── Building ──────────────────────────────────
    PlaceClock { tile: TilePos },
    RemoveEntity { uid: Uid },
    ClickTile { tile: TilePos, button: MouseButton },

    // ── Dialog ────────────────────────────────────
    ConfirmDialog {
        #[serde(default)]
        values: FormValues,
    },
    CancelDialog,
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            PlayerCommand::Pause => "pause",
            PlayerCommand::Resume => "resume",
            PlayerCommand::SetSpeed { .. } => "set_speed",
            PlayerCommand::PlaceClock { .. } => "place_clock",
            PlayerCommand::RemoveEntity { .. } => "remove_entity",
            PlayerCommand::ClickTile { .. } => "click_tile",
            PlayerCommand::ConfirmDialog { .. } => "confirm_dialog",
            PlayerCommand::CancelDialog => "cancel_dialog",
        }
    }
}
