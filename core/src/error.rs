use thiserror::Error;

use crate::{dialog::ValidationError, types::Uid};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dialog input rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Entity {uid} not found")]
    EntityNotFound { uid: Uid },

    #[error("Tile {tile} is already occupied on the {layer:?} layer")]
    TileOccupied { tile: crate::types::TilePos, layer: crate::types::Layer },

    #[error("No dialog is open")]
    NoDialogOpen,

    #[error("No snapshot found for run '{run_id}'")]
    SnapshotNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
