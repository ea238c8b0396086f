use thiserror::Error;

use crate::graph::CellId;
use crate::value::HolderId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Cell {0:?} is not part of the grid")]
    UnknownCell(CellId),

    #[error("No selection is active")]
    NotActive,

    #[error("A merge is still waiting on {pending} removal(s)")]
    MergeInFlight { pending: usize },

    #[error("Cell {0:?} already holds a value")]
    CellOccupied(CellId),

    #[error("Cell {0:?} has no value to merge")]
    EmptyCell(CellId),

    #[error("Cell {0:?} appears twice in the chain")]
    DuplicateCell(CellId),

    #[error("Holder {0:?} has no pending removal")]
    NotPending(HolderId),

    #[error("A chain needs at least two occupied cells, got {0}")]
    ChainTooShort(usize),

    #[error("Layout has no rows")]
    EmptyLayout,

    #[error("Row {0} has no columns")]
    EmptyRow(usize),

    #[error("Spawn exponent range {min}..={max} is empty")]
    InvalidSpawnRange { min: u32, max: u32 },
}
