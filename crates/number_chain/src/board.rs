use std::fmt::{self, Display, Formatter};

use bevy::log::warn;
use bevy::utils::HashMap;

use crate::direction::Direction;
use crate::error::ChainError;
use crate::graph::{CellGraph, CellId};
use crate::spawner::ValueSpawner;
use crate::topology::{Grid, GridLayout, build_grid};
use crate::value::{HolderId, ValueHolder};

/// Grid topology plus the value holders currently sitting in its cells.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    holders: HashMap<HolderId, ValueHolder>,
    occupants: HashMap<CellId, HolderId>,
    locations: HashMap<HolderId, CellId>,
    next_holder: u64,
}

impl Board {
    pub fn empty(layout: &GridLayout) -> Result<Self, ChainError> {
        Ok(Self::from_grid(build_grid(layout)?))
    }

    /// Builds the grid and fills every cell from `spawner`.
    pub fn new(layout: &GridLayout, spawner: &mut impl ValueSpawner) -> Result<Self, ChainError> {
        let mut board = Self::empty(layout)?;
        board.fill_empty(spawner);
        Ok(board)
    }

    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            holders: HashMap::default(),
            occupants: HashMap::default(),
            locations: HashMap::default(),
            next_holder: 0,
        }
    }

    /// Builds a board from explicit raw values, row by row. `0` leaves a cell empty.
    pub fn from_values(rows: &[&[u32]]) -> Result<Self, ChainError> {
        let layout = GridLayout::new(rows.iter().map(|row| row.len() as u32).collect());
        let mut board = Self::empty(&layout)?;
        for (row, values) in rows.iter().enumerate() {
            for (column, &raw) in values.iter().enumerate() {
                if raw == 0 {
                    continue;
                }
                if let Some(cell) = board.grid.cell_at(row, column) {
                    board.place(cell, raw)?;
                }
            }
        }
        Ok(board)
    }

    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    pub const fn graph(&self) -> &CellGraph {
        self.grid.graph()
    }

    pub(crate) const fn graph_mut(&mut self) -> &mut CellGraph {
        self.grid.graph_mut()
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.grid.contains(cell)
    }

    pub fn occupant(&self, cell: CellId) -> Option<HolderId> {
        self.occupants.get(&cell).copied()
    }

    pub fn is_occupied(&self, cell: CellId) -> bool {
        self.occupants.contains_key(&cell)
    }

    pub fn holder(&self, id: HolderId) -> Option<&ValueHolder> {
        self.holders.get(&id)
    }

    pub(crate) fn holder_mut(&mut self, id: HolderId) -> Option<&mut ValueHolder> {
        self.holders.get_mut(&id)
    }

    pub fn holder_at(&self, cell: CellId) -> Option<&ValueHolder> {
        self.occupant(cell).and_then(|id| self.holder(id))
    }

    pub fn location(&self, id: HolderId) -> Option<CellId> {
        self.locations.get(&id).copied()
    }

    pub fn raw_at(&self, cell: CellId) -> Option<u32> {
        self.holder_at(cell).map(ValueHolder::raw)
    }

    /// Quantized value at `cell`; `None` when the cell is empty.
    pub fn value_at(&self, cell: CellId) -> Option<u32> {
        self.holder_at(cell).and_then(ValueHolder::quantized)
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn has_occupied_neighbor(&self, cell: CellId, direction: Direction) -> bool {
        self.graph()
            .neighbor(cell, direction)
            .is_some_and(|neighbor| self.is_occupied(neighbor))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.grid
            .rows()
            .flatten()
            .copied()
            .filter(|cell| self.contains(*cell) && !self.is_occupied(*cell))
    }

    /// Puts a new holder into an empty cell.
    pub fn place(&mut self, cell: CellId, raw: u32) -> Result<HolderId, ChainError> {
        if !self.contains(cell) {
            return Err(ChainError::UnknownCell(cell));
        }
        if self.is_occupied(cell) {
            return Err(ChainError::CellOccupied(cell));
        }
        let id = HolderId::new(self.next_holder);
        self.next_holder += 1;
        self.holders.insert(id, ValueHolder::new(id, raw));
        self.occupants.insert(cell, id);
        self.locations.insert(id, cell);
        Ok(id)
    }

    /// Spawns a value into every empty cell, top row first.
    pub fn fill_empty(&mut self, spawner: &mut impl ValueSpawner) -> Vec<(CellId, HolderId)> {
        let empty: Vec<CellId> = self.empty_cells().collect();
        empty
            .into_iter()
            .filter_map(|cell| {
                let position = self.graph().position(cell)?;
                let raw = spawner.spawn_value(position);
                match self.place(cell, raw) {
                    Ok(holder) => Some((cell, holder)),
                    Err(err) => {
                        warn!("Refill skipped {cell:?}: {err}");
                        None
                    }
                }
            })
            .collect()
    }

    /// Removes the occupant of `cell`, leaving it empty.
    pub fn detach(&mut self, cell: CellId) -> Option<ValueHolder> {
        let id = self.occupants.remove(&cell)?;
        self.locations.remove(&id);
        self.holders.remove(&id)
    }

    /// Relocates holders in one step so that a move may target a cell another
    /// move in the same batch is vacating.
    pub(crate) fn apply_moves(&mut self, moves: &[(HolderId, CellId)]) {
        for (holder, _) in moves {
            if let Some(source) = self.locations.remove(holder) {
                self.occupants.remove(&source);
            }
        }
        for &(holder, destination) in moves {
            if let Some(displaced) = self.occupants.insert(destination, holder) {
                warn!("{displaced:?} was overwritten by {holder:?}");
                self.locations.remove(&displaced);
                self.holders.remove(&displaced);
            }
            self.locations.insert(holder, destination);
        }
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.grid.rows() {
            for cell in row {
                match self.raw_at(*cell) {
                    Some(raw) => write!(f, "{raw:>4}")?,
                    None => write!(f, "{:>4}", ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
