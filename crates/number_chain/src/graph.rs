use std::fmt::{self, Display, Formatter};

use bevy::utils::{HashMap, HashSet};

use crate::direction::Direction;

/// Stable index of a cell inside a [`CellGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Row/column address of a cell in the layout it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPosition {
    pub row: u32,
    pub column: u32,
}

impl CellPosition {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl Display for CellPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}c{}", self.row, self.column)
    }
}

/// A graph vertex: one grid position with up to eight labelled edges.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    position: CellPosition,
    /// direction -> neighbor
    neighbors: HashMap<Direction, CellId>,
    /// neighbor -> direction
    neighbor_directions: HashMap<CellId, Direction>,
    /// The cell the active chain arrived from.
    previous: Option<CellId>,
}

impl Cell {
    fn new(id: CellId, position: CellPosition) -> Self {
        Self {
            id,
            position,
            neighbors: HashMap::default(),
            neighbor_directions: HashMap::default(),
            previous: None,
        }
    }

    pub const fn id(&self) -> CellId {
        self.id
    }

    pub const fn position(&self) -> CellPosition {
        self.position
    }

    pub fn is_neighbor(&self, other: CellId) -> bool {
        self.neighbor_directions.contains_key(&other)
    }

    pub fn direction_to(&self, other: CellId) -> Option<Direction> {
        self.neighbor_directions.get(&other).copied()
    }

    pub fn neighbor(&self, direction: Direction) -> Option<CellId> {
        self.neighbors.get(&direction).copied()
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (Direction, CellId)> + '_ {
        self.neighbors.iter().map(|(direction, id)| (*direction, *id))
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub const fn previous(&self) -> Option<CellId> {
        self.previous
    }

    pub(crate) const fn set_previous(&mut self, previous: Option<CellId>) {
        self.previous = previous;
    }

    /// Installs the edge unless the vertex or the direction slot is already taken.
    fn add_edge(&mut self, direction: Direction, vertex: CellId) -> bool {
        if self.is_neighbor(vertex) || self.neighbors.contains_key(&direction) {
            return false;
        }
        self.neighbors.insert(direction, vertex);
        self.neighbor_directions.insert(vertex, direction);
        true
    }

    fn remove_edge(&mut self, vertex: CellId) -> bool {
        let Some(direction) = self.neighbor_directions.remove(&vertex) else {
            return false;
        };
        self.neighbors.remove(&direction);
        true
    }
}

/// Arena of cells connected by direction-labelled, symmetric edges.
#[derive(Debug, Clone, Default)]
pub struct CellGraph {
    cells: Vec<Cell>,
    vertices: HashSet<CellId>,
}

impl CellGraph {
    pub fn add_cell(&mut self, position: CellPosition) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(Cell::new(id, position));
        self.vertices.insert(id);
        id
    }

    /// Number of vertices still registered in the graph.
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.vertices.contains(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.0)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| self.vertices.contains(&cell.id))
    }

    /// Connects `start` to `end` along `direction` and `end` back to `start`
    /// along the opposite direction. Existing edges are left untouched.
    ///
    /// Returns `true` if at least one side gained an edge.
    pub fn add_edge(&mut self, start: CellId, end: CellId, direction: Direction) -> bool {
        if start == end || !self.contains(start) || !self.contains(end) {
            return false;
        }
        let forward = self
            .cell_mut(start)
            .is_some_and(|cell| cell.add_edge(direction, end));
        let backward = self
            .cell_mut(end)
            .is_some_and(|cell| cell.add_edge(direction.opposite(), start));
        forward || backward
    }

    pub fn remove_edge(&mut self, first: CellId, second: CellId) -> bool {
        if !self.contains(first) || !self.contains(second) {
            return false;
        }
        let forward = self
            .cell_mut(first)
            .is_some_and(|cell| cell.remove_edge(second));
        let backward = self
            .cell_mut(second)
            .is_some_and(|cell| cell.remove_edge(first));
        forward || backward
    }

    /// Detaches `node` from every other vertex and unregisters it.
    pub fn remove_node(&mut self, node: CellId) -> bool {
        if !self.vertices.remove(&node) {
            return false;
        }
        for cell in &mut self.cells {
            cell.remove_edge(node);
        }
        if let Some(cell) = self.cell_mut(node) {
            cell.neighbors.clear();
            cell.neighbor_directions.clear();
            cell.previous = None;
        }
        true
    }

    pub fn is_neighbor(&self, first: CellId, second: CellId) -> bool {
        self.cell(first).is_some_and(|cell| cell.is_neighbor(second))
    }

    pub fn direction_to(&self, from: CellId, to: CellId) -> Option<Direction> {
        self.cell(from)?.direction_to(to)
    }

    pub fn neighbor(&self, from: CellId, direction: Direction) -> Option<CellId> {
        self.cell(from)?.neighbor(direction)
    }

    /// Follows `direction` edges `steps` times.
    pub fn walk(&self, from: CellId, direction: Direction, steps: usize) -> Option<CellId> {
        (0..steps).try_fold(from, |current, _| self.neighbor(current, direction))
    }

    pub fn position(&self, id: CellId) -> Option<CellPosition> {
        self.cell(id).map(Cell::position)
    }

    pub fn previous(&self, id: CellId) -> Option<CellId> {
        self.cell(id)?.previous()
    }

    pub(crate) fn set_previous(&mut self, id: CellId, previous: Option<CellId>) {
        if let Some(cell) = self.cell_mut(id) {
            cell.set_previous(previous);
        }
    }
}
