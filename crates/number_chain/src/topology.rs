use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::ChainError;
use crate::graph::{CellGraph, CellId, CellPosition};

/// Row -> column count. Rows may differ in width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    rows: Vec<u32>,
}

impl GridLayout {
    pub const fn new(rows: Vec<u32>) -> Self {
        Self { rows }
    }

    pub fn rectangular(rows: u32, columns: u32) -> Self {
        Self {
            rows: vec![columns; rows as usize],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns_in(&self, row: usize) -> Option<u32> {
        self.rows.get(row).copied()
    }

    pub fn max_columns(&self) -> u32 {
        self.rows.iter().copied().max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }
}

/// The wired cell matrix shared by the selection session and the merge engine.
#[derive(Debug, Clone)]
pub struct Grid {
    graph: CellGraph,
    rows: Vec<Vec<CellId>>,
}

impl Grid {
    pub const fn graph(&self) -> &CellGraph {
        &self.graph
    }

    pub(crate) const fn graph_mut(&mut self) -> &mut CellGraph {
        &mut self.graph
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<CellId> {
        self.rows.get(row)?.get(column).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellId]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Cells of `column`, top row first. Rows too short to reach it are skipped.
    pub fn column(&self, column: usize) -> Vec<CellId> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).copied())
            .collect()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.graph.contains(id)
    }

    /// Unlinks a cell from the topology. Not used by gameplay.
    pub fn remove_cell(&mut self, id: CellId) -> bool {
        self.graph.remove_node(id)
    }
}

pub fn build_grid(layout: &GridLayout) -> Result<Grid, ChainError> {
    build_grid_with(layout, |_, _| {})
}

/// Builds the grid in two passes: every cell is created first (calling
/// `on_cell` for each), then each cell is linked to its in-bounds neighbors.
///
/// The horizontal bound of a candidate neighbor is the column count of the
/// row being scanned, not of the neighbor's row. On jagged layouts a
/// candidate may therefore fall past the end of a shorter row; such
/// candidates are skipped.
pub fn build_grid_with(
    layout: &GridLayout,
    mut on_cell: impl FnMut(CellId, CellPosition),
) -> Result<Grid, ChainError> {
    if layout.row_count() == 0 {
        return Err(ChainError::EmptyLayout);
    }

    let mut graph = CellGraph::default();
    let rows: Vec<Vec<CellId>> = layout
        .rows()
        .iter()
        .enumerate()
        .map(|(row, &columns)| {
            (0..columns)
                .map(|column| {
                    let position = CellPosition::new(row as u32, column);
                    let id = graph.add_cell(position);
                    on_cell(id, position);
                    id
                })
                .collect()
        })
        .collect();

    let row_count = rows.len() as i32;
    for (row, cells) in rows.iter().enumerate() {
        let columns = cells.len() as i32;
        for (column, &cell) in cells.iter().enumerate() {
            let origin = IVec2::new(column as i32, row as i32);
            for direction in Direction::all() {
                let candidate = origin + direction.offset();
                let inside_grid = candidate.x >= 0
                    && candidate.x < columns
                    && candidate.y >= 0
                    && candidate.y < row_count;
                if !inside_grid {
                    continue;
                }
                let Some(neighbor) = rows
                    .get(candidate.y as usize)
                    .and_then(|neighbor_row| neighbor_row.get(candidate.x as usize))
                    .copied()
                else {
                    debug!("No cell at {candidate} for {direction:?} of r{row}c{column}");
                    continue;
                };
                graph.add_edge(cell, neighbor, direction);
            }
        }
    }

    debug!(
        "Built grid with {} cells over {} rows",
        graph.size(),
        rows.len()
    );

    Ok(Grid { graph, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Cell;

    fn degree(grid: &Grid, row: usize, column: usize) -> usize {
        grid.cell_at(row, column)
            .and_then(|id| grid.graph().cell(id))
            .map_or(0, Cell::degree)
    }

    #[test]
    fn rectangular_grid_has_moore_neighborhoods() {
        let grid = build_grid(&GridLayout::rectangular(3, 3)).expect("valid layout");
        assert_eq!(grid.cell_count(), 9, "nine cells");
        assert_eq!(degree(&grid, 1, 1), 8, "center sees all eight");
        assert_eq!(degree(&grid, 0, 0), 3, "corner sees three");
        assert_eq!(degree(&grid, 0, 1), 5, "edge sees five");
    }

    #[test]
    fn edges_carry_their_direction() {
        let grid = build_grid(&GridLayout::rectangular(3, 3)).expect("valid layout");
        let center = grid.cell_at(1, 1).expect("center");
        let top_left = grid.cell_at(0, 0).expect("top left");
        let bottom = grid.cell_at(2, 1).expect("bottom");
        let graph = grid.graph();
        assert_eq!(graph.direction_to(center, top_left), Some(Direction::NorthWest), "nw");
        assert_eq!(graph.direction_to(top_left, center), Some(Direction::SouthEast), "se");
        assert_eq!(graph.neighbor(center, Direction::DOWN), Some(bottom), "down");
    }

    #[test]
    fn every_edge_is_symmetric() {
        let grid = build_grid(&GridLayout::new(vec![4, 2, 5, 3])).expect("valid layout");
        let graph = grid.graph();
        for cell in graph.cells() {
            for (direction, neighbor) in cell.neighbors() {
                assert_eq!(
                    graph.neighbor(neighbor, direction.opposite()),
                    Some(cell.id()),
                    "edge {direction:?} from {} is one-sided",
                    cell.position()
                );
            }
        }
    }

    #[test]
    fn jagged_rows_are_bounded_by_the_scanning_row() {
        // Row 0 is wider than row 1.
        let grid = build_grid(&GridLayout::new(vec![3, 2])).expect("valid layout");
        let wide_end = grid.cell_at(0, 2).expect("r0c2");
        let short_end = grid.cell_at(1, 1).expect("r1c1");
        // r0c2 scans South-West with its own width of three and links r1c1.
        assert_eq!(
            grid.graph().direction_to(wide_end, short_end),
            Some(Direction::SouthWest),
            "linked from the wide row"
        );
        assert_eq!(
            grid.graph().direction_to(short_end, wide_end),
            Some(Direction::NorthEast),
            "reverse edge installed by the same call"
        );
        // r0c2 has nothing below it in row 1.
        assert_eq!(grid.graph().neighbor(wide_end, Direction::South), None, "no r1c2");
        assert_eq!(grid.column(2), vec![wide_end], "column 2 only exists in row 0");
    }

    #[test]
    fn empty_layout_is_rejected() {
        assert_eq!(
            build_grid(&GridLayout::new(Vec::new())).map(|grid| grid.cell_count()),
            Err(ChainError::EmptyLayout),
            "no rows"
        );
    }

    #[test]
    fn factory_sees_every_cell_once() {
        let mut seen = Vec::new();
        let grid = build_grid_with(&GridLayout::rectangular(2, 3), |id, position| {
            seen.push((id, position));
        })
        .expect("valid layout");
        assert_eq!(seen.len(), grid.cell_count(), "one call per cell");
        assert_eq!(
            seen.last().map(|(_, position)| *position),
            Some(CellPosition::new(1, 2)),
            "row-major order"
        );
    }
}
