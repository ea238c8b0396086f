use bevy::prelude::*;

use crate::board::Board;
use crate::error::ChainError;
use crate::graph::CellId;
use crate::presentation::Presentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

/// Why an input left the session unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    AlreadyActive,
    NotActive,
    NotNeighbor,
    AlreadyInChain,
    Unoccupied,
    MergeInFlight,
}

/// Outcome of feeding one input into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started(CellId),
    Extended { from: CellId, to: CellId },
    Backtracked { removed: CellId, terminal: CellId },
    Left(CellId),
    /// The finished chain, first cell to terminal.
    Released(Vec<CellId>),
    Ignored(IgnoreReason),
}

/// Drag state machine building the ordered chain of selected cells.
#[derive(Debug, Clone, Default)]
pub struct SelectionSession {
    chain: Vec<CellId>,
    first: Option<CellId>,
    last: Option<CellId>,
    selected_sum: u32,
    verbose: bool,
}

impl SelectionSession {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..default()
        }
    }

    pub const fn state(&self) -> SessionState {
        if self.first.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    pub const fn is_active(&self) -> bool {
        self.first.is_some()
    }

    /// Active with at least two cells selected.
    pub fn has_path(&self) -> bool {
        matches!((self.first, self.last), (Some(first), Some(last)) if first != last)
    }

    pub const fn first(&self) -> Option<CellId> {
        self.first
    }

    pub const fn last(&self) -> Option<CellId> {
        self.last
    }

    pub fn chain(&self) -> &[CellId] {
        &self.chain
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.chain.contains(&cell)
    }

    /// Sum of the quantized values currently in the chain.
    pub const fn selected_sum(&self) -> u32 {
        self.selected_sum
    }

    pub fn begin(
        &mut self,
        board: &mut Board,
        cell: CellId,
        presentation: &mut impl Presentation,
    ) -> Result<Transition, ChainError> {
        ensure_known(board, cell)?;
        if self.is_active() {
            return Ok(Transition::Ignored(IgnoreReason::AlreadyActive));
        }
        if !board.is_occupied(cell) {
            return Ok(Transition::Ignored(IgnoreReason::Unoccupied));
        }

        self.trace(board, "Chain started at", cell);
        self.first = Some(cell);
        self.last = Some(cell);
        self.chain.push(cell);
        board.graph_mut().set_previous(cell, None);
        presentation.engage(cell);
        self.update_selected(board, presentation);
        Ok(Transition::Started(cell))
    }

    pub fn hover(
        &mut self,
        board: &mut Board,
        cell: CellId,
        presentation: &mut impl Presentation,
    ) -> Result<Transition, ChainError> {
        ensure_known(board, cell)?;
        let Some(current) = self.last else {
            return Ok(Transition::Ignored(IgnoreReason::NotActive));
        };
        let Some(direction) = board.graph().direction_to(current, cell) else {
            return Ok(Transition::Ignored(IgnoreReason::NotNeighbor));
        };

        if self.contains(cell) {
            if board.graph().previous(current) != Some(cell) {
                return Ok(Transition::Ignored(IgnoreReason::AlreadyInChain));
            }
            self.trace(board, "Chain backtracked to", cell);
            self.chain.pop();
            presentation.disengage(current);
            presentation.hide_connector(current, direction);
            presentation.hide_connector(cell, direction.opposite());
            board.graph_mut().set_previous(current, None);
            // `cell` keeps the link it got when it was added.
            self.last = Some(cell);
            self.update_selected(board, presentation);
            return Ok(Transition::Backtracked {
                removed: current,
                terminal: cell,
            });
        }

        if !board.is_occupied(cell) {
            return Ok(Transition::Ignored(IgnoreReason::Unoccupied));
        }

        self.trace(board, "Chain extended to", cell);
        presentation.show_connector(current, direction);
        presentation.show_connector(cell, direction.opposite());
        presentation.engage(cell);
        self.chain.push(cell);
        board.graph_mut().set_previous(cell, Some(current));
        self.last = Some(cell);
        self.update_selected(board, presentation);
        Ok(Transition::Extended {
            from: current,
            to: cell,
        })
    }

    /// Pointer left a cell. Carries no state change.
    pub const fn leave(&self, cell: CellId) -> Transition {
        Transition::Left(cell)
    }

    /// Ends the drag and hands back the finished chain. The sum observer is
    /// not notified.
    pub fn release(
        &mut self,
        board: &mut Board,
        presentation: &mut impl Presentation,
    ) -> Result<Transition, ChainError> {
        debug_assert!(self.is_active(), "release() without an active selection");
        if !self.is_active() {
            return Err(ChainError::NotActive);
        }

        let chain = std::mem::take(&mut self.chain);
        for &cell in &chain {
            presentation.disengage(cell);
            presentation.hide_all_connectors(cell);
            board.graph_mut().set_previous(cell, None);
        }
        self.first = None;
        self.last = None;
        self.selected_sum = 0;

        let message = format!("Chain released with {} cell(s)", chain.len());
        if self.verbose {
            info!("{message}");
        } else {
            debug!("{message}");
        }
        Ok(Transition::Released(chain))
    }

    fn update_selected(&mut self, board: &Board, presentation: &mut impl Presentation) {
        self.selected_sum = self
            .chain
            .iter()
            .filter_map(|cell| board.value_at(*cell))
            .fold(0, u32::saturating_add);
        presentation.selection_sum_changed(self.selected_sum);
    }

    fn trace(&self, board: &Board, message: &str, cell: CellId) {
        let Some(position) = board.graph().position(cell) else {
            return;
        };
        if self.verbose {
            info!("{message} {position}");
        } else {
            debug!("{message} {position}");
        }
    }
}

fn ensure_known(board: &Board, cell: CellId) -> Result<(), ChainError> {
    debug_assert!(board.contains(cell), "{cell:?} is not part of the grid");
    if board.contains(cell) {
        Ok(())
    } else {
        Err(ChainError::UnknownCell(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::presentation::{Headless, PresentationEvent, PresentationLog};

    fn board_of_ones() -> Board {
        Board::from_values(&[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]]).expect("valid values")
    }

    fn at(board: &Board, row: usize, column: usize) -> CellId {
        board.grid().cell_at(row, column).expect("cell in grid")
    }

    #[test]
    fn sums_follow_every_chain_mutation() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let mut log = PresentationLog::default();
        let (center, top_left, top) = (at(&board, 1, 1), at(&board, 0, 0), at(&board, 0, 1));

        session.begin(&mut board, center, &mut log).expect("known cell");
        session.hover(&mut board, top_left, &mut log).expect("known cell");
        session.hover(&mut board, top, &mut log).expect("known cell");

        assert_eq!(log.selection_sums(), vec![1, 2, 3], "one notification per mutation");
        assert_eq!(session.chain(), &[center, top_left, top], "ordered chain");
        assert_eq!(session.first(), Some(center), "first");
        assert_eq!(session.last(), Some(top), "terminal");
        assert!(session.has_path(), "more than one cell selected");
    }

    #[test]
    fn backtrack_restores_the_initial_state() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let (a, b) = (at(&board, 1, 1), at(&board, 1, 2));

        session.begin(&mut board, a, &mut Headless).expect("known cell");
        session.hover(&mut board, b, &mut Headless).expect("known cell");
        assert_eq!(board.graph().previous(b), Some(a), "b arrived from a");

        let transition = session.hover(&mut board, a, &mut Headless).expect("known cell");
        assert_eq!(
            transition,
            Transition::Backtracked {
                removed: b,
                terminal: a
            },
            "hovering the predecessor backtracks"
        );
        assert_eq!(session.chain(), &[a], "chain back to the start");
        assert_eq!(session.last(), Some(a), "terminal restored");
        assert_eq!(board.graph().previous(a), None, "start has no predecessor");
        assert_eq!(board.graph().previous(b), None, "removed cell link cleared");
        assert!(!session.has_path(), "single cell");
        assert_eq!(session.selected_sum(), 1, "sum back to one value");
    }

    #[test]
    fn backtrack_hides_both_arrows() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let mut log = PresentationLog::default();
        let (a, b) = (at(&board, 0, 0), at(&board, 1, 1));

        session.begin(&mut board, a, &mut log).expect("known cell");
        session.hover(&mut board, b, &mut log).expect("known cell");
        session.hover(&mut board, a, &mut log).expect("known cell");

        let events = log.events();
        assert!(
            events.contains(&PresentationEvent::ConnectorShown(a, Direction::SouthEast)),
            "arrow shown on the start"
        );
        assert!(
            events.contains(&PresentationEvent::ConnectorShown(b, Direction::NorthWest)),
            "arrow shown on the new cell"
        );
        assert!(
            events.contains(&PresentationEvent::ConnectorHidden(b, Direction::NorthWest)),
            "arrow hidden on the removed cell"
        );
        assert!(
            events.contains(&PresentationEvent::ConnectorHidden(a, Direction::SouthEast)),
            "arrow hidden on the new terminal"
        );
        assert_eq!(events.last(), Some(&PresentationEvent::SelectionSumChanged(1)), "sum last");
    }

    #[test]
    fn non_neighbors_and_older_members_are_ignored() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let (a, b, c, far) = (
            at(&board, 0, 0),
            at(&board, 0, 1),
            at(&board, 1, 1),
            at(&board, 2, 2),
        );

        session.begin(&mut board, a, &mut Headless).expect("known cell");
        assert_eq!(
            session.hover(&mut board, far, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::NotNeighbor)),
            "far corner is not adjacent"
        );
        session.hover(&mut board, b, &mut Headless).expect("known cell");
        session.hover(&mut board, c, &mut Headless).expect("known cell");
        // `a` neighbors `c` and is in the chain, but is not its predecessor.
        assert_eq!(
            session.hover(&mut board, a, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::AlreadyInChain)),
            "only the immediate predecessor backtracks"
        );
        assert_eq!(
            session.hover(&mut board, c, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::NotNeighbor)),
            "a cell is not its own neighbor"
        );
        assert_eq!(session.chain(), &[a, b, c], "chain untouched");
    }

    #[test]
    fn begin_while_active_is_ignored() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let (a, b) = (at(&board, 0, 0), at(&board, 2, 2));
        session.begin(&mut board, a, &mut Headless).expect("known cell");
        assert_eq!(
            session.begin(&mut board, b, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::AlreadyActive)),
            "second begin ignored"
        );
        assert_eq!(session.first(), Some(a), "first unchanged");
    }

    #[test]
    fn hover_while_idle_and_empty_cells_are_ignored() {
        let mut board = Board::from_values(&[&[2, 0]]).expect("valid values");
        let mut session = SelectionSession::default();
        let (full, empty) = (at(&board, 0, 0), at(&board, 0, 1));
        assert_eq!(
            session.hover(&mut board, full, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::NotActive)),
            "idle hover"
        );
        assert_eq!(
            session.begin(&mut board, empty, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::Unoccupied)),
            "cannot start on an empty cell"
        );
        session.begin(&mut board, full, &mut Headless).expect("known cell");
        assert_eq!(
            session.hover(&mut board, empty, &mut Headless),
            Ok(Transition::Ignored(IgnoreReason::Unoccupied)),
            "cannot extend onto an empty cell"
        );
    }

    #[test]
    fn release_resets_and_returns_the_chain() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let mut log = PresentationLog::default();
        let (a, b) = (at(&board, 2, 0), at(&board, 2, 1));
        session.begin(&mut board, a, &mut log).expect("known cell");
        session.hover(&mut board, b, &mut log).expect("known cell");
        let sums_before = log.selection_sums().len();

        let released = session.release(&mut board, &mut log).expect("active session");
        assert_eq!(released, Transition::Released(vec![a, b]), "ordered chain handed back");
        assert_eq!(session.state(), SessionState::Idle, "back to idle");
        assert!(session.chain().is_empty(), "chain cleared");
        assert_eq!(board.graph().previous(b), None, "links cleared");
        assert_eq!(log.selection_sums().len(), sums_before, "release does not notify");
        assert!(
            log.events().contains(&PresentationEvent::ConnectorsCleared(a)),
            "arrows cleared"
        );
    }

    #[test]
    fn leave_changes_nothing() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        let a = at(&board, 0, 0);
        session.begin(&mut board, a, &mut Headless).expect("known cell");
        assert_eq!(session.leave(a), Transition::Left(a), "leave reported");
        assert_eq!(session.chain(), &[a], "chain untouched");
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "without an active selection"))]
    fn release_from_idle_violates_the_contract() {
        let mut board = board_of_ones();
        let mut session = SelectionSession::default();
        assert_eq!(
            session.release(&mut board, &mut Headless),
            Err(ChainError::NotActive),
            "release needs an active session"
        );
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "is not part of the grid"))]
    fn foreign_cells_violate_the_contract() {
        let mut small = Board::from_values(&[&[1]]).expect("valid values");
        let large = board_of_ones();
        let foreign = at(&large, 2, 2);
        let mut session = SelectionSession::default();
        assert_eq!(
            session.begin(&mut small, foreign, &mut Headless),
            Err(ChainError::UnknownCell(foreign)),
            "cell from another grid"
        );
    }
}
