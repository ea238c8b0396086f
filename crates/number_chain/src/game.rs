use bevy::prelude::*;

use crate::board::Board;
use crate::config::BoardConfig;
use crate::error::ChainError;
use crate::graph::CellId;
use crate::merge::{MergeEngine, MergeTicket, SlideOutcome};
use crate::presentation::Presentation;
use crate::selection::{IgnoreReason, SelectionSession, Transition};
use crate::spawner::ValueSpawner;
use crate::value::{HolderId, LabelFormat};

/// The whole simulation: board, drag session and merge engine.
///
/// Pointer signals go in through [`begin`](Self::begin),
/// [`hover`](Self::hover), [`leave`](Self::leave) and
/// [`release`](Self::release); slide completions come back through
/// [`finish_slide`](Self::finish_slide).
#[derive(Debug, Clone)]
pub struct NumberChain {
    board: Board,
    session: SelectionSession,
    engine: MergeEngine,
    label: LabelFormat,
}

impl NumberChain {
    pub fn new(config: &BoardConfig, spawner: &mut impl ValueSpawner) -> Result<Self, ChainError> {
        config.validate()?;
        let board = Board::new(&config.grid_layout(), spawner)?;
        info!(
            "Board ready: {} cells in {} rows",
            board.grid().cell_count(),
            board.grid().row_count()
        );
        Ok(Self {
            board,
            session: SelectionSession::new(config.debug),
            engine: MergeEngine::default(),
            label: config.label.clone(),
        })
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            session: SelectionSession::default(),
            engine: MergeEngine::default(),
            label: LabelFormat::default(),
        }
    }

    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub const fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub const fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Display text of the value at `cell`.
    pub fn label_at(&self, cell: CellId) -> Option<String> {
        self.board.holder_at(cell).map(|holder| holder.label(&self.label))
    }

    /// Starts a drag. Ignored while a previous merge has not been compacted.
    pub fn begin(
        &mut self,
        cell: CellId,
        presentation: &mut impl Presentation,
    ) -> Result<Transition, ChainError> {
        if self.engine.is_busy() && self.board.contains(cell) {
            debug!("Drag ignored, {} removal(s) in flight", self.engine.pending_count());
            return Ok(Transition::Ignored(IgnoreReason::MergeInFlight));
        }
        self.session.begin(&mut self.board, cell, presentation)
    }

    pub fn hover(
        &mut self,
        cell: CellId,
        presentation: &mut impl Presentation,
    ) -> Result<Transition, ChainError> {
        self.session.hover(&mut self.board, cell, presentation)
    }

    pub const fn leave(&self, cell: CellId) -> Transition {
        self.session.leave(cell)
    }

    /// Ends the drag. A chain of two or more cells starts a merge.
    pub fn release(
        &mut self,
        presentation: &mut impl Presentation,
    ) -> Result<Option<MergeTicket>, ChainError> {
        let Transition::Released(chain) = self.session.release(&mut self.board, presentation)?
        else {
            return Ok(None);
        };
        if chain.len() < 2 {
            return Ok(None);
        }
        self.engine
            .start(&self.board, &chain, presentation)
            .map(Some)
    }

    /// Reports a finished slide. The last one of a merge runs compaction.
    pub fn finish_slide(
        &mut self,
        holder: HolderId,
        presentation: &mut impl Presentation,
    ) -> Result<SlideOutcome, ChainError> {
        match self.engine.finish_slide(&mut self.board, holder)? {
            SlideOutcome::ReadyToCollapse => self
                .engine
                .collapse(&mut self.board, presentation)
                .map(SlideOutcome::Collapsed),
            outcome => Ok(outcome),
        }
    }

    /// Puts a freshly spawned holder into an empty cell.
    pub fn place(&mut self, cell: CellId, raw: u32) -> Result<HolderId, ChainError> {
        self.board.place(cell, raw)
    }

    /// Fills every empty cell from `spawner`.
    pub fn refill(&mut self, spawner: &mut impl ValueSpawner) -> Vec<(CellId, HolderId)> {
        self.board.fill_empty(spawner)
    }
}
