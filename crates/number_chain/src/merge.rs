use bevy::prelude::*;
use bevy::utils::HashSet;

use crate::board::Board;
use crate::direction::Direction;
use crate::error::ChainError;
use crate::graph::CellId;
use crate::presentation::Presentation;
use crate::value::{HolderId, ValueHolder};

/// A holder pulled down by gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub holder: HolderId,
    pub from: CellId,
    pub to: CellId,
}

/// Empty cells left at the top of a column, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRefill {
    pub column: usize,
    pub cells: Vec<CellId>,
}

/// What the compaction pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    pub falls: Vec<Fall>,
    pub refills: Vec<ColumnRefill>,
}

impl CollapseReport {
    pub fn empty_slots(&self) -> usize {
        self.refills.iter().map(|refill| refill.cells.len()).sum()
    }

    pub fn refill_count(&self, column: usize) -> usize {
        self.refills
            .iter()
            .find(|refill| refill.column == column)
            .map_or(0, |refill| refill.cells.len())
    }
}

/// Handed back when a merge starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTicket {
    pub terminal: CellId,
    /// Sum of the quantized values of the whole chain.
    pub merged_value: u32,
    /// Holders sliding onto the terminal, closest to it first.
    pub pending: Vec<HolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideOutcome {
    Pending { remaining: usize },
    /// Every removal is done; compaction may run.
    ReadyToCollapse,
    Collapsed(CollapseReport),
}

#[derive(Debug, Clone)]
struct Consumption {
    terminal: CellId,
    terminal_holder: HolderId,
    merged_value: u32,
    /// (holder, cell it is leaving)
    pending: Vec<(HolderId, CellId)>,
}

#[derive(Debug, Clone, Default)]
enum MergePhase {
    #[default]
    Idle,
    Consuming(Consumption),
    ReadyToCollapse {
        terminal: CellId,
        merged_value: u32,
    },
}

/// Destroy-then-compact engine. Owns the pending-removal set of one merge at
/// a time and refuses to start another until compaction has run.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    phase: MergePhase,
}

impl MergeEngine {
    pub const fn is_busy(&self) -> bool {
        !matches!(self.phase, MergePhase::Idle)
    }

    pub fn pending_count(&self) -> usize {
        match &self.phase {
            MergePhase::Consuming(consumption) => consumption.pending.len(),
            _ => 0,
        }
    }

    pub fn pending(&self) -> Vec<HolderId> {
        match &self.phase {
            MergePhase::Consuming(consumption) => {
                consumption.pending.iter().map(|(holder, _)| *holder).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Terminal cell of the merge in progress.
    pub const fn terminal(&self) -> Option<CellId> {
        match &self.phase {
            MergePhase::Idle => None,
            MergePhase::Consuming(consumption) => Some(consumption.terminal),
            MergePhase::ReadyToCollapse { terminal, .. } => Some(*terminal),
        }
    }

    /// Computes the merged value and starts sliding every non-terminal holder
    /// onto the terminal cell, in reverse chain order.
    pub fn start(
        &mut self,
        board: &Board,
        chain: &[CellId],
        presentation: &mut impl Presentation,
    ) -> Result<MergeTicket, ChainError> {
        if self.is_busy() {
            return Err(ChainError::MergeInFlight {
                pending: self.pending_count(),
            });
        }
        let [consumed @ .., terminal] = chain else {
            return Err(ChainError::ChainTooShort(0));
        };
        if consumed.is_empty() {
            return Err(ChainError::ChainTooShort(chain.len()));
        }

        let mut seen = HashSet::default();
        let mut merged_value = 0u32;
        for &cell in chain {
            if !board.contains(cell) {
                return Err(ChainError::UnknownCell(cell));
            }
            if !seen.insert(cell) {
                return Err(ChainError::DuplicateCell(cell));
            }
            let value = board.value_at(cell).ok_or(ChainError::EmptyCell(cell))?;
            merged_value = merged_value.saturating_add(value);
        }
        let terminal_holder = board
            .occupant(*terminal)
            .ok_or(ChainError::EmptyCell(*terminal))?;

        let pending: Vec<(HolderId, CellId)> = consumed
            .iter()
            .rev()
            .filter_map(|&cell| board.occupant(cell).map(|holder| (holder, cell)))
            .collect();
        for &(holder, cell) in &pending {
            presentation.begin_slide(holder, cell, *terminal);
        }

        info!(
            "Merging {} cell(s) into {:?} for {merged_value}",
            chain.len(),
            board.graph().position(*terminal)
        );

        let ticket = MergeTicket {
            terminal: *terminal,
            merged_value,
            pending: pending.iter().map(|(holder, _)| *holder).collect(),
        };
        self.phase = MergePhase::Consuming(Consumption {
            terminal: *terminal,
            terminal_holder,
            merged_value,
            pending,
        });
        Ok(ticket)
    }

    /// Completion signal for one slide: the consumed value is added to the
    /// terminal and its source cell becomes empty.
    pub fn finish_slide(
        &mut self,
        board: &mut Board,
        holder: HolderId,
    ) -> Result<SlideOutcome, ChainError> {
        let MergePhase::Consuming(consumption) = &mut self.phase else {
            return Err(ChainError::NotPending(holder));
        };
        let Some(index) = consumption
            .pending
            .iter()
            .position(|(pending, _)| *pending == holder)
        else {
            return Err(ChainError::NotPending(holder));
        };
        let (holder, source) = consumption.pending.remove(index);

        let amount = board
            .detach(source)
            .as_ref()
            .and_then(ValueHolder::quantized)
            .unwrap_or(0);
        match board.holder_mut(consumption.terminal_holder) {
            Some(terminal) => terminal.absorb(amount),
            None => error!("Terminal holder {:?} vanished mid-merge", consumption.terminal_holder),
        }
        debug!("{holder:?} consumed, {} removal(s) left", consumption.pending.len());

        if !consumption.pending.is_empty() {
            return Ok(SlideOutcome::Pending {
                remaining: consumption.pending.len(),
            });
        }
        let terminal = consumption.terminal;
        let merged_value = consumption.merged_value;
        self.phase = MergePhase::ReadyToCollapse {
            terminal,
            merged_value,
        };
        Ok(SlideOutcome::ReadyToCollapse)
    }

    /// Runs gravity compaction once every removal has completed.
    pub fn collapse(
        &mut self,
        board: &mut Board,
        presentation: &mut impl Presentation,
    ) -> Result<CollapseReport, ChainError> {
        let ready = match &self.phase {
            MergePhase::Consuming(consumption) => {
                return Err(ChainError::MergeInFlight {
                    pending: consumption.pending.len(),
                });
            }
            MergePhase::Idle => None,
            MergePhase::ReadyToCollapse {
                terminal,
                merged_value,
            } => Some((*terminal, *merged_value)),
        };
        if let Some((terminal, merged_value)) = ready {
            if board.raw_at(terminal) != Some(merged_value) {
                debug!(
                    "Terminal holds {:?}, chain summed to {merged_value}",
                    board.raw_at(terminal)
                );
            }
            self.phase = MergePhase::Idle;
        }
        Ok(compact(board, presentation))
    }
}

/// Packs every column's values downward and reports the empty cells left on
/// top of each column.
///
/// Columns are scanned bottom-up, counting the empty cells seen so far; each
/// value above a gap falls that many steps along the downward edges. All
/// falls are applied together after the scan.
pub fn compact(board: &mut Board, presentation: &mut impl Presentation) -> CollapseReport {
    let mut falls = Vec::new();
    for column in 0..board.grid().column_count() {
        let mut empty_below = 0;
        for cell in board.grid().column(column).into_iter().rev() {
            let Some(holder) = board.occupant(cell) else {
                empty_below += 1;
                continue;
            };
            if empty_below == 0 {
                continue;
            }
            match board.graph().walk(cell, Direction::DOWN, empty_below) {
                Some(to) => falls.push(Fall {
                    holder,
                    from: cell,
                    to,
                }),
                None => {
                    warn!("No cell {empty_below} step(s) below {cell:?}, value stays");
                    empty_below = 0;
                }
            }
        }
    }

    let moves: Vec<(HolderId, CellId)> = falls.iter().map(|fall| (fall.holder, fall.to)).collect();
    board.apply_moves(&moves);
    for fall in &falls {
        presentation.drop_holder(fall.holder, fall.from, fall.to);
    }

    let refills: Vec<ColumnRefill> = (0..board.grid().column_count())
        .filter_map(|column| {
            let cells: Vec<CellId> = board
                .grid()
                .column(column)
                .into_iter()
                .filter(|cell| board.contains(*cell) && !board.is_occupied(*cell))
                .collect();
            (!cells.is_empty()).then_some(ColumnRefill { column, cells })
        })
        .collect();
    for refill in &refills {
        presentation.spawn_at_top(refill.column, &refill.cells);
    }

    debug!(
        "Compaction moved {} value(s), {} slot(s) to refill",
        falls.len(),
        refills.iter().map(|refill| refill.cells.len()).sum::<usize>()
    );

    CollapseReport { falls, refills }
}
