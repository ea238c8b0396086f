use crate::direction::Direction;
use crate::graph::CellId;
use crate::value::HolderId;

/// Side effects the simulation asks the presentation layer to perform.
///
/// Every method defaults to a no-op so hosts only implement what they draw.
pub trait Presentation {
    /// Cell joined the chain (scale up).
    fn engage(&mut self, _cell: CellId) {}

    /// Cell left the chain (scale down).
    fn disengage(&mut self, _cell: CellId) {}

    /// Arrow on `cell` pointing along `direction`.
    fn show_connector(&mut self, _cell: CellId, _direction: Direction) {}

    fn hide_connector(&mut self, _cell: CellId, _direction: Direction) {}

    fn hide_all_connectors(&mut self, _cell: CellId) {}

    /// Start moving `holder` from `from` onto `target`. The host must report
    /// the end of the transition with `NumberChain::finish_slide`.
    fn begin_slide(&mut self, _holder: HolderId, _from: CellId, _target: CellId) {}

    /// `holder` was relocated by gravity.
    fn drop_holder(&mut self, _holder: HolderId, _from: CellId, _to: CellId) {}

    /// `cells` at the top of `column` are empty and need new holders.
    fn spawn_at_top(&mut self, _column: usize, _cells: &[CellId]) {}

    fn selection_sum_changed(&mut self, _sum: u32) {}
}

/// Presentation that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Presentation for Headless {}

/// One recorded [`Presentation`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    Engaged(CellId),
    Disengaged(CellId),
    ConnectorShown(CellId, Direction),
    ConnectorHidden(CellId, Direction),
    ConnectorsCleared(CellId),
    SlideStarted {
        holder: HolderId,
        from: CellId,
        target: CellId,
    },
    Dropped {
        holder: HolderId,
        from: CellId,
        to: CellId,
    },
    RefillRequested {
        column: usize,
        cells: Vec<CellId>,
    },
    SelectionSumChanged(u32),
}

/// Buffers calls so they can be replayed later, e.g. as ECS events.
#[derive(Debug, Default, Clone)]
pub struct PresentationLog {
    events: Vec<PresentationEvent>,
}

impl PresentationLog {
    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PresentationEvent> + '_ {
        self.events.drain(..)
    }

    pub fn selection_sums(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresentationEvent::SelectionSumChanged(sum) => Some(*sum),
                _ => None,
            })
            .collect()
    }

    pub fn slides(&self) -> Vec<HolderId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PresentationEvent::SlideStarted { holder, .. } => Some(*holder),
                _ => None,
            })
            .collect()
    }
}

impl Presentation for PresentationLog {
    fn engage(&mut self, cell: CellId) {
        self.events.push(PresentationEvent::Engaged(cell));
    }

    fn disengage(&mut self, cell: CellId) {
        self.events.push(PresentationEvent::Disengaged(cell));
    }

    fn show_connector(&mut self, cell: CellId, direction: Direction) {
        self.events
            .push(PresentationEvent::ConnectorShown(cell, direction));
    }

    fn hide_connector(&mut self, cell: CellId, direction: Direction) {
        self.events
            .push(PresentationEvent::ConnectorHidden(cell, direction));
    }

    fn hide_all_connectors(&mut self, cell: CellId) {
        self.events.push(PresentationEvent::ConnectorsCleared(cell));
    }

    fn begin_slide(&mut self, holder: HolderId, from: CellId, target: CellId) {
        self.events.push(PresentationEvent::SlideStarted {
            holder,
            from,
            target,
        });
    }

    fn drop_holder(&mut self, holder: HolderId, from: CellId, to: CellId) {
        self.events
            .push(PresentationEvent::Dropped { holder, from, to });
    }

    fn spawn_at_top(&mut self, column: usize, cells: &[CellId]) {
        self.events.push(PresentationEvent::RefillRequested {
            column,
            cells: cells.to_vec(),
        });
    }

    fn selection_sum_changed(&mut self, sum: u32) {
        self.events.push(PresentationEvent::SelectionSumChanged(sum));
    }
}
