use bevy::prelude::*;

use crate::config::BoardConfig;
use crate::game::NumberChain;
use crate::graph::CellId;
use crate::merge::{MergeTicket, SlideOutcome};
use crate::presentation::{PresentationEvent, PresentationLog};
use crate::spawner::{RandomSpawner, ValueSpawner};
use crate::value::HolderId;

/// Runs a [`NumberChain`] inside a Bevy app.
///
/// Hosts feed [`CellPointer`] and [`SlideFinished`] events in and draw from
/// [`ChainPresentation`], [`SelectionSumChanged`], [`MergeStarted`] and
/// [`HolderSpawned`].
pub struct NumberChainPlugin;

impl Plugin for NumberChainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BoardConfig>()
            .init_resource::<SelectionScore>()
            .add_event::<CellPointer>()
            .add_event::<SlideFinished>()
            .add_event::<ChainPresentation>()
            .add_event::<SelectionSumChanged>()
            .add_event::<MergeStarted>()
            .add_event::<ColumnRefillRequested>()
            .add_event::<HolderSpawned>()
            .add_systems(Startup, setup_board)
            .add_systems(
                Update,
                (handle_pointer, finish_slides, refill_columns)
                    .chain()
                    .run_if(resource_exists::<ChainGame>),
            );
    }
}

#[derive(Resource, Debug)]
pub struct ChainGame(pub NumberChain);

#[derive(Resource, Debug)]
pub struct ChainSpawner(pub RandomSpawner);

/// Sum of the current selection, shown while it is positive.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionScore(pub u32);

impl SelectionScore {
    pub const fn is_visible(self) -> bool {
        self.0 > 0
    }
}

/// Pointer signals routed from the cell under the cursor.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPointer {
    Down(CellId),
    Enter(CellId),
    Exit(CellId),
    Up,
}

/// A slide started by the merge engine reached its target.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideFinished(pub HolderId);

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ChainPresentation(pub PresentationEvent);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSumChanged(pub u32);

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct MergeStarted(pub MergeTicket);

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ColumnRefillRequested {
    pub column: usize,
    pub cells: Vec<CellId>,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderSpawned {
    pub cell: CellId,
    pub holder: HolderId,
    pub value: u32,
}

fn setup_board(mut commands: Commands, config: Res<BoardConfig>) {
    let mut spawner = match config.spawner() {
        Ok(spawner) => spawner,
        Err(err) => {
            error!("Invalid board config: {err}");
            return;
        }
    };
    match NumberChain::new(&config, &mut spawner) {
        Ok(game) => {
            commands.insert_resource(ChainGame(game));
            commands.insert_resource(ChainSpawner(spawner));
        }
        Err(err) => error!("Could not build the board: {err}"),
    }
}

fn handle_pointer(
    mut pointer_events: EventReader<CellPointer>,
    mut game: ResMut<ChainGame>,
    mut score: ResMut<SelectionScore>,
    mut presentation_events: EventWriter<ChainPresentation>,
    mut sum_events: EventWriter<SelectionSumChanged>,
    mut merge_events: EventWriter<MergeStarted>,
) {
    let mut log = PresentationLog::default();
    for pointer in pointer_events.read() {
        let result = match *pointer {
            CellPointer::Down(cell) => game.0.begin(cell, &mut log).map(|_| ()),
            CellPointer::Enter(cell) => game.0.hover(cell, &mut log).map(|_| ()),
            CellPointer::Exit(cell) => {
                game.0.leave(cell);
                Ok(())
            }
            CellPointer::Up => {
                if !game.0.session().is_active() {
                    continue;
                }
                // Sums from earlier in the frame must land before the reset.
                publish(&mut log, &mut score, &mut presentation_events, &mut sum_events);
                game.0.release(&mut log).map(|ticket| {
                    score.0 = 0;
                    if let Some(ticket) = ticket {
                        merge_events.send(MergeStarted(ticket));
                    }
                })
            }
        };
        if let Err(err) = result {
            error!("{err}");
        }
    }
    publish(&mut log, &mut score, &mut presentation_events, &mut sum_events);
}

/// Replays buffered presentation calls as events, in call order.
fn publish(
    log: &mut PresentationLog,
    score: &mut SelectionScore,
    presentation_events: &mut EventWriter<ChainPresentation>,
    sum_events: &mut EventWriter<SelectionSumChanged>,
) {
    for event in log.drain() {
        if let PresentationEvent::SelectionSumChanged(sum) = event {
            score.0 = sum;
            sum_events.send(SelectionSumChanged(sum));
        }
        presentation_events.send(ChainPresentation(event));
    }
}

fn finish_slides(
    mut slide_events: EventReader<SlideFinished>,
    mut game: ResMut<ChainGame>,
    mut presentation_events: EventWriter<ChainPresentation>,
    mut refill_events: EventWriter<ColumnRefillRequested>,
) {
    let mut log = PresentationLog::default();
    for SlideFinished(holder) in slide_events.read() {
        match game.0.finish_slide(*holder, &mut log) {
            Ok(SlideOutcome::Collapsed(report)) => {
                refill_events.send_batch(report.refills.into_iter().map(|refill| {
                    ColumnRefillRequested {
                        column: refill.column,
                        cells: refill.cells,
                    }
                }));
            }
            Ok(_) => {}
            Err(err) => warn!("{err}"),
        }
    }
    presentation_events.send_batch(log.drain().map(ChainPresentation));
}

fn refill_columns(
    mut refill_events: EventReader<ColumnRefillRequested>,
    mut game: ResMut<ChainGame>,
    mut spawner: ResMut<ChainSpawner>,
    mut spawned_events: EventWriter<HolderSpawned>,
) {
    for request in refill_events.read() {
        for &cell in &request.cells {
            let Some(position) = game.0.board().graph().position(cell) else {
                warn!("Refill requested for unknown {cell:?}");
                continue;
            };
            let value = spawner.0.spawn_value(position);
            match game.0.place(cell, value) {
                Ok(holder) => {
                    spawned_events.send(HolderSpawned {
                        cell,
                        holder,
                        value,
                    });
                }
                Err(err) => warn!("{err}"),
            }
        }
    }
}
