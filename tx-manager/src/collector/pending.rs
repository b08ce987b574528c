use super::LiveCells;
use crate::error::display_out_point;
use async_stream::try_stream;
use ckb_logger::debug;
use ckb_pending_store::{Cell, PendingStore};
use ckb_rpc_client::Order;
use ckb_types::packed::OutPoint;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;

/// Merges the live cells with the cells created by pending transactions.
///
/// Cells spent by a pending transaction are never returned, whichever side
/// they come from.
///
/// - Ascending order returns the live cells first, then the pending cells.
///   Every live cell seen is also pruned from the pending store, its
///   creating transaction has evidently landed on chain.
/// - Descending order returns the pending cells first, newest first, then the
///   live cells. Live cells are pruned from the pending store the same way.
///
/// Either way a cell that is both pending and live is returned once.
pub struct PendingCellCollector {
    live_cells: LiveCells,
    spent_cells: HashSet<OutPoint>,
    pending_cells: Vec<Cell>,
    order: Order,
    use_pending_cells: bool,
    store: Arc<dyn PendingStore>,
}

impl PendingCellCollector {
    /// `pending_cells` must already be filtered by the query that scoped `live_cells`.
    pub fn new(
        live_cells: LiveCells,
        spent_cells: Vec<OutPoint>,
        mut pending_cells: Vec<Cell>,
        order: Order,
        use_pending_cells: bool,
        store: Arc<dyn PendingStore>,
    ) -> Self {
        if matches!(order, Order::Desc) {
            pending_cells.reverse();
        }
        PendingCellCollector {
            live_cells,
            spent_cells: spent_cells.into_iter().collect(),
            pending_cells,
            order,
            use_pending_cells,
            store,
        }
    }

    /// Whether a pending transaction spends `cell`.
    pub fn is_spent(&self, cell: &Cell) -> bool {
        self.spent_cells.contains(&cell.out_point)
    }

    /// The pending cells this collector may return, in output order.
    pub fn pending_cells(&self) -> &[Cell] {
        &self.pending_cells
    }

    /// Collects the cells.
    ///
    /// Errors of the live source are returned as they are and end the
    /// collection.
    pub fn collect(self) -> LiveCells {
        let PendingCellCollector {
            mut live_cells,
            spent_cells,
            pending_cells,
            order,
            use_pending_cells,
            store,
        } = self;
        let pending_cells = if use_pending_cells {
            pending_cells
        } else {
            Vec::new()
        };

        Box::pin(try_stream! {
            // out points already yielded, the other phase never yields them again
            let mut yielded = HashSet::<OutPoint>::new();
            match order {
                Order::Desc => {
                    for cell in pending_cells {
                        if !spent_cells.contains(&cell.out_point) {
                            yielded.insert(cell.out_point.clone());
                            yield cell;
                        }
                    }
                    while let Some(cell) = live_cells.next().await {
                        let cell = cell?;
                        remove_pending_cell(store.as_ref(), &cell).await;
                        if !yielded.contains(&cell.out_point) && !spent_cells.contains(&cell.out_point) {
                            yield cell;
                        }
                    }
                }
                Order::Asc => {
                    while let Some(cell) = live_cells.next().await {
                        let cell = cell?;
                        remove_pending_cell(store.as_ref(), &cell).await;
                        if !spent_cells.contains(&cell.out_point) {
                            yielded.insert(cell.out_point.clone());
                            yield cell;
                        }
                    }
                    for cell in pending_cells {
                        if !yielded.contains(&cell.out_point) && !spent_cells.contains(&cell.out_point) {
                            yield cell;
                        }
                    }
                }
            }
        })
    }
}

/// Best-effort: a store failure counts as "not removed".
pub(crate) async fn remove_pending_cell(store: &dyn PendingStore, cell: &Cell) -> bool {
    match store.delete_transaction_by_cell(cell).await {
        Ok(removed) => {
            if removed {
                debug!(
                    "cell {} is live, its pending transaction is removed",
                    display_out_point(&cell.out_point)
                );
            }
            removed
        }
        Err(e) => {
            debug!(
                "remove pending transaction of cell {} error {}",
                display_out_point(&cell.out_point),
                e
            );
            false
        }
    }
}
