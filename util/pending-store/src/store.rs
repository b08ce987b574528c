use crate::{Cell, PendingTransaction, StoreError};
use async_trait::async_trait;
use ckb_types::packed::{Byte32, OutPoint};

/// Storage of pending transactions.
///
/// Implementations must give read-your-writes semantics within a process:
/// a transaction added is immediately visible to every derived query, and a
/// deleted one immediately disappears from them. Deleting something that is
/// not tracked is a miss (`Ok(false)`), not an error.
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// All pending transactions, in insertion order.
    async fn get_transactions(&self) -> Result<Vec<PendingTransaction>, StoreError>;

    /// Tracks a new pending transaction.
    async fn add_transaction(&self, tx: PendingTransaction) -> Result<(), StoreError>;

    /// Removes the pending transaction with `hash`, returns whether one was removed.
    async fn delete_transaction_by_hash(&self, hash: &Byte32) -> Result<bool, StoreError>;

    /// Removes the pending transaction that created `cell`, returns whether one was removed.
    async fn delete_transaction_by_cell(&self, cell: &Cell) -> Result<bool, StoreError>;

    /// Out points consumed by the inputs of all pending transactions.
    async fn get_spent_cell_outpoints(&self) -> Result<Vec<OutPoint>, StoreError>;

    /// Cells created by the outputs of all pending transactions.
    async fn get_pending_cells(&self) -> Result<Vec<Cell>, StoreError>;
}
