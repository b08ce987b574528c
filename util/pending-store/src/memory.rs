use crate::{Cell, PendingStore, PendingTransaction, StoreError};
use async_trait::async_trait;
use ckb_types::packed::{Byte32, OutPoint};
use parking_lot::RwLock;
use std::sync::Arc;

/// A pending store kept in process memory.
///
/// Transactions are kept in insertion order. The store is reference-counted
/// and can be freely cloned, clones share the same transactions.
#[derive(Clone, Default)]
pub struct MemoryPendingStore {
    txs: Arc<RwLock<Vec<PendingTransaction>>>,
}

impl MemoryPendingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.txs.read().len()
    }

    /// Returns true if no transaction is pending.
    pub fn is_empty(&self) -> bool {
        self.txs.read().is_empty()
    }

    fn remove_first<F>(&self, predicate: F) -> bool
    where
        F: Fn(&PendingTransaction) -> bool,
    {
        let mut txs = self.txs.write();
        match txs.iter().position(predicate) {
            Some(pos) => {
                txs.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PendingStore for MemoryPendingStore {
    async fn get_transactions(&self) -> Result<Vec<PendingTransaction>, StoreError> {
        Ok(self.txs.read().clone())
    }

    async fn add_transaction(&self, tx: PendingTransaction) -> Result<(), StoreError> {
        let mut txs = self.txs.write();
        if let Some(existing) = txs.iter_mut().find(|existing| existing.hash == tx.hash) {
            *existing = tx;
        } else {
            txs.push(tx);
        }
        Ok(())
    }

    async fn delete_transaction_by_hash(&self, hash: &Byte32) -> Result<bool, StoreError> {
        Ok(self.remove_first(|tx| &tx.hash == hash))
    }

    async fn delete_transaction_by_cell(&self, cell: &Cell) -> Result<bool, StoreError> {
        Ok(self.remove_first(|tx| tx.creates(&cell.out_point)))
    }

    async fn get_spent_cell_outpoints(&self) -> Result<Vec<OutPoint>, StoreError> {
        Ok(self
            .txs
            .read()
            .iter()
            .flat_map(PendingTransaction::spent_out_points)
            .collect())
    }

    async fn get_pending_cells(&self) -> Result<Vec<Cell>, StoreError> {
        Ok(self
            .txs
            .read()
            .iter()
            .flat_map(PendingTransaction::created_cells)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_types::{
        bytes::Bytes,
        core::{Capacity, TransactionBuilder, TransactionView},
        h256,
        packed::{CellInput, CellOutputBuilder, ScriptBuilder},
        prelude::*,
    };
    use tokio::test;

    fn out_point(hash: &Byte32, index: u32) -> OutPoint {
        OutPoint::new(hash.clone(), index)
    }

    fn transfer(spend: Vec<OutPoint>, outputs: usize) -> TransactionView {
        let lock = ScriptBuilder::default()
            .args(Bytes::from_static(b"owner").pack())
            .build();
        let output = CellOutputBuilder::default()
            .capacity(Capacity::shannons(100_000_000_000).pack())
            .lock(lock)
            .build();
        TransactionBuilder::default()
            .inputs(spend.into_iter().map(|pt| CellInput::new(pt, 0)))
            .outputs((0..outputs).map(|_| output.clone()))
            .outputs_data((0..outputs).map(|i| Bytes::from(vec![i as u8]).pack()))
            .build()
    }

    fn pending(spend: Vec<OutPoint>, outputs: usize) -> PendingTransaction {
        let tx = transfer(spend, outputs);
        PendingTransaction::new(tx.hash(), tx)
    }

    #[test]
    async fn derives_spent_out_points_and_pending_cells() {
        let store = MemoryPendingStore::new();
        let h1: Byte32 = h256!("0x1").pack();
        let tx = pending(vec![out_point(&h1, 0), out_point(&h1, 1)], 2);
        store.add_transaction(tx.clone()).await.unwrap();

        let spent = store.get_spent_cell_outpoints().await.unwrap();
        assert_eq!(spent, vec![out_point(&h1, 0), out_point(&h1, 1)]);

        let cells = store.get_pending_cells().await.unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].out_point, out_point(&tx.hash, 0));
        assert_eq!(cells[1].out_point, out_point(&tx.hash, 1));
        assert_eq!(cells[1].output_data, Some(Bytes::from(vec![1u8])));
        assert!(cells.iter().all(Cell::is_pending));
    }

    #[test]
    async fn delete_by_hash_reports_misses() {
        let store = MemoryPendingStore::new();
        let tx = pending(vec![out_point(&h256!("0x1").pack(), 0)], 1);
        store.add_transaction(tx.clone()).await.unwrap();

        assert!(store.delete_transaction_by_hash(&tx.hash).await.unwrap());
        assert!(!store.delete_transaction_by_hash(&tx.hash).await.unwrap());
        assert!(store.is_empty());
        assert!(store.get_spent_cell_outpoints().await.unwrap().is_empty());
    }

    #[test]
    async fn delete_by_cell_removes_the_creating_transaction() {
        let store = MemoryPendingStore::new();
        let first = pending(vec![out_point(&h256!("0x1").pack(), 0)], 1);
        let second = pending(vec![out_point(&h256!("0x2").pack(), 0)], 1);
        store.add_transaction(first.clone()).await.unwrap();
        store.add_transaction(second.clone()).await.unwrap();

        let cell = first.created_cells().next().unwrap();
        assert!(store.delete_transaction_by_cell(&cell).await.unwrap());
        assert!(!store.delete_transaction_by_cell(&cell).await.unwrap());

        let remaining = store.get_transactions().await.unwrap();
        assert_eq!(remaining, vec![second]);
    }

    #[test]
    async fn delete_by_cell_ignores_out_of_range_index() {
        let store = MemoryPendingStore::new();
        let tx = pending(vec![out_point(&h256!("0x1").pack(), 0)], 1);
        store.add_transaction(tx.clone()).await.unwrap();

        let mut cell = tx.created_cells().next().unwrap();
        cell.out_point = out_point(&tx.hash, 5);
        assert!(!store.delete_transaction_by_cell(&cell).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    async fn re_adding_a_hash_replaces_the_record() {
        let store = MemoryPendingStore::new();
        let tx = pending(vec![out_point(&h256!("0x1").pack(), 0)], 1);
        store.add_transaction(tx.clone()).await.unwrap();
        store.add_transaction(tx.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_pending_cells().await.unwrap().len(), 1);
    }
}
