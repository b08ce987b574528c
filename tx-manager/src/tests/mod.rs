
use crate::collector::{CellQuery, LiveCellSource, LiveCells};
use crate::{Error, NodeRpc};
use async_stream::try_stream;
use async_trait::async_trait;
use ckb_jsonrpc_types::{OutputsValidator, Status};
use ckb_pending_store::{Cell, MemoryPendingStore, PendingStore, PendingTransaction, StoreError};
use ckb_rpc_client::{RpcError, ScriptType, SearchKey, SearchMode};
use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionBuilder, TransactionView},
    h256,
    packed::{self, Byte32, CellInput, CellOutputBuilder, OutPoint, ScriptBuilder},
    prelude::*,
    H256,
};
use jsonrpc_core::types::error::{Error as JsonRpcError, ErrorCode};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) fn lock_script(args: &[u8]) -> packed::Script {
    ScriptBuilder::default()
        .code_hash(
            h256!("0x9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8").pack(),
        )
        .hash_type(ScriptHashType::Type.into())
        .args(Bytes::from(args.to_vec()).pack())
        .build()
}

pub(crate) fn type_script(args: &[u8]) -> packed::Script {
    ScriptBuilder::default()
        .code_hash(
            h256!("0x82d76d1b75fe2fd9a27dfbaa65a039221a380d76c926f378d3f81cf3e7e13f2e").pack(),
        )
        .hash_type(ScriptHashType::Data.into())
        .args(Bytes::from(args.to_vec()).pack())
        .build()
}

pub(crate) fn search_key(
    script: packed::Script,
    script_type: ScriptType,
    script_search_mode: Option<SearchMode>,
) -> SearchKey {
    SearchKey {
        script_search_mode,
        ..SearchKey::new(script.into(), script_type)
    }
}

/// A cell created by a pending transaction.
pub(crate) fn cell(
    tx_hash: &H256,
    index: u32,
    lock: packed::Script,
    type_: Option<packed::Script>,
    capacity: u64,
    data: &[u8],
) -> Cell {
    Cell {
        output: CellOutputBuilder::default()
            .capacity(capacity.pack())
            .lock(lock)
            .type_(type_.pack())
            .build(),
        output_data: Some(Bytes::from(data.to_vec())),
        out_point: OutPoint::new(tx_hash.pack(), index),
        block_number: None,
        tx_index: None,
    }
}

/// A committed cell of `lock`.
pub(crate) fn live_cell(tx_hash: &H256, index: u32, lock: packed::Script) -> Cell {
    Cell {
        block_number: Some(1),
        tx_index: Some(1),
        ..cell(tx_hash, index, lock, None, 100_00000000, b"")
    }
}

pub(crate) fn out_point(tx_hash: &H256, index: u32) -> OutPoint {
    OutPoint::new(tx_hash.pack(), index)
}

/// A transaction spending `inputs` and creating one cell per lock in `outputs`.
pub(crate) fn transaction(inputs: Vec<OutPoint>, outputs: Vec<packed::Script>) -> TransactionView {
    let data: Vec<packed::Bytes> = outputs.iter().map(|_| Bytes::new().pack()).collect();
    TransactionBuilder::default()
        .inputs(inputs.into_iter().map(|pt| CellInput::new(pt, 0)))
        .outputs(outputs.into_iter().map(|lock| {
            CellOutputBuilder::default()
                .capacity(100_00000000u64.pack())
                .lock(lock)
                .build()
        }))
        .outputs_data(data)
        .build()
}

pub(crate) fn pending(tx: TransactionView) -> PendingTransaction {
    PendingTransaction::new(tx.hash(), tx)
}

pub(crate) fn index_of(cell: &Cell) -> (Byte32, u32) {
    (cell.out_point.tx_hash(), cell.out_point.index().unpack())
}

/// A node answering from memory.
#[derive(Default)]
pub(crate) struct MockRpc {
    statuses: Mutex<HashMap<Byte32, Status>>,
    failing: Mutex<HashSet<Byte32>>,
    reject_reason: Mutex<Option<String>>,
    sent: Mutex<Vec<Byte32>>,
    status_queries: AtomicUsize,
}

impl MockRpc {
    pub(crate) fn set_status(&self, hash: &Byte32, status: Status) {
        self.statuses.lock().insert(hash.clone(), status);
    }

    pub(crate) fn fail_status(&self, hash: &Byte32) {
        self.failing.lock().insert(hash.clone());
    }

    pub(crate) fn reject_sending(&self, reason: &str) {
        *self.reject_reason.lock() = Some(reason.to_owned());
    }

    pub(crate) fn sent(&self) -> Vec<Byte32> {
        self.sent.lock().clone()
    }

    pub(crate) fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeRpc for MockRpc {
    async fn send_transaction(
        &self,
        tx: &TransactionView,
        _outputs_validator: OutputsValidator,
    ) -> Result<Byte32, RpcError> {
        if let Some(reason) = self.reject_reason.lock().clone() {
            return Err(RpcError::Rpc(JsonRpcError {
                code: ErrorCode::ServerError(-1107),
                message: reason,
                data: None,
            }));
        }
        self.sent.lock().push(tx.hash());
        Ok(tx.hash())
    }

    async fn get_transaction_status(&self, hash: &Byte32) -> Result<Status, RpcError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(hash) {
            return Err(RpcError::Rpc(JsonRpcError::internal_error()));
        }
        Ok(self
            .statuses
            .lock()
            .get(hash)
            .cloned()
            .unwrap_or(Status::Unknown))
    }
}

/// Live cells served from memory, in the order given.
#[derive(Default)]
pub(crate) struct MockCellSource {
    cells: Mutex<Vec<Cell>>,
    fail_at: Mutex<Option<usize>>,
    queries: Mutex<Vec<CellQuery>>,
    released: Arc<AtomicBool>,
}

impl MockCellSource {
    pub(crate) fn new(cells: Vec<Cell>) -> Self {
        MockCellSource {
            cells: Mutex::new(cells),
            ..Default::default()
        }
    }

    /// The `index`th cell is replaced by an error.
    pub(crate) fn fail_at(&self, index: usize) {
        *self.fail_at.lock() = Some(index);
    }

    pub(crate) fn queries(&self) -> Vec<CellQuery> {
        self.queries.lock().clone()
    }

    pub(crate) fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl LiveCellSource for MockCellSource {
    fn collector(&self, query: &CellQuery) -> LiveCells {
        self.queries.lock().push(query.clone());
        self.released.store(false, Ordering::SeqCst);
        let cells = self.cells.lock().clone();
        let fail_at = *self.fail_at.lock();
        let guard = ReleaseGuard(Arc::clone(&self.released));

        Box::pin(try_stream! {
            let _guard = guard;
            for (index, cell) in cells.into_iter().enumerate() {
                if fail_at == Some(index) {
                    Err::<(), _>(Error::collector_source(anyhow::anyhow!("indexer is gone")))?;
                }
                yield cell;
            }
        })
    }
}

/// A memory store failing every `delete_transaction_by_cell`.
#[derive(Clone, Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryPendingStore,
}

#[async_trait]
impl PendingStore for FlakyStore {
    async fn get_transactions(&self) -> Result<Vec<PendingTransaction>, StoreError> {
        self.inner.get_transactions().await
    }

    async fn add_transaction(&self, tx: PendingTransaction) -> Result<(), StoreError> {
        self.inner.add_transaction(tx).await
    }

    async fn delete_transaction_by_hash(&self, hash: &Byte32) -> Result<bool, StoreError> {
        self.inner.delete_transaction_by_hash(hash).await
    }

    async fn delete_transaction_by_cell(&self, _cell: &Cell) -> Result<bool, StoreError> {
        Err(StoreError::Backend("disk is full".to_owned()))
    }

    async fn get_spent_cell_outpoints(&self) -> Result<Vec<OutPoint>, StoreError> {
        self.inner.get_spent_cell_outpoints().await
    }

    async fn get_pending_cells(&self) -> Result<Vec<Cell>, StoreError> {
        self.inner.get_pending_cells().await
    }
}
