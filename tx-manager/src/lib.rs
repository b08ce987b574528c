//! Tracks transactions submitted to a CKB node until they are committed or
//! rejected, and collects cells with those transactions taken into account.
//!
//! Without this layer, a wallet querying the indexer right after submitting
//! a transaction sees the cells it just spent as live, and does not see the
//! cells it just created.

pub mod collector;
mod config;
mod error;
mod manager;
mod rpc;

#[cfg(test)]
mod tests;

pub use collector::{
    CellCollectorProvider, CellQuery, IndexerCellSource, LiveCellSource, LiveCells,
    PendingCellCollector,
};
pub use config::TxManagerConfig;
pub use error::{display_out_point, Error};
pub use manager::{TransactionManager, TransactionManagerBuilder, DEFAULT_POLL_INTERVAL};
pub use rpc::{is_terminal, NodeRpc};

pub use ckb_pending_store::{Cell, MemoryPendingStore, PendingStore, PendingTransaction, StoreError};
pub use ckb_rpc_client::{Order, ScriptType, SearchKey, SearchKeyFilter, SearchMode, ValueRange};
