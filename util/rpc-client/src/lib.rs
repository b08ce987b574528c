//! Async JSON-RPC client of a CKB node.
//!
//! Covers the calls needed to track submitted transactions: broadcasting a
//! transaction, asking for its status, and paging through the live cells of
//! the node's built-in indexer.

mod error;
#[doc(hidden)]
pub mod id_generator;
mod indexer;
#[macro_use]
mod macros;

pub use error::RpcError;
pub use indexer::{
    IndexerCell, Order, Pagination, ScriptType, SearchKey, SearchKeyFilter, SearchMode, ValueRange,
};

use ckb_jsonrpc_types::{JsonBytes, OutputsValidator, Transaction, TxStatus, Uint32};
use ckb_types::{packed, prelude::*, H256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout of a single RPC request.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// The part of a `get_transaction` response this client cares about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusView {
    /// The transaction status
    pub tx_status: TxStatus,
}

/// Client of a CKB node RPC endpoint.
pub struct RpcClient {
    inner: Inner,
}

impl RpcClient {
    /// Connects to `uri` with the default request timeout.
    pub fn new(uri: &str) -> Result<Self, RpcError> {
        Self::with_timeout(uri, DEFAULT_RPC_TIMEOUT)
    }

    /// Connects to `uri`, every request fails after `timeout`.
    pub fn with_timeout(uri: &str, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            inner: Inner::new(uri, timeout)?,
        })
    }

    pub fn inner(&self) -> &Inner {
        &self.inner
    }

    /// Broadcasts `tx`, returns the hash the node accepted it under.
    pub async fn send_transaction(
        &self,
        tx: packed::Transaction,
        outputs_validator: OutputsValidator,
    ) -> Result<packed::Byte32, RpcError> {
        self.inner
            .send_transaction(tx.into(), Some(outputs_validator))
            .await
            .map(|hash| hash.pack())
    }

    /// Status of the transaction `hash`, `None` if the node returned nothing.
    pub async fn get_transaction_status(
        &self,
        hash: packed::Byte32,
    ) -> Result<Option<TxStatus>, RpcError> {
        self.inner
            .get_transaction(hash.unpack())
            .await
            .map(|view| view.map(|view| view.tx_status))
    }

    /// One page of live cells matching `search_key`.
    pub async fn get_cells(
        &self,
        search_key: SearchKey,
        order: Order,
        limit: u32,
        after_cursor: Option<JsonBytes>,
    ) -> Result<Pagination<IndexerCell>, RpcError> {
        self.inner
            .get_cells(search_key, order, limit.into(), after_cursor)
            .await
    }
}

jsonrpc!(pub struct Inner {
    pub fn send_transaction(&self, tx: Transaction, outputs_validator: Option<OutputsValidator>) -> H256;
    pub fn get_transaction(&self, hash: H256) -> Option<TransactionStatusView>;
    pub fn get_cells(
        &self,
        search_key: SearchKey,
        order: Order,
        limit: Uint32,
        after: Option<JsonBytes>
    ) -> Pagination<IndexerCell>;
});
