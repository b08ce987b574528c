//！The error type for the transaction manager.

use ckb_pending_store::StoreError;
use ckb_rpc_client::RpcError;
use ckb_types::{packed::OutPoint, prelude::*, H256};
use thiserror::Error;

/// A list specifying general categories of transaction manager error.
#[derive(Error, Debug)]
pub enum Error {
    /// An input of the submitted transaction is already spent by a pending transaction.
    /// The transaction was not submitted.
    #[error("OutPoint {} has already been spent", display_out_point(.0))]
    DoubleSpend(OutPoint),
    /// The node refused the transaction. The pending store is left untouched.
    #[error("Submit transaction error {0}")]
    Submission(#[source] RpcError),
    /// Checking or pruning a pending transaction failed.
    /// Only ever logged by the poll loop.
    #[error("Poll iteration error {0}")]
    PollIteration(String),
    /// The live cell source failed while being collected
    #[error("Cell collector error {0}")]
    CollectorSource(anyhow::Error),
    /// Pending store error
    #[error("Pending store error {0}")]
    Store(#[from] StoreError),
    /// Invalid configuration
    #[error("Config error {0}")]
    Config(String),
}

impl Error {
    /// Wraps a failure of a live cell source.
    pub fn collector_source<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Error::CollectorSource(error.into())
    }
}

/// Formats an out point as `tx_hash@index`.
pub fn display_out_point(out_point: &OutPoint) -> String {
    let tx_hash: H256 = out_point.tx_hash().unpack();
    let index: u32 = out_point.index().unpack();
    format!("{tx_hash:#x}@{index}")
}
