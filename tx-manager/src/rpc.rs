use async_trait::async_trait;
use ckb_jsonrpc_types::{OutputsValidator, Status};
use ckb_rpc_client::{RpcClient, RpcError};
use ckb_types::{core::TransactionView, packed::Byte32};

/// The calls the transaction manager makes to a node.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Broadcasts `tx`, returns the hash the node accepted it under.
    async fn send_transaction(
        &self,
        tx: &TransactionView,
        outputs_validator: OutputsValidator,
    ) -> Result<Byte32, RpcError>;

    /// Current status of the transaction `hash`.
    async fn get_transaction_status(&self, hash: &Byte32) -> Result<Status, RpcError>;
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn send_transaction(
        &self,
        tx: &TransactionView,
        outputs_validator: OutputsValidator,
    ) -> Result<Byte32, RpcError> {
        RpcClient::send_transaction(self, tx.data(), outputs_validator).await
    }

    async fn get_transaction_status(&self, hash: &Byte32) -> Result<Status, RpcError> {
        let tx_status = RpcClient::get_transaction_status(self, hash.clone()).await?;
        // the node may answer `null` for a transaction it has never seen
        Ok(tx_status
            .map(|tx_status| tx_status.status)
            .unwrap_or(Status::Unknown))
    }
}

/// Committed and rejected transactions will never change status again.
pub fn is_terminal(status: &Status) -> bool {
    matches!(status, Status::Committed | Status::Rejected)
}
