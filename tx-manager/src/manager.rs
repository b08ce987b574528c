use crate::collector::{
    filter_cells, remove_pending_cell, CellCollectorProvider, CellQuery, IndexerCellSource,
    LiveCellSource, PendingCellCollector, DEFAULT_PAGE_SIZE,
};
use crate::rpc::{is_terminal, NodeRpc};
use crate::{Error, TxManagerConfig};
use ckb_jsonrpc_types::OutputsValidator;
use ckb_logger::{debug, error, info};
use ckb_pending_store::{Cell, MemoryPendingStore, PendingStore, PendingTransaction};
use ckb_rpc_client::{RpcClient, DEFAULT_RPC_TIMEOUT};
use ckb_types::{core::TransactionView, packed::Byte32};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Default interval between two checks of the pending transactions.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Tracks submitted transactions until they are committed or rejected.
///
/// A background task, spawned when the manager is built, periodically asks
/// the node for the status of every pending transaction and prunes the
/// finished ones from the pending store. The task stops after [`stop`] is
/// called or the manager is dropped.
///
/// The double-spend check of [`send_transaction`] is made against a snapshot
/// of the pending store without any locking: two concurrent submissions
/// spending the same out point may both pass it. The node stays the final
/// judge of conflicting spends.
///
/// [`stop`]: TransactionManager::stop
/// [`send_transaction`]: TransactionManager::send_transaction
pub struct TransactionManager {
    rpc: Arc<dyn NodeRpc>,
    cell_source: Arc<dyn LiveCellSource>,
    store: Arc<dyn PendingStore>,
    stop: CancellationToken,
}

impl TransactionManager {
    /// Starts building a manager.
    pub fn builder(
        rpc: Arc<dyn NodeRpc>,
        cell_collector_provider: CellCollectorProvider,
    ) -> TransactionManagerBuilder {
        TransactionManagerBuilder::new(rpc, cell_collector_provider)
    }

    /// Builds a manager talking to the endpoints of `config`, with an in-memory store.
    pub fn from_config(config: &TxManagerConfig, async_handle: &Handle) -> Result<Self, Error> {
        let rpc = RpcClient::with_timeout(&config.rpc_url, config.rpc_timeout())
            .map_err(|e| Error::Config(e.to_string()))?;
        let rpc = Arc::new(rpc);
        Self::builder(
            Arc::clone(&rpc) as Arc<dyn NodeRpc>,
            cell_collector_provider(config, &rpc),
        )
        .poll_interval(config.poll_interval())
        .rpc_timeout(config.rpc_timeout())
        .indexer_page_size(config.indexer_page_size)
        .build(async_handle)
    }

    /// Submits `tx` with the passthrough outputs validator.
    pub async fn send_transaction(&self, tx: TransactionView) -> Result<Byte32, Error> {
        self.send_transaction_with_validator(tx, OutputsValidator::Passthrough)
            .await
    }

    /// Submits `tx` and tracks it as pending.
    ///
    /// Fails with [`Error::DoubleSpend`] if an input is already spent by a
    /// pending transaction, and with [`Error::Submission`] if the node refuses
    /// the transaction. In both cases nothing is recorded.
    pub async fn send_transaction_with_validator(
        &self,
        tx: TransactionView,
        outputs_validator: OutputsValidator,
    ) -> Result<Byte32, Error> {
        let spent_cells: HashSet<_> = self
            .store
            .get_spent_cell_outpoints()
            .await?
            .into_iter()
            .collect();
        if let Some(out_point) = tx
            .input_pts_iter()
            .find(|out_point| spent_cells.contains(out_point))
        {
            return Err(Error::DoubleSpend(out_point));
        }

        let hash = self
            .rpc
            .send_transaction(&tx, outputs_validator)
            .await
            .map_err(Error::Submission)?;
        debug!("transaction {} is sent", hash);
        self.store
            .add_transaction(PendingTransaction::new(hash.clone(), tx))
            .await?;
        Ok(hash)
    }

    /// Collector of the cells matching `query`, pending cells included.
    pub async fn collector(&self, query: CellQuery) -> Result<PendingCellCollector, Error> {
        self.collector_with_options(query, true).await
    }

    /// Collector of the cells matching `query`.
    ///
    /// With `use_pending_cells` unset only live cells are returned, still
    /// excluding the ones spent by pending transactions.
    pub async fn collector_with_options(
        &self,
        query: CellQuery,
        use_pending_cells: bool,
    ) -> Result<PendingCellCollector, Error> {
        let query = query.without_skip();
        let pending_cells = self.store.get_pending_cells().await?;
        let filtered_pending_cells = filter_cells(pending_cells, &query.search_key);
        let live_cells = self.cell_source.collector(&query);
        let spent_cells = self.store.get_spent_cell_outpoints().await?;

        Ok(PendingCellCollector::new(
            live_cells,
            spent_cells,
            filtered_pending_cells,
            query.order,
            use_pending_cells,
            Arc::clone(&self.store),
        ))
    }

    /// Stops tracking the transaction that created `cell`, returns whether it was tracked.
    pub async fn remove_pending_cell(&self, cell: &Cell) -> bool {
        remove_pending_cell(self.store.as_ref(), cell).await
    }

    /// Checks every pending transaction once, returns the number pruned.
    pub async fn update_pending_transactions(&self) -> Result<usize, Error> {
        PendingWatcher {
            rpc: Arc::clone(&self.rpc),
            store: Arc::clone(&self.store),
        }
        .update_pending_transactions()
        .await
    }

    /// Stops the background poll loop.
    ///
    /// A check already in progress runs to completion, no further one is
    /// scheduled. Calling it again has no effect.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_cancelled()
    }

    pub fn store(&self) -> &Arc<dyn PendingStore> {
        &self.store
    }
}

impl Drop for TransactionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reuses the node client for `get_cells` when the indexer is the node itself.
pub(crate) fn cell_collector_provider(
    config: &TxManagerConfig,
    rpc: &Arc<RpcClient>,
) -> CellCollectorProvider {
    if config.indexer_url() == config.rpc_url {
        CellCollectorProvider::Direct(Arc::new(IndexerCellSource::new(
            Arc::clone(rpc),
            config.indexer_page_size,
        )))
    } else {
        CellCollectorProvider::Endpoint(config.indexer_url().to_owned())
    }
}

/// Builder of [`TransactionManager`].
pub struct TransactionManagerBuilder {
    rpc: Arc<dyn NodeRpc>,
    cell_collector_provider: CellCollectorProvider,
    store: Option<Arc<dyn PendingStore>>,
    poll_interval: Duration,
    rpc_timeout: Duration,
    indexer_page_size: u32,
}

impl TransactionManagerBuilder {
    pub fn new(rpc: Arc<dyn NodeRpc>, cell_collector_provider: CellCollectorProvider) -> Self {
        TransactionManagerBuilder {
            rpc,
            cell_collector_provider,
            store: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            indexer_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// The pending store, in memory by default.
    pub fn store(mut self, store: Arc<dyn PendingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Request timeout of the indexer client created for an endpoint provider.
    pub fn rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Page size of the indexer client created for an endpoint provider.
    pub fn indexer_page_size(mut self, indexer_page_size: u32) -> Self {
        self.indexer_page_size = indexer_page_size;
        self
    }

    /// Builds the manager and spawns its poll loop on `async_handle`.
    pub fn build(self, async_handle: &Handle) -> Result<TransactionManager, Error> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "poll interval should be greater than 0".to_owned(),
            ));
        }
        let cell_source = self
            .cell_collector_provider
            .resolve(self.rpc_timeout, self.indexer_page_size)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryPendingStore::new()));
        let stop = CancellationToken::new();

        let watcher = PendingWatcher {
            rpc: Arc::clone(&self.rpc),
            store: Arc::clone(&store),
        };
        async_handle.spawn(watcher.watch(self.poll_interval, stop.clone()));

        Ok(TransactionManager {
            rpc: self.rpc,
            cell_source,
            store,
            stop,
        })
    }
}

struct PendingWatcher {
    rpc: Arc<dyn NodeRpc>,
    store: Arc<dyn PendingStore>,
}

impl PendingWatcher {
    async fn watch(self, poll_interval: Duration, stop: CancellationToken) {
        loop {
            if stop.is_cancelled() {
                info!("TransactionManager received exit signal, exit now");
                break;
            }
            if let Err(e) = self.update_pending_transactions().await {
                error!("update pending transactions error {}", e);
            }
            tokio::select! {
                _ = time::sleep(poll_interval) => {},
                _ = stop.cancelled() => {},
            }
        }
    }

    async fn update_pending_transactions(&self) -> Result<usize, Error> {
        let txs = self.store.get_transactions().await?;
        let mut pruned = 0;
        for tx in txs {
            match self.prune_if_completed(&tx.hash).await {
                Ok(true) => pruned += 1,
                Ok(false) => {}
                Err(e) => error!("check pending transaction {} error {}", tx.hash, e),
            }
        }
        Ok(pruned)
    }

    async fn prune_if_completed(&self, hash: &Byte32) -> Result<bool, Error> {
        let status = self
            .rpc
            .get_transaction_status(hash)
            .await
            .map_err(|e| Error::PollIteration(e.to_string()))?;
        if !is_terminal(&status) {
            return Ok(false);
        }
        let removed = self
            .store
            .delete_transaction_by_hash(hash)
            .await
            .map_err(|e| Error::PollIteration(e.to_string()))?;
        if removed {
            info!("transaction {} is {:?}, stop tracking it", hash, status);
        }
        Ok(removed)
    }
}
