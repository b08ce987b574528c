//! Cell collection over the live indexed cells and the pending cells.

mod filter;
mod indexer;
mod pending;

pub use filter::filter_cells;
pub use indexer::{IndexerCellSource, DEFAULT_PAGE_SIZE};
pub use pending::PendingCellCollector;

pub(crate) use pending::remove_pending_cell;

use crate::Error;
use ckb_pending_store::Cell;
use ckb_rpc_client::{Order, RpcClient, SearchKey};
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;

/// A lazy, single-pass sequence of cells.
pub type LiveCells = BoxStream<'static, Result<Cell, Error>>;

/// Cells query.
#[derive(Clone, Debug)]
pub struct CellQuery {
    /// Which cells to return
    pub search_key: SearchKey,
    /// Ascending returns settled cells first, descending returns the newest first
    pub order: Order,
    /// Page size used by paginated sources
    pub limit: Option<u32>,
    /// Number of leading cells to skip
    pub skip: Option<usize>,
}

impl CellQuery {
    /// Ascending query without pagination options.
    pub fn new(search_key: SearchKey) -> Self {
        CellQuery {
            search_key,
            order: Order::Asc,
            limit: None,
            skip: None,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Offsets into the merged cells differ from offsets into the live cells,
    /// so `skip` is never forwarded to a live source.
    pub(crate) fn without_skip(mut self) -> Self {
        self.skip = None;
        self
    }
}

/// A source of confirmed, indexed live cells.
pub trait LiveCellSource: Send + Sync {
    /// Starts collecting the live cells matching `query`.
    ///
    /// Nothing is fetched until the returned stream is polled, and dropping
    /// the stream releases whatever it holds.
    fn collector(&self, query: &CellQuery) -> LiveCells;
}

/// Where live cells come from.
#[derive(Clone)]
pub enum CellCollectorProvider {
    /// A source provided by the caller
    Direct(Arc<dyn LiveCellSource>),
    /// The url of an indexer RPC endpoint
    Endpoint(String),
}

impl CellCollectorProvider {
    /// Resolves the provider into a live cell source.
    pub fn resolve(
        self,
        rpc_timeout: Duration,
        page_size: u32,
    ) -> Result<Arc<dyn LiveCellSource>, Error> {
        match self {
            CellCollectorProvider::Direct(source) => Ok(source),
            CellCollectorProvider::Endpoint(url) => {
                let client = RpcClient::with_timeout(&url, rpc_timeout)
                    .map_err(|e| Error::Config(e.to_string()))?;
                Ok(Arc::new(IndexerCellSource::new(Arc::new(client), page_size)))
            }
        }
    }
}

impl From<Arc<dyn LiveCellSource>> for CellCollectorProvider {
    fn from(source: Arc<dyn LiveCellSource>) -> Self {
        CellCollectorProvider::Direct(source)
    }
}

impl From<String> for CellCollectorProvider {
    fn from(url: String) -> Self {
        CellCollectorProvider::Endpoint(url)
    }
}

impl From<&str> for CellCollectorProvider {
    fn from(url: &str) -> Self {
        CellCollectorProvider::Endpoint(url.to_owned())
    }
}
