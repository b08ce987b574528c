use super::{CellQuery, LiveCellSource, LiveCells};
use crate::Error;
use async_stream::try_stream;
use ckb_jsonrpc_types::JsonBytes;
use ckb_pending_store::Cell;
use ckb_rpc_client::{IndexerCell, RpcClient};
use std::sync::Arc;

/// Default number of cells requested per `get_cells` call.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Live cells served by the `get_cells` RPC of an indexer.
///
/// Pages are fetched lazily, one `get_cells` call each time the previous
/// page is exhausted, until the indexer returns an empty page.
#[derive(Clone)]
pub struct IndexerCellSource {
    client: Arc<RpcClient>,
    page_size: u32,
}

impl IndexerCellSource {
    pub fn new(client: Arc<RpcClient>, page_size: u32) -> Self {
        IndexerCellSource {
            client,
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }
}

impl LiveCellSource for IndexerCellSource {
    fn collector(&self, query: &CellQuery) -> LiveCells {
        let client = Arc::clone(&self.client);
        let search_key = query.search_key.clone();
        let order = query.order;
        let limit = query.limit.filter(|limit| *limit > 0).unwrap_or(self.page_size);

        Box::pin(try_stream! {
            let mut cursor: Option<JsonBytes> = None;
            loop {
                let page = client
                    .get_cells(search_key.clone(), order, limit, cursor.take())
                    .await
                    .map_err(Error::collector_source)?;
                if page.objects.is_empty() {
                    break;
                }
                for cell in page.objects {
                    yield into_cell(cell);
                }
                cursor = Some(page.last_cursor);
            }
        })
    }
}

fn into_cell(cell: IndexerCell) -> Cell {
    Cell {
        output: cell.output.into(),
        output_data: cell.output_data.map(JsonBytes::into_bytes),
        out_point: cell.out_point.into(),
        block_number: Some(cell.block_number.value()),
        tx_index: Some(cell.tx_index.value()),
    }
}
