//! Wire types of the indexer `get_cells` RPC, client side.

use ckb_jsonrpc_types::{BlockNumber, CellOutput, JsonBytes, OutPoint, Script, Uint32, Uint64};
use serde::{Deserialize, Serialize};

/// Search key of `get_cells`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchKey {
    /// Script
    pub script: Script,
    /// Script Type
    pub script_type: ScriptType,
    /// Script search mode, optional default is `prefix`
    pub script_search_mode: Option<SearchMode>,
    /// Filter cells by following conditions, all conditions are optional
    pub filter: Option<SearchKeyFilter>,
    /// Optional default is `true`, if set to false the returned `output_data` is null
    pub with_data: Option<bool>,
    /// Optional default is `false`
    pub group_by_transaction: Option<bool>,
}

impl SearchKey {
    /// Prefix search of the cells whose `script_type` script is `script`.
    pub fn new(script: Script, script_type: ScriptType) -> Self {
        SearchKey {
            script,
            script_type,
            script_search_mode: None,
            filter: None,
            with_data: None,
            group_by_transaction: None,
        }
    }
}

/// Search mode, default is prefix search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Search with prefix
    #[default]
    Prefix,
    /// Search with exact match
    Exact,
    /// Search with partial match
    Partial,
}

/// Half-open range `[start, end)`, serialized as a two elements array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueRange {
    inner: [Uint64; 2],
}

impl ValueRange {
    pub fn new(start: u64, end: u64) -> Self {
        ValueRange {
            inner: [start.into(), end.into()],
        }
    }

    /// Inclusive lower bound
    pub fn start(&self) -> u64 {
        self.inner[0].value()
    }

    /// Exclusive upper bound
    pub fn end(&self) -> u64 {
        self.inner[1].value()
    }

    pub fn contains(&self, value: u64) -> bool {
        value >= self.start() && value < self.end()
    }
}

/// The `filter` of a search key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchKeyFilter {
    /// If search script type is lock, filter cells by type script prefix, and vice versa
    pub script: Option<Script>,
    pub script_len_range: Option<ValueRange>,
    pub output_data: Option<JsonBytes>,
    /// Optional default is `prefix`
    pub output_data_filter_mode: Option<SearchMode>,
    pub output_data_len_range: Option<ValueRange>,
    pub output_capacity_range: Option<ValueRange>,
    pub block_range: Option<ValueRange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    Lock,
    Type,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Desc,
    Asc,
}

/// Live cell returned by `get_cells`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerCell {
    pub output: CellOutput,
    pub output_data: Option<JsonBytes>,
    pub out_point: OutPoint,
    pub block_number: BlockNumber,
    pub tx_index: Uint32,
}

/// A page of objects and the cursor to resume after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination<T> {
    pub objects: Vec<T>,
    pub last_cursor: JsonBytes,
}
