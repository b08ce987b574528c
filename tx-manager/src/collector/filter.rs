use ckb_pending_store::Cell;
use ckb_rpc_client::{ScriptType, SearchKey, SearchKeyFilter, SearchMode};
use ckb_types::{bytes::Bytes, packed, prelude::*};

/// Keeps the pending cells matched by `search_key`, the way the indexer
/// matches live cells.
///
/// Pending cells are not in any block yet, a search key with a block range
/// matches none of them.
pub fn filter_cells(cells: Vec<Cell>, search_key: &SearchKey) -> Vec<Cell> {
    let default_filter = SearchKeyFilter::default();
    let filter = search_key.filter.as_ref().unwrap_or(&default_filter);
    if filter.block_range.is_some() {
        return Vec::new();
    }
    let script: packed::Script = search_key.script.clone().into();
    let filter_script: Option<packed::Script> = filter.script.clone().map(Into::into);
    let with_data = search_key.with_data.unwrap_or(true);

    cells
        .into_iter()
        .filter(|cell| {
            let (searched, other) = match search_key.script_type {
                ScriptType::Lock => (Some(cell.output.lock()), cell.output.type_().to_opt()),
                ScriptType::Type => (cell.output.type_().to_opt(), Some(cell.output.lock())),
            };
            let searched_matched = searched.map_or(false, |searched| {
                script_matches(&searched, &script, search_key.script_search_mode.as_ref())
            });
            if !searched_matched {
                return false;
            }

            if let Some(filter_script) = filter_script.as_ref() {
                let matched = other.as_ref().map_or(false, |other| {
                    script_matches(other, filter_script, Some(&SearchMode::Prefix))
                });
                if !matched {
                    return false;
                }
            }

            if let Some(range) = filter.script_len_range.as_ref() {
                let script_len = other
                    .as_ref()
                    .map(|script| extract_raw_data(script).len())
                    .unwrap_or_default();
                if !range.contains(script_len as u64) {
                    return false;
                }
            }

            let data = cell.output_data.clone().unwrap_or_default();
            if let Some(expected) = filter.output_data.as_ref() {
                if !bytes_match(
                    &data,
                    expected.as_bytes(),
                    filter.output_data_filter_mode.as_ref(),
                ) {
                    return false;
                }
            }

            if let Some(range) = filter.output_data_len_range.as_ref() {
                if !range.contains(data.len() as u64) {
                    return false;
                }
            }

            if let Some(range) = filter.output_capacity_range.as_ref() {
                let capacity: u64 = cell.output.capacity().unpack();
                if !range.contains(capacity) {
                    return false;
                }
            }

            true
        })
        .map(|mut cell| {
            if !with_data {
                cell.output_data = None;
            }
            cell
        })
        .collect()
}

fn script_matches(
    script: &packed::Script,
    expected: &packed::Script,
    mode: Option<&SearchMode>,
) -> bool {
    script.code_hash() == expected.code_hash()
        && script.hash_type() == expected.hash_type()
        && bytes_match(
            &script.args().raw_data(),
            &expected.args().raw_data(),
            mode,
        )
}

fn bytes_match(actual: &[u8], expected: &[u8], mode: Option<&SearchMode>) -> bool {
    match mode {
        Some(SearchMode::Prefix) | None => actual.starts_with(expected),
        Some(SearchMode::Exact) => actual == expected,
        Some(SearchMode::Partial) => memchr::memmem::find(actual, expected).is_some(),
    }
}

fn extract_raw_data(script: &packed::Script) -> Bytes {
    [
        script.code_hash().as_slice(),
        script.hash_type().as_slice(),
        script.args().raw_data().as_ref(),
    ]
    .concat()
    .into()
}
