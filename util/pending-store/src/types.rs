use ckb_types::{
    bytes::Bytes,
    core::{BlockNumber, TransactionView},
    packed::{Byte32, CellOutput, OutPoint},
    prelude::*,
};

/// A transaction accepted by a node, waiting to be committed or rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    /// The hash returned by the node when it accepted the transaction
    pub hash: Byte32,
    /// The transaction body
    pub transaction: TransactionView,
}

impl PendingTransaction {
    /// Tags a transaction with the hash the node accepted it under.
    pub fn new(hash: Byte32, transaction: TransactionView) -> Self {
        PendingTransaction { hash, transaction }
    }

    /// The out points consumed by this transaction.
    pub fn spent_out_points(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.transaction.input_pts_iter()
    }

    /// The cells created by this transaction, each located at `(hash, index)`.
    pub fn created_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.transaction
            .outputs_with_data_iter()
            .enumerate()
            .map(move |(index, (output, data))| Cell {
                output,
                output_data: Some(data),
                out_point: OutPoint::new(self.hash.clone(), index as u32),
                block_number: None,
                tx_index: None,
            })
    }

    /// Whether `out_point` locates one of the outputs of this transaction.
    pub fn creates(&self, out_point: &OutPoint) -> bool {
        let index: u32 = out_point.index().unpack();
        out_point.tx_hash() == self.hash && (index as usize) < self.transaction.outputs().len()
    }
}

/// A cell, either live on chain or created by a pending transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Cell output
    pub output: CellOutput,
    /// Cell data, `None` if the query did not ask for it
    pub output_data: Option<Bytes>,
    /// Out point locating the cell
    pub out_point: OutPoint,
    /// Number of the block that committed the cell, `None` while pending
    pub block_number: Option<BlockNumber>,
    /// Position of the creating transaction in its block, `None` while pending
    pub tx_index: Option<u32>,
}

impl Cell {
    /// Whether the cell only exists because a pending transaction created it.
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}
