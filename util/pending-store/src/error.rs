//！The error type for the pending store.

use thiserror::Error;

/// A list specifying general categories of pending store error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage backend error
    #[error("Pending store backend error {0}")]
    Backend(String),
}
