//! The pending transaction store.
//!
//! Keeps every transaction that was accepted by a node but is not yet
//! committed or rejected, and derives from them the out points they spend
//! and the cells they create.

mod error;
mod memory;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryPendingStore;
pub use store::PendingStore;
pub use types::{Cell, PendingTransaction};
