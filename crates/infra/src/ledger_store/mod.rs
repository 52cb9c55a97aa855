//! Append-only movement ledger boundary.
//!
//! The ledger is the sole source of truth for warehouse-level balances. This
//! module defines the storage abstraction without making storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerFilter, LedgerStore};
