//! Slot projection storage.
//!
//! Per-slot quantities are a mutable projection next to the ledger. Rows are
//! keyed by (material, warehouse, slot) and never go below zero.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLocationStore;
pub use r#trait::LocationStore;
