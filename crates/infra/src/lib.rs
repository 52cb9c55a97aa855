//! Infrastructure layer: stores, locking, orchestration and bulk import.
//!
//! Everything here composes the pure rules from `kardex-inventory` with
//! storage. The stores are owned by [`engine::StockEngine`]; callers never
//! reach the underlying rows directly.

pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod ledger_store;
pub mod location_store;
pub mod locks;
pub mod registry;
pub mod transfer;

mod integration_tests;

pub use config::EngineConfig;
pub use engine::{LocationUpsert, MovementHistoryEntry, ResetReport, StockEngine};
pub use error::{EngineError, StoreError};
pub use import::{ImportReport, RowError, StockInRow, StockOutRow};
pub use ledger_store::{InMemoryLedgerStore, LedgerFilter, LedgerStore};
pub use location_store::{InMemoryLocationStore, LocationStore};
pub use locks::KeyedLocks;
pub use registry::{Registry, RegistryCounts};
pub use transfer::TransferCoordinator;
