use std::sync::RwLock;

use chrono::Utc;

use kardex_core::MovementId;
use kardex_inventory::{MovementRecord, PlannedMovement};

use super::r#trait::{LedgerFilter, LedgerStore};
use crate::error::StoreError;

/// In-memory append-only ledger.
///
/// Intended for tests/dev and single-process deployments. Records live in
/// insertion order, so sequence order is vector order.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    records: RwLock<Vec<MovementRecord>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, movement: PlannedMovement) -> Result<MovementRecord, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("ledger"))?;

        let (sequence, created_at) = match records.last() {
            Some(last) => (last.sequence + 1, Utc::now().max(last.created_at)),
            None => (1, Utc::now()),
        };

        let record = MovementRecord::from_planned(movement, MovementId::new(), sequence, created_at);
        records.push(record.clone());
        Ok(record)
    }

    fn query(&self, filter: &LedgerFilter) -> Result<Vec<MovementRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("ledger"))?;

        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn reset(&self) -> Result<usize, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("ledger"))?;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}
