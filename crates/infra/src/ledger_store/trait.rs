use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use kardex_core::{MaterialId, ProjectId, WarehouseId};
use kardex_inventory::{MovementRecord, MovementType, PlannedMovement};

use crate::error::StoreError;

/// Filter criteria for ledger queries. Every field is optional and they
/// combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub material_id: Option<MaterialId>,
    pub project_id: Option<ProjectId>,
    /// Matches records whose `from` or `to` side is this warehouse.
    pub warehouse_id: Option<WarehouseId>,
    pub movement_type: Option<MovementType>,
    pub created_by: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    pub fn for_material(material_id: MaterialId) -> Self {
        Self {
            material_id: Some(material_id),
            ..Default::default()
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn of_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }

    /// Whole calendar days `[from 00:00, to 23:59:59.999…]`, UTC.
    pub fn between_dates(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.created_from = Some(from.and_time(NaiveTime::MIN).and_utc());
        self.created_to = Some(match to.succ_opt() {
            Some(next) => next.and_time(NaiveTime::MIN).and_utc() - Duration::nanoseconds(1),
            None => DateTime::<Utc>::MAX_UTC,
        });
        self
    }

    pub fn matches(&self, record: &MovementRecord) -> bool {
        if self.material_id.is_some_and(|m| m != record.material_id) {
            return false;
        }
        if self.project_id.is_some() && self.project_id != record.project_id {
            return false;
        }
        if self.warehouse_id.is_some_and(|w| !record.involves_warehouse(w)) {
            return false;
        }
        if self.movement_type.is_some_and(|t| t != record.movement_type) {
            return false;
        }
        if self
            .created_by
            .as_deref()
            .is_some_and(|actor| actor != record.created_by)
        {
            return false;
        }
        if self.created_from.is_some_and(|from| record.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| record.created_at > to) {
            return false;
        }
        true
    }
}

/// Append-only store of movement records.
///
/// ## Append Semantics
///
/// `append()` assigns the record identifier, a sequence number (last + 1) and
/// the creation timestamp. Timestamps never go backwards in sequence order.
/// The record is immutable afterwards; there is no update or delete for normal
/// operation.
///
/// ## Query Semantics
///
/// `query()` returns matching records in sequence order.
pub trait LedgerStore: Send + Sync {
    fn append(&self, movement: PlannedMovement) -> Result<MovementRecord, StoreError>;

    fn query(&self, filter: &LedgerFilter) -> Result<Vec<MovementRecord>, StoreError>;

    /// Administrative wipe (full data reset). Returns the number of records removed.
    fn reset(&self) -> Result<usize, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn append(&self, movement: PlannedMovement) -> Result<MovementRecord, StoreError> {
        (**self).append(movement)
    }

    fn query(&self, filter: &LedgerFilter) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).query(filter)
    }

    fn reset(&self) -> Result<usize, StoreError> {
        (**self).reset()
    }
}
