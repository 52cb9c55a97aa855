use std::sync::Arc;

use rust_decimal::Decimal;

use kardex_core::{MaterialId, WarehouseId};
use kardex_inventory::{LocationKey, LocationRecord, Quantity};

use crate::error::StoreError;

/// Slot projection store.
///
/// Every mutation is atomic per call: a failed call leaves every row as it was.
/// Quantities never go below zero; a consume that would do so fails with
/// `InsufficientStock` and a consume from a missing row fails with `NotFound`.
/// A result outside the decimal range fails with `Validation` before any row
/// changes.
pub trait LocationStore: Send + Sync {
    fn get(&self, key: &LocationKey) -> Result<Option<LocationRecord>, StoreError>;

    /// Set the quantity of a slot row, creating it when missing.
    ///
    /// Idempotent: repeating the call with the same quantity is a no-op on the value.
    fn upsert(&self, key: LocationKey, quantity: Decimal) -> Result<LocationRecord, StoreError>;

    /// Decrement an existing row.
    fn consume(&self, key: &LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError>;

    /// Increment a row, creating it at zero first when missing.
    fn add(&self, key: LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError>;

    /// [`consume`](Self::consume) from `source` then [`add`](Self::add) to
    /// `destination`, as one atomic step: both checks pass before either row
    /// changes, and no reader sees one half without the other. TRANSFER goes
    /// through this instead of two separate calls.
    ///
    /// Returns the updated `(source, destination)` rows.
    fn transfer(
        &self,
        source: &LocationKey,
        destination: LocationKey,
        quantity: Quantity,
    ) -> Result<(LocationRecord, LocationRecord), StoreError>;

    /// Put a row back to an earlier snapshot; `None` removes it.
    fn restore(&self, key: &LocationKey, previous: Option<LocationRecord>) -> Result<(), StoreError>;

    /// Rows ordered by key, optionally narrowed to a material and/or warehouse.
    fn list(
        &self,
        material_id: Option<MaterialId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<LocationRecord>, StoreError>;

    /// Administrative wipe. Returns the number of rows removed.
    fn reset(&self) -> Result<usize, StoreError>;
}

impl<S> LocationStore for Arc<S>
where
    S: LocationStore + ?Sized,
{
    fn get(&self, key: &LocationKey) -> Result<Option<LocationRecord>, StoreError> {
        (**self).get(key)
    }

    fn upsert(&self, key: LocationKey, quantity: Decimal) -> Result<LocationRecord, StoreError> {
        (**self).upsert(key, quantity)
    }

    fn consume(&self, key: &LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError> {
        (**self).consume(key, quantity)
    }

    fn add(&self, key: LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError> {
        (**self).add(key, quantity)
    }

    fn transfer(
        &self,
        source: &LocationKey,
        destination: LocationKey,
        quantity: Quantity,
    ) -> Result<(LocationRecord, LocationRecord), StoreError> {
        (**self).transfer(source, destination, quantity)
    }

    fn restore(&self, key: &LocationKey, previous: Option<LocationRecord>) -> Result<(), StoreError> {
        (**self).restore(key, previous)
    }

    fn list(
        &self,
        material_id: Option<MaterialId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<LocationRecord>, StoreError> {
        (**self).list(material_id, warehouse_id)
    }

    fn reset(&self) -> Result<usize, StoreError> {
        (**self).reset()
    }
}
