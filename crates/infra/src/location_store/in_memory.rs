use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;

use kardex_core::{DomainError, MaterialId, WarehouseId};
use kardex_inventory::{LocationKey, LocationRecord, Quantity};

use super::r#trait::LocationStore;
use crate::error::StoreError;

/// In-memory slot projection for tests/dev.
///
/// Each call holds the map lock for its whole read-check-write, which is what
/// makes `consume` and `transfer` atomic.
#[derive(Debug, Default)]
pub struct InMemoryLocationStore {
    rows: RwLock<BTreeMap<LocationKey, LocationRecord>>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(key: &LocationKey) -> StoreError {
    DomainError::not_found(format!(
        "slot {} for material {} in warehouse {}",
        key.slot, key.material_id, key.warehouse_id
    ))
    .into()
}

fn take(
    rows: &mut BTreeMap<LocationKey, LocationRecord>,
    key: &LocationKey,
    quantity: Quantity,
) -> Result<LocationRecord, StoreError> {
    let row = rows.get_mut(key).ok_or_else(|| missing(key))?;
    if row.quantity < quantity.value() {
        return Err(DomainError::insufficient(quantity.value(), row.quantity).into());
    }
    row.quantity = row
        .quantity
        .checked_sub(quantity.value())
        .ok_or_else(DomainError::out_of_range)?;
    row.updated_at = Utc::now();
    Ok(row.clone())
}

/// Quantity `key` would hold after receiving `quantity`. Reads only.
fn grown(
    rows: &BTreeMap<LocationKey, LocationRecord>,
    key: &LocationKey,
    quantity: Quantity,
) -> Result<Decimal, StoreError> {
    let current = rows.get(key).map_or(Decimal::ZERO, |row| row.quantity);
    Ok(current
        .checked_add(quantity.value())
        .ok_or_else(DomainError::out_of_range)?)
}

fn put(
    rows: &mut BTreeMap<LocationKey, LocationRecord>,
    key: LocationKey,
    total: Decimal,
) -> LocationRecord {
    let now = Utc::now();
    let row = rows
        .entry(key.clone())
        .or_insert_with(|| LocationRecord::new(key, Decimal::ZERO, now));
    row.quantity = total;
    row.updated_at = now;
    row.clone()
}

impl LocationStore for InMemoryLocationStore {
    fn get(&self, key: &LocationKey) -> Result<Option<LocationRecord>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        Ok(rows.get(key).cloned())
    }

    fn upsert(&self, key: LocationKey, quantity: Decimal) -> Result<LocationRecord, StoreError> {
        if quantity < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "slot quantity cannot be negative (got {quantity})"
            ))
            .into());
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        let now = Utc::now();
        let row = rows
            .entry(key.clone())
            .or_insert_with(|| LocationRecord::new(key, Decimal::ZERO, now));
        row.quantity = quantity.normalize();
        row.updated_at = now;
        Ok(row.clone())
    }

    fn consume(&self, key: &LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        take(&mut rows, key, quantity)
    }

    fn add(&self, key: LocationKey, quantity: Quantity) -> Result<LocationRecord, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        let total = grown(&rows, &key, quantity)?;
        Ok(put(&mut rows, key, total))
    }

    fn transfer(
        &self,
        source: &LocationKey,
        destination: LocationKey,
        quantity: Quantity,
    ) -> Result<(LocationRecord, LocationRecord), StoreError> {
        if *source == destination {
            return Err(DomainError::validation("source and destination slot must differ").into());
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        // Both sides are checked before either row changes.
        let total = grown(&rows, &destination, quantity)?;
        let from = take(&mut rows, source, quantity)?;
        let to = put(&mut rows, destination, total);
        Ok((from, to))
    }

    fn restore(&self, key: &LocationKey, previous: Option<LocationRecord>) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        match previous {
            Some(row) => {
                rows.insert(key.clone(), row);
            }
            None => {
                rows.remove(key);
            }
        }
        Ok(())
    }

    fn list(
        &self,
        material_id: Option<MaterialId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<LocationRecord>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        Ok(rows
            .values()
            .filter(|r| material_id.is_none_or(|m| m == r.material_id))
            .filter(|r| warehouse_id.is_none_or(|w| w == r.warehouse_id))
            .cloned()
            .collect())
    }

    fn reset(&self) -> Result<usize, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("locations"))?;
        let removed = rows.len();
        rows.clear();
        Ok(removed)
    }
}
