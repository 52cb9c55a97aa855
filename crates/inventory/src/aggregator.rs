//! Stock aggregation: folds ledger records into balances.
//!
//! Pure functions over any iterator of [`MovementRecord`]s. The ledger is the
//! only input, so a balance computed here is always reproducible from history.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kardex_core::{DomainError, DomainResult, MaterialId, ProjectId, WarehouseId};

use crate::movement::MovementRecord;

/// material → warehouse → balance.
pub type StockSummary = BTreeMap<MaterialId, BTreeMap<WarehouseId, Decimal>>;

/// One project-attributed bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStockRow {
    pub project_id: ProjectId,
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub balance: Decimal,
}

/// `balance += delta`, failing instead of overflowing.
pub fn accumulate(balance: &mut Decimal, delta: Decimal) -> DomainResult<()> {
    *balance = balance
        .checked_add(delta)
        .ok_or_else(DomainError::out_of_range)?;
    Ok(())
}

/// Net change `record` makes at each warehouse it touches. The two legs of a
/// TRANSFER hit the same warehouse and cancel out.
fn net_deltas(record: &MovementRecord) -> DomainResult<Vec<(WarehouseId, Decimal)>> {
    let mut net: Vec<(WarehouseId, Decimal)> = Vec::with_capacity(2);
    for (warehouse, delta) in record.warehouse_deltas() {
        match net.iter_mut().find(|(seen, _)| *seen == warehouse) {
            Some((_, total)) => accumulate(total, delta)?,
            None => net.push((warehouse, delta)),
        }
    }
    Ok(net)
}

/// Warehouse-level balance of `material` at `warehouse`.
///
/// With `project` set, only records attributed to that project are folded.
pub fn warehouse_balance<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    material: MaterialId,
    warehouse: WarehouseId,
    project: Option<ProjectId>,
) -> DomainResult<Decimal> {
    let mut balance = Decimal::ZERO;
    for record in records {
        if record.material_id != material || (project.is_some() && record.project_id != project) {
            continue;
        }
        for (w, delta) in net_deltas(record)? {
            if w == warehouse {
                accumulate(&mut balance, delta)?;
            }
        }
    }
    Ok(balance)
}

/// Balances of every (material, warehouse) bucket touched by the ledger.
pub fn summary_by_material<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    material: Option<MaterialId>,
) -> DomainResult<StockSummary> {
    let mut summary = StockSummary::new();
    for record in records {
        if material.is_some_and(|m| m != record.material_id) {
            continue;
        }
        let buckets = summary.entry(record.material_id).or_default();
        for (warehouse, delta) in net_deltas(record)? {
            accumulate(buckets.entry(warehouse).or_insert(Decimal::ZERO), delta)?;
        }
    }
    Ok(summary)
}

/// Per-material total across every warehouse.
pub fn totals_by_material(summary: &StockSummary) -> DomainResult<BTreeMap<MaterialId, Decimal>> {
    summary
        .iter()
        .map(|(material, buckets)| {
            let mut total = Decimal::ZERO;
            for balance in buckets.values() {
                accumulate(&mut total, *balance)?;
            }
            Ok((*material, total))
        })
        .collect()
}

/// Balances of project-attributed stock. Records without a project are skipped.
pub fn summary_by_project<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    project: Option<ProjectId>,
) -> DomainResult<Vec<ProjectStockRow>> {
    let mut buckets: BTreeMap<(ProjectId, MaterialId, WarehouseId), Decimal> = BTreeMap::new();
    for record in records {
        let Some(record_project) = record.project_id else {
            continue;
        };
        if project.is_some_and(|p| p != record_project) {
            continue;
        }
        for (warehouse, delta) in net_deltas(record)? {
            let bucket = buckets
                .entry((record_project, record.material_id, warehouse))
                .or_insert(Decimal::ZERO);
            accumulate(bucket, delta)?;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|((project_id, material_id, warehouse_id), balance)| ProjectStockRow {
            project_id,
            material_id,
            warehouse_id,
            balance,
        })
        .collect())
}
