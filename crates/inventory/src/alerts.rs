//! Derived, read-only alert views.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kardex_core::{DomainResult, MaterialId, WarehouseId};

use crate::aggregator::{accumulate, totals_by_material, StockSummary};
use crate::catalog::Material;
use crate::movement::{MovementRecord, MovementType};
use crate::tools::ToolMaintenance;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeBalance {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub material_id: MaterialId,
    pub code: String,
    pub name: String,
    pub balance: Decimal,
    pub min_stock: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRank {
    pub material_id: MaterialId,
    pub total_out: Decimal,
}

/// Every bucket whose balance is below zero.
pub fn negative_balances(summary: &StockSummary) -> Vec<NegativeBalance> {
    summary
        .iter()
        .flat_map(|(material_id, buckets)| {
            buckets
                .iter()
                .filter(|(_, balance)| **balance < Decimal::ZERO)
                .map(|(warehouse_id, balance)| NegativeBalance {
                    material_id: *material_id,
                    warehouse_id: *warehouse_id,
                    balance: *balance,
                })
        })
        .collect()
}

/// Materials whose total stock (all warehouses) is at or below their minimum.
///
/// Materials without any movement count as zero stock.
pub fn low_stock(materials: &[Material], summary: &StockSummary) -> DomainResult<Vec<LowStockAlert>> {
    let totals = totals_by_material(summary)?;
    let mut alerts: Vec<LowStockAlert> = materials
        .iter()
        .filter_map(|m| {
            let balance = totals.get(&m.id).copied().unwrap_or(Decimal::ZERO);
            (balance <= m.min_stock).then(|| LowStockAlert {
                material_id: m.id,
                code: m.code.clone(),
                name: m.name.clone(),
                balance,
                min_stock: m.min_stock,
            })
        })
        .collect();
    alerts.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(alerts)
}

/// Materials ranked by total `OUT` quantity, descending, at most `limit` rows.
pub fn most_used<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    limit: usize,
) -> DomainResult<Vec<UsageRank>> {
    let mut totals: BTreeMap<MaterialId, Decimal> = BTreeMap::new();
    for record in records {
        if record.movement_type == MovementType::Out {
            let total = totals.entry(record.material_id).or_insert(Decimal::ZERO);
            accumulate(total, record.quantity.value())?;
        }
    }

    let mut ranked: Vec<UsageRank> = totals
        .into_iter()
        .map(|(material_id, total_out)| UsageRank {
            material_id,
            total_out,
        })
        .collect();
    // Ties keep material id order (the map was already sorted by id).
    ranked.sort_by(|a, b| b.total_out.cmp(&a.total_out));
    ranked.truncate(limit);
    Ok(ranked)
}

/// Schedules due within `[today, today + lookahead_days]`, earliest first.
pub fn maintenance_due(
    schedules: &[ToolMaintenance],
    today: NaiveDate,
    lookahead_days: u32,
) -> Vec<ToolMaintenance> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(lookahead_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut due: Vec<ToolMaintenance> = schedules
        .iter()
        .filter(|s| s.next_due >= today && s.next_due <= horizon)
        .cloned()
        .collect();
    due.sort_by_key(|s| s.next_due);
    due
}
