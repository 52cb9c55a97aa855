//! Bulk imports with row-level fault isolation.
//!
//! Rows arrive already parsed and typed. Each row is applied on its own; a
//! failing row is recorded in the report and the next row is processed.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kardex_inventory::{
    MovementRequest, MovementType, NewMaterial, NewProject, NewWarehouse, SlotInput,
};

use crate::engine::StockEngine;
use crate::error::EngineError;
use crate::ledger_store::LedgerStore;
use crate::location_store::LocationStore;

/// One stock-in row, referencing catalog entries by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInRow {
    pub material_code: String,
    pub warehouse_code: String,
    #[serde(default)]
    pub project_code: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// One stock-out row. The slot columns name where the stock was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOutRow {
    pub material_code: String,
    pub warehouse_code: String,
    #[serde(default)]
    pub project_code: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub r#box: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A rejected row: 1-based sheet row number (header is row 1), the row's key
/// fields and the failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub identity: BTreeMap<String, String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub failed: usize,
    pub total: usize,
    pub errors: Vec<RowError>,
}

/// Data rows start below the header row.
const FIRST_DATA_ROW: usize = 2;

fn run_import<R>(
    kind: &str,
    rows: Vec<R>,
    identity: impl Fn(&R) -> BTreeMap<String, String>,
    mut apply: impl FnMut(R) -> Result<(), EngineError>,
) -> ImportReport {
    let mut report = ImportReport {
        total: rows.len(),
        ..ImportReport::default()
    };

    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = idx + FIRST_DATA_ROW;
        let key = identity(&row);
        match apply(row) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                warn!(import = kind, row = row_number, error = %e, "import row rejected");
                report.failed += 1;
                report.errors.push(RowError {
                    row: row_number,
                    identity: key,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        import = kind,
        inserted = report.inserted,
        failed = report.failed,
        total = report.total,
        "import finished"
    );
    report
}

fn fields<const N: usize>(pairs: [(&str, Option<&str>); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v.to_string())))
        .collect()
}

impl<L, P> StockEngine<L, P>
where
    L: LedgerStore,
    P: LocationStore,
{
    pub fn import_stock_in(&self, rows: Vec<StockInRow>) -> ImportReport {
        run_import(
            "stock_in",
            rows,
            |r: &StockInRow| {
                fields([
                    ("material_code", Some(r.material_code.as_str())),
                    ("warehouse_code", Some(r.warehouse_code.as_str())),
                    ("project_code", r.project_code.as_deref()),
                ])
            },
            |r: StockInRow| {
                let material = self.material_by_code(&r.material_code)?;
                let warehouse = self.warehouse_by_code(&r.warehouse_code)?;
                let mut request =
                    MovementRequest::new(material.id, warehouse.id, MovementType::In, r.quantity);
                if let Some(code) = non_blank(&r.project_code) {
                    request = request.with_project(self.project_by_code(code)?.id);
                }
                request.reference = r.reference;
                request.notes = r.notes;
                request.created_by = r.created_by;
                self.create_movement(request).map(|_| ())
            },
        )
    }

    pub fn import_stock_out(&self, rows: Vec<StockOutRow>) -> ImportReport {
        run_import(
            "stock_out",
            rows,
            |r: &StockOutRow| {
                fields([
                    ("material_code", Some(r.material_code.as_str())),
                    ("warehouse_code", Some(r.warehouse_code.as_str())),
                    ("project_code", r.project_code.as_deref()),
                    ("rack", r.rack.as_deref()),
                    ("level", r.level.as_deref()),
                    ("box", r.r#box.as_deref()),
                    ("position", r.position.as_deref()),
                ])
            },
            |r: StockOutRow| {
                let material = self.material_by_code(&r.material_code)?;
                let warehouse = self.warehouse_by_code(&r.warehouse_code)?;
                let mut request =
                    MovementRequest::new(material.id, warehouse.id, MovementType::Out, r.quantity);
                if let Some(code) = non_blank(&r.project_code) {
                    request = request.with_project(self.project_by_code(code)?.id);
                }
                request.source_slot = Some(SlotInput {
                    rack: r.rack,
                    level: r.level,
                    r#box: r.r#box,
                    position: r.position,
                });
                request.reference = r.reference;
                request.notes = r.notes;
                request.created_by = r.created_by;
                self.create_movement(request).map(|_| ())
            },
        )
    }

    pub fn import_materials(&self, rows: Vec<NewMaterial>) -> ImportReport {
        run_import(
            "materials",
            rows,
            |r: &NewMaterial| code_and_name(&r.code, &r.name),
            |r: NewMaterial| self.create_material(r).map(|_| ()),
        )
    }

    pub fn import_warehouses(&self, rows: Vec<NewWarehouse>) -> ImportReport {
        run_import(
            "warehouses",
            rows,
            |r: &NewWarehouse| code_and_name(&r.code, &r.name),
            |r: NewWarehouse| self.create_warehouse(r).map(|_| ()),
        )
    }

    pub fn import_projects(&self, rows: Vec<NewProject>) -> ImportReport {
        run_import(
            "projects",
            rows,
            |r: &NewProject| code_and_name(&r.code, &r.name),
            |r: NewProject| self.create_project(r).map(|_| ()),
        )
    }
}

fn code_and_name(code: &str, name: &str) -> BTreeMap<String, String> {
    fields([("code", Some(code)), ("name", Some(name))])
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
