//! JSON operation surface over a [`StockEngine`].
//!
//! Each request line is `{"op": "...", "args": {...}}`. A reply is either
//! `{"data": ...}` or `{"error": "<code>", "message": "..."}`.

pub mod dto;
pub mod errors;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use kardex_infra::{InMemoryLedgerStore, InMemoryLocationStore, LedgerStore, LocationStore, StockEngine};

use dto::Request;
use errors::{ServiceError, service_error_to_response};

pub struct StockService<L = InMemoryLedgerStore, P = InMemoryLocationStore> {
    engine: StockEngine<L, P>,
}

impl<L, P> StockService<L, P>
where
    L: LedgerStore,
    P: LocationStore,
{
    pub fn new(engine: StockEngine<L, P>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &StockEngine<L, P> {
        &self.engine
    }

    /// Run one request and encode its result.
    pub fn handle(&self, request: Request) -> Result<Value, ServiceError> {
        let op = request.op();
        debug!(op, "handling request");
        let engine = &self.engine;

        match request {
            Request::CreateMovement(req) => encode(engine.create_movement(req)?),
            Request::GetCurrentStock(q) => {
                let balance = engine.current_stock(q.material_id, q.warehouse_id, q.project_id)?;
                encode(json!({
                    "material_id": q.material_id,
                    "warehouse_id": q.warehouse_id,
                    "project_id": q.project_id,
                    "balance": balance,
                }))
            }
            Request::GetStockSummary(q) => encode(engine.stock_summary(q.material_id)?),
            Request::GetStockByProject(q) => encode(engine.stock_by_project(q.project_id)?),
            Request::GetMovementHistory(filter) => encode(engine.movement_history(&filter)?),
            Request::GetNegativeStock => encode(engine.negative_stock()?),
            Request::GetLowStock => encode(engine.low_stock()?),
            Request::GetMostUsed(q) => encode(engine.most_used(q.limit)?),
            Request::UpsertLocation(payload) => encode(engine.upsert_location(payload)?),
            Request::GetLocations(q) => encode(engine.locations(q.material_id, q.warehouse_id)?),
            Request::CreateMaterial(new) => encode(engine.create_material(new)?),
            Request::ListMaterials => encode(engine.materials()?),
            Request::CreateWarehouse(new) => encode(engine.create_warehouse(new)?),
            Request::ListWarehouses => encode(engine.warehouses()?),
            Request::CreateProject(new) => encode(engine.create_project(new)?),
            Request::ListProjects => encode(engine.projects()?),
            Request::AssignTool(cmd) => encode(engine.assign_tool(cmd)?),
            Request::ReturnTool(req) => encode(engine.return_tool(req.assignment_id)?),
            Request::GetAssignedTools => encode(engine.assigned_tools()?),
            Request::RegisterMaintenance(cmd) => encode(engine.register_maintenance(cmd)?),
            Request::GetMaintenanceAlerts(q) => {
                let today = q.today.unwrap_or_else(|| Utc::now().date_naive());
                encode(engine.maintenance_alerts(today, q.lookahead_days)?)
            }
            Request::ImportStockIn(batch) => encode(engine.import_stock_in(batch.rows)),
            Request::ImportStockOut(batch) => encode(engine.import_stock_out(batch.rows)),
            Request::ImportMaterials(batch) => encode(engine.import_materials(batch.rows)),
            Request::ImportWarehouses(batch) => encode(engine.import_warehouses(batch.rows)),
            Request::ImportProjects(batch) => encode(engine.import_projects(batch.rows)),
            Request::ResetAllData => encode(engine.reset_all()?),
        }
    }

    /// Parse, run and encode one JSON request line. Never fails: errors are
    /// returned as error replies.
    pub fn handle_line(&self, line: &str) -> String {
        let reply = serde_json::from_str::<Request>(line)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))
            .and_then(|request| self.handle(request));

        let body = match reply {
            Ok(data) => json!({ "data": data }),
            Err(err) => {
                warn!(code = err.code(), error = %err, "request failed");
                service_error_to_response(&err)
            }
        };
        body.to_string()
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    Ok(serde_json::to_value(value)?)
}
