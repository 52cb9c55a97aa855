//! The stock engine: the synchronous operation surface over the ledger, the
//! slot projection and the reference data.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kardex_core::{AssignmentId, DomainError, MaterialId, ProjectId, WarehouseId};
use kardex_inventory::aggregator::{self, ProjectStockRow, StockSummary};
use kardex_inventory::alerts::{self, LowStockAlert, NegativeBalance, UsageRank};
use kardex_inventory::{
    AssignTool, LocationKey, LocationRecord, Material, MovementPlanner, MovementRecord,
    MovementRequest, MovementType, NewMaterial, NewProject, NewWarehouse, Project,
    RegisterMaintenance, SlotInput, StockSnapshot, ToolAssignment, ToolMaintenance,
    ValidatedMovement, Warehouse,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger_store::{InMemoryLedgerStore, LedgerFilter, LedgerStore};
use crate::location_store::{InMemoryLocationStore, LocationStore};
use crate::locks::KeyedLocks;
use crate::registry::{Registry, RegistryCounts};
use crate::transfer::TransferCoordinator;

/// Payload of [`StockEngine::upsert_location`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUpsert {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub slot: SlotInput,
    pub quantity: Decimal,
}

/// A ledger record with its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementHistoryEntry {
    #[serde(flatten)]
    pub record: MovementRecord,
    pub description: String,
}

/// Rows removed by [`StockEngine::reset_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    pub movements: usize,
    pub locations: usize,
    #[serde(flatten)]
    pub registry: RegistryCounts,
}

/// Stock ledger and location tracking engine.
///
/// ## Movement Pipeline
///
/// `create_movement` runs every request through the same steps:
///
/// 1. **Validate**: shape checks by the [`MovementPlanner`] (no stored state)
/// 2. **Resolve**: referenced material, warehouse and project must exist
/// 3. **Lock**: the (material, warehouse) key is held until the write is done
/// 4. **Snapshot**: read the warehouse balance and/or source slot the type needs
/// 5. **Plan**: classify against the snapshot (sufficiency, ADJUST diff)
/// 6. **Persist**: `TRANSFER` goes through the [`TransferCoordinator`], every
///    other type is a single ledger append
///
/// Steps 4 to 6 run under the key lock, so two movements on the same key can
/// never both pass a stale sufficiency check.
///
/// ## Balance Scoping
///
/// Sufficiency checks and the ADJUST diff use the warehouse balance across all
/// projects. A project on a request only attributes the movement.
///
/// ## Slots
///
/// Only `TRANSFER` and `upsert_location` write slot rows. `OUT` and `ADJUST`
/// record their source slot on the ledger record as a trace.
#[derive(Debug)]
pub struct StockEngine<L = InMemoryLedgerStore, P = InMemoryLocationStore> {
    ledger: L,
    locations: P,
    registry: Registry,
    locks: KeyedLocks<(MaterialId, WarehouseId)>,
    planner: MovementPlanner,
    config: EngineConfig,
}

impl StockEngine {
    /// Engine over fresh in-memory stores.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(InMemoryLedgerStore::new(), InMemoryLocationStore::new(), config)
    }
}

impl<L, P> StockEngine<L, P>
where
    L: LedgerStore,
    P: LocationStore,
{
    pub fn new(ledger: L, locations: P, config: EngineConfig) -> Self {
        Self {
            ledger,
            locations,
            registry: Registry::new(),
            locks: KeyedLocks::new(),
            planner: MovementPlanner::new(config.system_actor.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- movements ----

    pub fn create_movement(&self, request: MovementRequest) -> Result<MovementRecord, EngineError> {
        let validated = self.planner.validate(&request).inspect_err(|e| {
            warn!(error = %e, movement_type = %request.movement_type, "movement rejected")
        })?;

        self.ensure_material(validated.material_id)?;
        self.ensure_warehouse(validated.warehouse_id)?;
        if let Some(project_id) = validated.project_id {
            self.ensure_project(project_id)?;
        }

        let key = (validated.material_id, validated.warehouse_id);
        self.locks.with(&key, || self.commit(validated))?
    }

    /// Snapshot, plan and persist. Caller holds the key lock.
    fn commit(&self, validated: ValidatedMovement) -> Result<MovementRecord, EngineError> {
        let mut snapshot = StockSnapshot::default();
        if validated.needs_warehouse_balance() {
            snapshot.warehouse_balance =
                self.balance(validated.material_id, validated.warehouse_id, None)?;
        }
        if validated.needs_slot_quantity() {
            if let Some(slot) = &validated.source_slot {
                let key =
                    LocationKey::new(validated.material_id, validated.warehouse_id, slot.clone());
                snapshot.source_slot_quantity = self.locations.get(&key)?.map(|row| row.quantity);
            }
        }

        if validated.movement_type == MovementType::Adjust {
            debug!(
                material_id = %validated.material_id,
                warehouse_id = %validated.warehouse_id,
                target = %validated.amount,
                current = %snapshot.warehouse_balance,
                diff = ?validated.amount.checked_sub(snapshot.warehouse_balance),
                "adjustment planned"
            );
        }

        let movement_type = validated.movement_type;
        let planned = validated.plan(&snapshot).inspect_err(|e| {
            if matches!(e, DomainError::InsufficientStock { .. }) {
                warn!(error = %e, %movement_type, "sufficiency check failed");
            }
        })?;

        if movement_type == MovementType::Transfer {
            return TransferCoordinator::new(&self.ledger, &self.locations).execute(planned);
        }

        let record = self.ledger.append(planned)?;
        info!(
            movement_id = %record.id,
            sequence = record.sequence,
            movement_type = %record.movement_type,
            material_id = %record.material_id,
            quantity = %record.quantity,
            created_by = %record.created_by,
            "movement committed"
        );
        Ok(record)
    }

    // ---- balances ----

    /// Warehouse-level balance, optionally restricted to one project's records.
    pub fn current_stock(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        project_id: Option<ProjectId>,
    ) -> Result<Decimal, EngineError> {
        self.balance(material_id, warehouse_id, project_id)
    }

    fn balance(
        &self,
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        project_id: Option<ProjectId>,
    ) -> Result<Decimal, EngineError> {
        let filter = LedgerFilter {
            project_id,
            ..LedgerFilter::for_material(material_id).in_warehouse(warehouse_id)
        };
        let records = self.ledger.query(&filter)?;
        Ok(aggregator::warehouse_balance(
            &records,
            material_id,
            warehouse_id,
            project_id,
        )?)
    }

    pub fn stock_summary(&self, material_id: Option<MaterialId>) -> Result<StockSummary, EngineError> {
        let filter = LedgerFilter {
            material_id,
            ..Default::default()
        };
        let records = self.ledger.query(&filter)?;
        Ok(aggregator::summary_by_material(&records, material_id)?)
    }

    pub fn stock_by_project(
        &self,
        project_id: Option<ProjectId>,
    ) -> Result<Vec<ProjectStockRow>, EngineError> {
        let filter = LedgerFilter {
            project_id,
            ..Default::default()
        };
        let records = self.ledger.query(&filter)?;
        Ok(aggregator::summary_by_project(&records, project_id)?)
    }

    /// Ledger records matching `filter`, in sequence order, with descriptions.
    ///
    /// Like [`StockEngine::locations`], a filter naming both a material and a
    /// warehouse reads under that key's lock.
    pub fn movement_history(
        &self,
        filter: &LedgerFilter,
    ) -> Result<Vec<MovementHistoryEntry>, EngineError> {
        let records = match (filter.material_id, filter.warehouse_id) {
            (Some(m), Some(w)) => self.locks.with(&(m, w), || self.ledger.query(filter))??,
            _ => self.ledger.query(filter)?,
        };
        records
            .into_iter()
            .map(|record| {
                let material = match self.registry.material(record.material_id)? {
                    Some(m) => m.name,
                    None => record.material_id.to_string(),
                };
                let warehouse_id = record.to_warehouse.or(record.from_warehouse);
                let warehouse = match warehouse_id {
                    Some(id) => match self.registry.warehouse(id)? {
                        Some(w) => w.name,
                        None => id.to_string(),
                    },
                    None => String::new(),
                };
                let description = record.describe(&material, &warehouse);
                Ok(MovementHistoryEntry {
                    record,
                    description,
                })
            })
            .collect()
    }

    // ---- alerts ----

    pub fn negative_stock(&self) -> Result<Vec<NegativeBalance>, EngineError> {
        Ok(alerts::negative_balances(&self.stock_summary(None)?))
    }

    pub fn low_stock(&self) -> Result<Vec<LowStockAlert>, EngineError> {
        let materials = self.registry.materials()?;
        Ok(alerts::low_stock(&materials, &self.stock_summary(None)?)?)
    }

    /// Usage ranking; `limit` defaults to the configured size.
    pub fn most_used(&self, limit: Option<usize>) -> Result<Vec<UsageRank>, EngineError> {
        let filter = LedgerFilter::default().of_type(MovementType::Out);
        let records = self.ledger.query(&filter)?;
        Ok(alerts::most_used(
            &records,
            limit.unwrap_or(self.config.most_used_limit),
        )?)
    }

    /// Schedules due within `[today, today + lookahead]`; `lookahead_days`
    /// defaults to the configured window.
    pub fn maintenance_alerts(
        &self,
        today: NaiveDate,
        lookahead_days: Option<u32>,
    ) -> Result<Vec<ToolMaintenance>, EngineError> {
        let schedules = self.registry.maintenance_schedules()?;
        Ok(alerts::maintenance_due(
            &schedules,
            today,
            lookahead_days.unwrap_or(self.config.maintenance_lookahead_days),
        ))
    }

    // ---- slots ----

    /// Set a slot's absolute quantity, creating the row when missing.
    pub fn upsert_location(&self, payload: LocationUpsert) -> Result<LocationRecord, EngineError> {
        let slot = payload.slot.resolve("slot")?;
        self.ensure_material(payload.material_id)?;
        self.ensure_warehouse(payload.warehouse_id)?;

        let key = LocationKey::new(payload.material_id, payload.warehouse_id, slot);
        let lock_key = (payload.material_id, payload.warehouse_id);
        let row = self
            .locks
            .with(&lock_key, || self.locations.upsert(key, payload.quantity))??;

        info!(
            material_id = %row.material_id,
            warehouse_id = %row.warehouse_id,
            slot = %row.slot,
            quantity = %row.quantity,
            "location upserted"
        );
        Ok(row)
    }

    /// Slot rows, optionally filtered.
    ///
    /// A read scoped to one (material, warehouse) takes that key's lock, so it
    /// never observes a TRANSFER between its slot move and its ledger append.
    /// Broader reads do not lock and may see that window on some key.
    pub fn locations(
        &self,
        material_id: Option<MaterialId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<LocationRecord>, EngineError> {
        let rows = match (material_id, warehouse_id) {
            (Some(m), Some(w)) => self
                .locks
                .with(&(m, w), || self.locations.list(material_id, warehouse_id))??,
            _ => self.locations.list(material_id, warehouse_id)?,
        };
        Ok(rows)
    }

    // ---- catalog ----

    pub fn create_material(&self, new: NewMaterial) -> Result<Material, EngineError> {
        let material = self.registry.create_material(new, Utc::now())?;
        info!(material_id = %material.id, code = %material.code, "material created");
        Ok(material)
    }

    pub fn materials(&self) -> Result<Vec<Material>, EngineError> {
        Ok(self.registry.materials()?)
    }

    pub fn material_by_code(&self, code: &str) -> Result<Material, EngineError> {
        self.registry
            .material_by_code(code)?
            .ok_or_else(|| EngineError::NotFound(format!("material code '{}'", code.trim())))
    }

    pub fn create_warehouse(&self, new: NewWarehouse) -> Result<Warehouse, EngineError> {
        let warehouse = self.registry.create_warehouse(new)?;
        info!(warehouse_id = %warehouse.id, code = %warehouse.code, "warehouse created");
        Ok(warehouse)
    }

    pub fn warehouses(&self) -> Result<Vec<Warehouse>, EngineError> {
        Ok(self.registry.warehouses()?)
    }

    pub fn warehouse_by_code(&self, code: &str) -> Result<Warehouse, EngineError> {
        self.registry
            .warehouse_by_code(code)?
            .ok_or_else(|| EngineError::NotFound(format!("warehouse code '{}'", code.trim())))
    }

    pub fn create_project(&self, new: NewProject) -> Result<Project, EngineError> {
        let project = self.registry.create_project(new)?;
        info!(project_id = %project.id, code = %project.code, "project created");
        Ok(project)
    }

    pub fn projects(&self) -> Result<Vec<Project>, EngineError> {
        Ok(self.registry.projects()?)
    }

    pub fn project_by_code(&self, code: &str) -> Result<Project, EngineError> {
        self.registry
            .project_by_code(code)?
            .ok_or_else(|| EngineError::NotFound(format!("project code '{}'", code.trim())))
    }

    // ---- tools ----

    pub fn assign_tool(&self, cmd: AssignTool) -> Result<ToolAssignment, EngineError> {
        self.ensure_material(cmd.material_id)?;
        self.ensure_project(cmd.project_id)?;
        let assignment = self.registry.assign_tool(cmd, Utc::now())?;
        info!(assignment_id = %assignment.id, assigned_to = %assignment.assigned_to, "tool assigned");
        Ok(assignment)
    }

    pub fn return_tool(&self, assignment_id: AssignmentId) -> Result<ToolAssignment, EngineError> {
        let assignment = self.registry.return_tool(assignment_id, Utc::now())?;
        info!(assignment_id = %assignment.id, "tool returned");
        Ok(assignment)
    }

    pub fn assigned_tools(&self) -> Result<Vec<ToolAssignment>, EngineError> {
        Ok(self.registry.assigned_tools()?)
    }

    pub fn register_maintenance(&self, cmd: RegisterMaintenance) -> Result<ToolMaintenance, EngineError> {
        self.ensure_material(cmd.material_id)?;
        Ok(self.registry.register_maintenance(cmd)?)
    }

    // ---- administration ----

    /// Remove every row of every entity. Not part of the normal lifecycle.
    pub fn reset_all(&self) -> Result<ResetReport, EngineError> {
        let report = ResetReport {
            movements: self.ledger.reset()?,
            locations: self.locations.reset()?,
            registry: self.registry.reset()?,
        };
        self.locks.clear()?;
        info!(
            movements = report.movements,
            locations = report.locations,
            materials = report.registry.materials,
            "all data reset"
        );
        Ok(report)
    }

    fn ensure_material(&self, id: MaterialId) -> Result<(), EngineError> {
        match self.registry.material(id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("material {id}"))),
        }
    }

    fn ensure_warehouse(&self, id: WarehouseId) -> Result<(), EngineError> {
        match self.registry.warehouse(id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("warehouse {id}"))),
        }
    }

    fn ensure_project(&self, id: ProjectId) -> Result<(), EngineError> {
        match self.registry.project(id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("project {id}"))),
        }
    }
}
