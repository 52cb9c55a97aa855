use chrono::NaiveDate;
use serde::Deserialize;

use kardex_core::{AssignmentId, MaterialId, ProjectId, WarehouseId};
use kardex_infra::{LedgerFilter, LocationUpsert, StockInRow, StockOutRow};
use kardex_inventory::{
    AssignTool, MovementRequest, NewMaterial, NewProject, NewWarehouse, RegisterMaintenance,
};

// -------------------------
// Request envelope
// -------------------------

/// One operation call: `{"op": "<name>", "args": {...}}`.
///
/// Operations without arguments omit `args`; query operations whose filters
/// are all optional take `"args": {}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Request {
    CreateMovement(MovementRequest),
    GetCurrentStock(CurrentStockQuery),
    GetStockSummary(MaterialQuery),
    GetStockByProject(ProjectQuery),
    GetMovementHistory(LedgerFilter),
    GetNegativeStock,
    GetLowStock,
    GetMostUsed(LimitQuery),
    UpsertLocation(LocationUpsert),
    GetLocations(LocationsQuery),
    CreateMaterial(NewMaterial),
    ListMaterials,
    CreateWarehouse(NewWarehouse),
    ListWarehouses,
    CreateProject(NewProject),
    ListProjects,
    AssignTool(AssignTool),
    ReturnTool(ReturnToolRequest),
    GetAssignedTools,
    RegisterMaintenance(RegisterMaintenance),
    GetMaintenanceAlerts(MaintenanceQuery),
    ImportStockIn(ImportRows<StockInRow>),
    ImportStockOut(ImportRows<StockOutRow>),
    ImportMaterials(ImportRows<NewMaterial>),
    ImportWarehouses(ImportRows<NewWarehouse>),
    ImportProjects(ImportRows<NewProject>),
    ResetAllData,
}

impl Request {
    /// Operation name, for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Request::CreateMovement(_) => "create_movement",
            Request::GetCurrentStock(_) => "get_current_stock",
            Request::GetStockSummary(_) => "get_stock_summary",
            Request::GetStockByProject(_) => "get_stock_by_project",
            Request::GetMovementHistory(_) => "get_movement_history",
            Request::GetNegativeStock => "get_negative_stock",
            Request::GetLowStock => "get_low_stock",
            Request::GetMostUsed(_) => "get_most_used",
            Request::UpsertLocation(_) => "upsert_location",
            Request::GetLocations(_) => "get_locations",
            Request::CreateMaterial(_) => "create_material",
            Request::ListMaterials => "list_materials",
            Request::CreateWarehouse(_) => "create_warehouse",
            Request::ListWarehouses => "list_warehouses",
            Request::CreateProject(_) => "create_project",
            Request::ListProjects => "list_projects",
            Request::AssignTool(_) => "assign_tool",
            Request::ReturnTool(_) => "return_tool",
            Request::GetAssignedTools => "get_assigned_tools",
            Request::RegisterMaintenance(_) => "register_maintenance",
            Request::GetMaintenanceAlerts(_) => "get_maintenance_alerts",
            Request::ImportStockIn(_) => "import_stock_in",
            Request::ImportStockOut(_) => "import_stock_out",
            Request::ImportMaterials(_) => "import_materials",
            Request::ImportWarehouses(_) => "import_warehouses",
            Request::ImportProjects(_) => "import_projects",
            Request::ResetAllData => "reset_all_data",
        }
    }
}

// -------------------------
// Query / command DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CurrentStockQuery {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaterialQuery {
    #[serde(default)]
    pub material_id: Option<MaterialId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationsQuery {
    #[serde(default)]
    pub material_id: Option<MaterialId>,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnToolRequest {
    pub assignment_id: AssignmentId,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceQuery {
    #[serde(default)]
    pub lookahead_days: Option<u32>,
    /// Reference date; defaults to the current UTC date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRows<R> {
    pub rows: Vec<R>,
}
