//! In-memory reference data: catalog entities, tool assignments and
//! maintenance schedules.
//!
//! Catalog tables enforce code uniqueness per entity kind. Everything here is
//! owned by the engine; callers only see clones.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kardex_core::{
    AssignmentId, DomainError, Entity, MaintenanceId, MaterialId, ProjectId, WarehouseId,
};
use kardex_inventory::{
    AssignTool, Material, NewMaterial, NewProject, NewWarehouse, Project, RegisterMaintenance,
    ToolAssignment, ToolMaintenance, Warehouse,
};

use crate::error::StoreError;

/// A catalog row with a unique, human-facing code.
pub trait Coded: Entity + Clone {
    const KIND: &'static str;

    fn code(&self) -> &str;
}

impl Coded for Material {
    const KIND: &'static str = "material";

    fn code(&self) -> &str {
        &self.code
    }
}

impl Coded for Warehouse {
    const KIND: &'static str = "warehouse";

    fn code(&self) -> &str {
        &self.code
    }
}

impl Coded for Project {
    const KIND: &'static str = "project";

    fn code(&self) -> &str {
        &self.code
    }
}

/// Table of coded rows keyed by id, with a code index.
#[derive(Debug)]
struct CodedTable<T: Coded> {
    rows: RwLock<(BTreeMap<T::Id, T>, BTreeMap<String, T::Id>)>,
}

impl<T> Default for CodedTable<T>
where
    T: Coded,
{
    fn default() -> Self {
        Self {
            rows: RwLock::new((BTreeMap::new(), BTreeMap::new())),
        }
    }
}

impl<T> CodedTable<T>
where
    T: Coded,
    T::Id: Ord + Copy,
{
    fn insert(&self, row: T) -> Result<T, StoreError> {
        let mut guard = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned(T::KIND))?;
        let (by_id, by_code) = &mut *guard;

        if by_code.contains_key(row.code()) {
            return Err(DomainError::validation(format!(
                "{} code '{}' already exists",
                T::KIND,
                row.code()
            ))
            .into());
        }
        by_code.insert(row.code().to_string(), *row.id());
        by_id.insert(*row.id(), row.clone());
        Ok(row)
    }

    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned(T::KIND))?;
        Ok(guard.0.get(id).cloned())
    }

    fn by_code(&self, code: &str) -> Result<Option<T>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned(T::KIND))?;
        let (by_id, by_code) = &*guard;
        Ok(by_code.get(code.trim()).and_then(|id| by_id.get(id)).cloned())
    }

    /// All rows, ordered by code.
    fn list(&self) -> Result<Vec<T>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned(T::KIND))?;
        let (by_id, by_code) = &*guard;
        Ok(by_code.values().filter_map(|id| by_id.get(id)).cloned().collect())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut guard = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned(T::KIND))?;
        let removed = guard.0.len();
        guard.0.clear();
        guard.1.clear();
        Ok(removed)
    }
}

/// Rows removed by [`Registry::reset`], per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub materials: usize,
    pub warehouses: usize,
    pub projects: usize,
    pub tool_assignments: usize,
    pub maintenance_schedules: usize,
}

#[derive(Debug, Default)]
pub struct Registry {
    materials: CodedTable<Material>,
    warehouses: CodedTable<Warehouse>,
    projects: CodedTable<Project>,
    assignments: RwLock<BTreeMap<AssignmentId, ToolAssignment>>,
    maintenance: RwLock<BTreeMap<MaintenanceId, ToolMaintenance>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_material(&self, new: NewMaterial, at: DateTime<Utc>) -> Result<Material, StoreError> {
        self.materials.insert(Material::create(MaterialId::new(), new, at)?)
    }

    pub fn material(&self, id: MaterialId) -> Result<Option<Material>, StoreError> {
        self.materials.get(&id)
    }

    pub fn material_by_code(&self, code: &str) -> Result<Option<Material>, StoreError> {
        self.materials.by_code(code)
    }

    pub fn materials(&self) -> Result<Vec<Material>, StoreError> {
        self.materials.list()
    }

    pub fn create_warehouse(&self, new: NewWarehouse) -> Result<Warehouse, StoreError> {
        self.warehouses.insert(Warehouse::create(WarehouseId::new(), new)?)
    }

    pub fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, StoreError> {
        self.warehouses.get(&id)
    }

    pub fn warehouse_by_code(&self, code: &str) -> Result<Option<Warehouse>, StoreError> {
        self.warehouses.by_code(code)
    }

    pub fn warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        self.warehouses.list()
    }

    pub fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        self.projects.insert(Project::create(ProjectId::new(), new)?)
    }

    pub fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        self.projects.get(&id)
    }

    pub fn project_by_code(&self, code: &str) -> Result<Option<Project>, StoreError> {
        self.projects.by_code(code)
    }

    pub fn projects(&self) -> Result<Vec<Project>, StoreError> {
        self.projects.list()
    }

    pub fn assign_tool(&self, cmd: AssignTool, at: DateTime<Utc>) -> Result<ToolAssignment, StoreError> {
        let assignment = ToolAssignment::assign(AssignmentId::new(), cmd, at)?;
        let mut rows = self
            .assignments
            .write()
            .map_err(|_| StoreError::LockPoisoned("tool assignments"))?;
        rows.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    /// `IN_USE -> RETURNED` for the given assignment.
    pub fn return_tool(&self, id: AssignmentId, at: DateTime<Utc>) -> Result<ToolAssignment, StoreError> {
        let mut rows = self
            .assignments
            .write()
            .map_err(|_| StoreError::LockPoisoned("tool assignments"))?;
        let assignment = rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("tool assignment {id}")))?;
        assignment.mark_returned(at)?;
        Ok(assignment.clone())
    }

    /// Assignments still `IN_USE`, oldest first.
    pub fn assigned_tools(&self) -> Result<Vec<ToolAssignment>, StoreError> {
        let rows = self
            .assignments
            .read()
            .map_err(|_| StoreError::LockPoisoned("tool assignments"))?;
        let mut in_use: Vec<ToolAssignment> =
            rows.values().filter(|a| a.is_in_use()).cloned().collect();
        in_use.sort_by_key(|a| a.assigned_at);
        Ok(in_use)
    }

    pub fn register_maintenance(&self, cmd: RegisterMaintenance) -> Result<ToolMaintenance, StoreError> {
        let schedule = ToolMaintenance::register(MaintenanceId::new(), cmd)?;
        let mut rows = self
            .maintenance
            .write()
            .map_err(|_| StoreError::LockPoisoned("maintenance"))?;
        rows.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    pub fn maintenance_schedules(&self) -> Result<Vec<ToolMaintenance>, StoreError> {
        let rows = self
            .maintenance
            .read()
            .map_err(|_| StoreError::LockPoisoned("maintenance"))?;
        Ok(rows.values().cloned().collect())
    }

    pub fn reset(&self) -> Result<RegistryCounts, StoreError> {
        let tool_assignments = {
            let mut rows = self
                .assignments
                .write()
                .map_err(|_| StoreError::LockPoisoned("tool assignments"))?;
            let n = rows.len();
            rows.clear();
            n
        };
        let maintenance_schedules = {
            let mut rows = self
                .maintenance
                .write()
                .map_err(|_| StoreError::LockPoisoned("maintenance"))?;
            let n = rows.len();
            rows.clear();
            n
        };

        Ok(RegistryCounts {
            materials: self.materials.clear()?,
            warehouses: self.warehouses.clear()?,
            projects: self.projects.clear()?,
            tool_assignments,
            maintenance_schedules,
        })
    }
}
