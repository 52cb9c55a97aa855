use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kardex_core::{DomainError, DomainResult, Entity, MaterialId, ProjectId, WarehouseId};

/// Maximum number of alternate names a material may carry.
pub const MAX_ALTERNATE_NAMES: usize = 3;

/// Material (consumable or tool) tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub code: String,
    pub name: String,
    pub min_stock: Decimal,
    pub category: Option<String>,
    pub alternate_names: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Command payload: create a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub min_stock: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
}

impl Material {
    /// Validate a creation payload and build the material.
    ///
    /// Code uniqueness is a store-level concern and is checked by the registry.
    pub fn create(id: MaterialId, new: NewMaterial, at: DateTime<Utc>) -> DomainResult<Self> {
        let code = normalize_code("material", &new.code)?;
        let name = non_empty("material name", &new.name)?;

        if new.min_stock.is_sign_negative() {
            return Err(DomainError::validation("min_stock cannot be negative"));
        }

        let alternate_names: Vec<String> = new
            .alternate_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if alternate_names.len() > MAX_ALTERNATE_NAMES {
            return Err(DomainError::validation(format!(
                "a material accepts at most {MAX_ALTERNATE_NAMES} alternate names"
            )));
        }

        let category = new
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            id,
            code,
            name,
            min_stock: new.min_stock,
            category,
            alternate_names,
            created_at: at,
        })
    }
}

impl Entity for Material {
    type Id = MaterialId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Warehouse: the unit warehouse-level balances are kept for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
}

impl Warehouse {
    pub fn create(id: WarehouseId, new: NewWarehouse) -> DomainResult<Self> {
        Ok(Self {
            id,
            code: normalize_code("warehouse", &new.code)?,
            name: non_empty("warehouse name", &new.name)?,
        })
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Project: optional attribution of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub code: String,
    pub name: String,
}

impl Project {
    pub fn create(id: ProjectId, new: NewProject) -> DomainResult<Self> {
        Ok(Self {
            id,
            code: normalize_code("project", &new.code)?,
            name: non_empty("project name", &new.name)?,
        })
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize_code(kind: &str, code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(DomainError::validation(format!("{kind} code cannot be empty")));
    }
    Ok(code.to_string())
}

fn non_empty(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}
