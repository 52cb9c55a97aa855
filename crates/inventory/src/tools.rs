use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kardex_core::{AssignmentId, DomainError, DomainResult, Entity, MaintenanceId, MaterialId, ProjectId};

/// Tool assignment lifecycle. `IN_USE` is initial, `RETURNED` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    InUse,
    Returned,
}

/// A tool handed out to someone working on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAssignment {
    pub id: AssignmentId,
    pub material_id: MaterialId,
    pub project_id: ProjectId,
    pub assigned_to: String,
    pub assigned_at: DateTime<Utc>,
    pub expected_return_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
}

/// Command payload: assign a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTool {
    pub material_id: MaterialId,
    pub project_id: ProjectId,
    pub assigned_to: String,
    #[serde(default)]
    pub expected_return_at: Option<DateTime<Utc>>,
}

impl ToolAssignment {
    pub fn assign(id: AssignmentId, cmd: AssignTool, at: DateTime<Utc>) -> DomainResult<Self> {
        let assigned_to = cmd.assigned_to.trim();
        if assigned_to.is_empty() {
            return Err(DomainError::validation("assigned_to cannot be empty"));
        }
        if cmd.expected_return_at.is_some_and(|r| r < at) {
            return Err(DomainError::validation(
                "expected return cannot precede the assignment",
            ));
        }

        Ok(Self {
            id,
            material_id: cmd.material_id,
            project_id: cmd.project_id,
            assigned_to: assigned_to.to_string(),
            assigned_at: at,
            expected_return_at: cmd.expected_return_at,
            returned_at: None,
            status: AssignmentStatus::InUse,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.status == AssignmentStatus::InUse
    }

    /// `IN_USE -> RETURNED`. Any other source state is reported as not found,
    /// since no in-use assignment with this id exists.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_in_use() {
            return Err(DomainError::not_found(format!(
                "in-use tool assignment {}",
                self.id
            )));
        }
        self.status = AssignmentStatus::Returned;
        self.returned_at = Some(at);
        Ok(())
    }
}

impl Entity for ToolAssignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Scheduled maintenance of a tool. Alert data only, no lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMaintenance {
    pub id: MaintenanceId,
    pub material_id: MaterialId,
    pub maintenance_type: String,
    pub last_maintenance: Option<NaiveDate>,
    pub next_due: NaiveDate,
    pub notes: Option<String>,
}

/// Command payload: register a maintenance schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMaintenance {
    pub material_id: MaterialId,
    pub maintenance_type: String,
    #[serde(default)]
    pub last_maintenance: Option<NaiveDate>,
    pub next_due: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ToolMaintenance {
    pub fn register(id: MaintenanceId, cmd: RegisterMaintenance) -> DomainResult<Self> {
        let maintenance_type = cmd.maintenance_type.trim();
        if maintenance_type.is_empty() {
            return Err(DomainError::validation("maintenance_type cannot be empty"));
        }
        if cmd.last_maintenance.is_some_and(|last| last > cmd.next_due) {
            return Err(DomainError::validation(
                "next_due cannot precede last_maintenance",
            ));
        }

        Ok(Self {
            id,
            material_id: cmd.material_id,
            maintenance_type: maintenance_type.to_string(),
            last_maintenance: cmd.last_maintenance,
            next_due: cmd.next_due,
            notes: cmd.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

impl Entity for ToolMaintenance {
    type Id = MaintenanceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
