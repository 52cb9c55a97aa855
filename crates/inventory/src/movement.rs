use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kardex_core::{DomainError, DomainResult, MaterialId, MovementId, ProjectId, ValueObject, WarehouseId};

use crate::slot::{Slot, SlotInput};

/// Kind of ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Return,
    Adjust,
    Transfer,
}

impl MovementType {
    pub const ALL: [MovementType; 5] = [
        MovementType::In,
        MovementType::Out,
        MovementType::Return,
        MovementType::Adjust,
        MovementType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Return => "RETURN",
            MovementType::Adjust => "ADJUST",
            MovementType::Transfer => "TRANSFER",
        }
    }

    /// Whether the request must name the slot stock is taken from.
    pub fn requires_source_slot(&self) -> bool {
        matches!(
            self,
            MovementType::Out | MovementType::Adjust | MovementType::Transfer
        )
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MovementType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "invalid movement type '{wanted}' (expected IN, OUT, RETURN, ADJUST or TRANSFER)"
                ))
            })
    }
}

/// Strictly positive decimal quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl ValueObject for Quantity {}

impl Quantity {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity must be greater than zero (got {value})"
            )));
        }
        Ok(Self(value.normalize()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Incoming movement request, as handed over by the transport layer.
///
/// For `ADJUST`, `quantity` is the target balance, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub movement_type: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub source_slot: Option<SlotInput>,
    #[serde(default)]
    pub destination_slot: Option<SlotInput>,
}

impl MovementRequest {
    /// Minimal request; optional fields are left empty.
    pub fn new(
        material_id: MaterialId,
        warehouse_id: WarehouseId,
        movement_type: MovementType,
        quantity: Decimal,
    ) -> Self {
        Self {
            material_id,
            warehouse_id,
            project_id: None,
            movement_type: movement_type.as_str().to_string(),
            quantity,
            reference: None,
            notes: None,
            created_by: None,
            source_slot: None,
            destination_slot: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn from_slot(mut self, slot: Slot) -> Self {
        self.source_slot = Some(slot.into());
        self
    }

    pub fn to_slot(mut self, slot: Slot) -> Self {
        self.destination_slot = Some(slot.into());
        self
    }
}

/// Fully resolved ledger entry, ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMovement {
    pub material_id: MaterialId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub from_warehouse: Option<WarehouseId>,
    pub to_warehouse: Option<WarehouseId>,
    pub project_id: Option<ProjectId>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub source_slot: Option<Slot>,
    pub destination_slot: Option<Slot>,
}

/// Immutable ledger record.
///
/// `sequence` and `created_at` are assigned by the ledger store at append time
/// and both increase with insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub sequence: u64,
    pub material_id: MaterialId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub from_warehouse: Option<WarehouseId>,
    pub to_warehouse: Option<WarehouseId>,
    pub project_id: Option<ProjectId>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub source_slot: Option<Slot>,
    pub destination_slot: Option<Slot>,
    pub created_at: DateTime<Utc>,
}

impl MovementRecord {
    pub fn from_planned(
        planned: PlannedMovement,
        id: MovementId,
        sequence: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sequence,
            material_id: planned.material_id,
            movement_type: planned.movement_type,
            quantity: planned.quantity,
            from_warehouse: planned.from_warehouse,
            to_warehouse: planned.to_warehouse,
            project_id: planned.project_id,
            reference: planned.reference,
            notes: planned.notes,
            created_by: planned.created_by,
            source_slot: planned.source_slot,
            destination_slot: planned.destination_slot,
            created_at,
        }
    }

    /// Signed per-warehouse effects of this record on stock balances.
    ///
    /// A transfer yields a debit and a credit on the same warehouse.
    pub fn warehouse_deltas(&self) -> Vec<(WarehouseId, Decimal)> {
        let q = self.quantity.value();
        match self.movement_type {
            MovementType::In | MovementType::Return => {
                self.to_warehouse.map(|w| (w, q)).into_iter().collect()
            }
            MovementType::Out => self.from_warehouse.map(|w| (w, -q)).into_iter().collect(),
            MovementType::Adjust => match (self.to_warehouse, self.from_warehouse) {
                (Some(to), _) => vec![(to, q)],
                (None, Some(from)) => vec![(from, -q)],
                (None, None) => vec![],
            },
            MovementType::Transfer => self
                .from_warehouse
                .map(|w| (w, -q))
                .into_iter()
                .chain(self.to_warehouse.map(|w| (w, q)))
                .collect(),
        }
    }

    /// Whether this record touches `warehouse` on either side.
    pub fn involves_warehouse(&self, warehouse: WarehouseId) -> bool {
        self.from_warehouse == Some(warehouse) || self.to_warehouse == Some(warehouse)
    }

    /// Human-readable one-line summary used by the movement history.
    pub fn describe(&self, material_name: &str, warehouse_name: &str) -> String {
        let q = self.quantity;
        match self.movement_type {
            MovementType::In => format!("Inbound of {q} {material_name} into {warehouse_name}"),
            MovementType::Out => format!("Outbound of {q} {material_name} from {warehouse_name}"),
            MovementType::Return => format!("Return of {q} {material_name} into {warehouse_name}"),
            MovementType::Adjust => {
                let sign = if self.to_warehouse.is_some() { '+' } else { '-' };
                format!("Adjustment of {sign}{q} {material_name} in {warehouse_name}")
            }
            MovementType::Transfer => match (&self.source_slot, &self.destination_slot) {
                (Some(src), Some(dst)) => format!(
                    "Transfer of {q} {material_name} within {warehouse_name} ({src} -> {dst})"
                ),
                _ => format!("Transfer of {q} {material_name} within {warehouse_name}"),
            },
        }
    }
}
