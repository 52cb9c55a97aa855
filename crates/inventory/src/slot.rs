use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kardex_core::{DomainError, DomainResult, MaterialId, ValueObject, WarehouseId};

/// Physical sub-division of a warehouse.
///
/// `position` is optional and its absence is part of the key: a slot without a
/// position is distinct from every slot that has one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub rack: String,
    pub level: String,
    pub r#box: String,
    pub position: Option<String>,
}

impl ValueObject for Slot {}

impl Slot {
    pub fn new(
        rack: impl Into<String>,
        level: impl Into<String>,
        r#box: impl Into<String>,
        position: Option<String>,
    ) -> DomainResult<Self> {
        SlotInput {
            rack: Some(rack.into()),
            level: Some(level.into()),
            r#box: Some(r#box.into()),
            position,
        }
        .resolve("slot")
    }
}

impl core::fmt::Display for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.rack, self.level, self.r#box)?;
        if let Some(position) = &self.position {
            write!(f, "/{position}")?;
        }
        Ok(())
    }
}

/// Slot coordinates as received from a caller (every field optional).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInput {
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub r#box: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl SlotInput {
    /// Resolve into a fully specified [`Slot`].
    ///
    /// `role` names the slot in error messages ("source slot", "destination slot").
    pub fn resolve(&self, role: &str) -> DomainResult<Slot> {
        let rack = required(role, "rack", &self.rack)?;
        let level = required(role, "level", &self.level)?;
        let r#box = required(role, "box", &self.r#box)?;
        let position = self
            .position
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Slot {
            rack,
            level,
            r#box,
            position,
        })
    }
}

impl From<Slot> for SlotInput {
    fn from(slot: Slot) -> Self {
        Self {
            rack: Some(slot.rack),
            level: Some(slot.level),
            r#box: Some(slot.r#box),
            position: slot.position,
        }
    }
}

fn required(role: &str, field: &str, value: &Option<String>) -> DomainResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::validation(format!("{role} requires {field}"))),
    }
}

/// Composite key of the slot projection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub slot: Slot,
}

impl LocationKey {
    pub fn new(material_id: MaterialId, warehouse_id: WarehouseId, slot: Slot) -> Self {
        Self {
            material_id,
            warehouse_id,
            slot,
        }
    }
}

/// Mutable per-slot quantity row. Quantity never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub slot: Slot,
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocationRecord {
    pub fn new(key: LocationKey, quantity: Decimal, at: DateTime<Utc>) -> Self {
        Self {
            material_id: key.material_id,
            warehouse_id: key.warehouse_id,
            slot: key.slot,
            quantity,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.material_id, self.warehouse_id, self.slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rack: &str, level: &str, b: &str, position: Option<&str>) -> SlotInput {
        SlotInput {
            rack: Some(rack.to_string()),
            level: Some(level.to_string()),
            r#box: Some(b.to_string()),
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn resolve_trims_coordinates() {
        let slot = input(" A ", "1", "3 ", Some(" 2")).resolve("source slot").unwrap();
        assert_eq!(slot.rack, "A");
        assert_eq!(slot.r#box, "3");
        assert_eq!(slot.position.as_deref(), Some("2"));
        assert_eq!(slot.to_string(), "A/1/3/2");
    }

    #[test]
    fn blank_position_is_absent() {
        let slot = input("A", "1", "3", Some("  ")).resolve("source slot").unwrap();
        assert_eq!(slot.position, None);
        assert_eq!(slot.to_string(), "A/1/3");
    }

    #[test]
    fn missing_box_is_a_validation_error() {
        let mut raw = input("A", "1", "", None);
        let err = raw.resolve("destination slot").unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("destination slot requires box")
        );

        raw.r#box = None;
        assert!(raw.resolve("destination slot").is_err());
    }

    #[test]
    fn positionless_slot_is_a_distinct_key() {
        let a = Slot::new("A", "1", "3", None).unwrap();
        let b = Slot::new("A", "1", "3", Some("1".to_string())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn box_field_serializes_without_raw_prefix() {
        let slot = Slot::new("A", "1", "3", None).unwrap();
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["box"], "3");
    }
}
