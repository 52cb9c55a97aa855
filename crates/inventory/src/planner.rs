//! Movement planning: validation, classification and ADJUST delta computation.
//!
//! Planning is split in two pure steps so the caller can read exactly the
//! state a movement depends on in between:
//!
//! ```text
//! MovementRequest --validate--> ValidatedMovement --plan(StockSnapshot)--> PlannedMovement
//! ```
//!
//! The planner never writes. Persisting the planned movement is the caller's job.

use rust_decimal::Decimal;

use kardex_core::{DomainError, DomainResult, MaterialId, ProjectId, WarehouseId};

use crate::movement::{MovementRequest, MovementType, PlannedMovement, Quantity};
use crate::slot::Slot;

/// Validates and classifies movement requests.
#[derive(Debug, Clone)]
pub struct MovementPlanner {
    system_actor: String,
}

impl MovementPlanner {
    /// `system_actor` is recorded when a request names no actor.
    pub fn new(system_actor: impl Into<String>) -> Self {
        Self {
            system_actor: system_actor.into(),
        }
    }

    pub fn system_actor(&self) -> &str {
        &self.system_actor
    }

    /// Shape checks that need no stored state.
    pub fn validate(&self, request: &MovementRequest) -> DomainResult<ValidatedMovement> {
        let movement_type: MovementType = request.movement_type.parse()?;

        if movement_type == MovementType::Adjust {
            if request.quantity.is_sign_negative() {
                return Err(DomainError::validation(format!(
                    "adjustment target cannot be negative (got {})",
                    request.quantity
                )));
            }
        } else if request.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity must be greater than zero (got {})",
                request.quantity
            )));
        }

        let notes = trimmed(&request.notes);
        if movement_type == MovementType::Adjust && notes.is_none() {
            return Err(DomainError::validation("an adjustment requires a note"));
        }

        let source_slot = match (&request.source_slot, movement_type.requires_source_slot()) {
            (Some(input), true) => Some(input.resolve("source slot")?),
            (None, true) => {
                return Err(DomainError::validation(format!(
                    "{movement_type} requires a source slot"
                )));
            }
            (_, false) => None,
        };

        let destination_slot = match (&request.destination_slot, movement_type) {
            (Some(input), _) => Some(input.resolve("destination slot")?),
            (None, MovementType::Transfer) => {
                return Err(DomainError::validation("TRANSFER requires a destination slot"));
            }
            (None, _) => None,
        };

        if movement_type == MovementType::Transfer && source_slot == destination_slot {
            return Err(DomainError::validation(
                "source and destination slot must differ",
            ));
        }

        let created_by = trimmed(&request.created_by).unwrap_or_else(|| self.system_actor.clone());

        Ok(ValidatedMovement {
            material_id: request.material_id,
            warehouse_id: request.warehouse_id,
            project_id: request.project_id,
            movement_type,
            amount: request.quantity.normalize(),
            reference: trimmed(&request.reference),
            notes,
            created_by,
            source_slot,
            destination_slot,
        })
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// State a movement is planned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockSnapshot {
    /// Warehouse-level balance of the material, across all projects.
    pub warehouse_balance: Decimal,
    /// Quantity at the source slot, `None` when the slot row does not exist.
    pub source_slot_quantity: Option<Decimal>,
}

/// A request that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMovement {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
    pub project_id: Option<ProjectId>,
    pub movement_type: MovementType,
    /// Quantity to move, or the target balance for `ADJUST`.
    pub amount: Decimal,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub source_slot: Option<Slot>,
    pub destination_slot: Option<Slot>,
}

impl ValidatedMovement {
    /// Whether planning reads the warehouse balance. Inbound types read it to
    /// keep the folded balance representable.
    pub fn needs_warehouse_balance(&self) -> bool {
        self.movement_type != MovementType::Transfer
    }

    /// Whether planning reads the source slot quantity.
    pub fn needs_slot_quantity(&self) -> bool {
        self.movement_type == MovementType::Transfer
    }

    /// Classify against current stock and resolve the ledger shape.
    pub fn plan(self, snapshot: &StockSnapshot) -> DomainResult<PlannedMovement> {
        let w = self.warehouse_id;

        let (quantity, from_warehouse, to_warehouse) = match self.movement_type {
            MovementType::In | MovementType::Return => {
                let quantity = Quantity::new(self.amount)?;
                snapshot
                    .warehouse_balance
                    .checked_add(quantity.value())
                    .ok_or_else(DomainError::out_of_range)?;
                let from = (self.movement_type == MovementType::Return).then_some(w);
                (quantity, from, Some(w))
            }
            MovementType::Out => {
                let quantity = Quantity::new(self.amount)?;
                if snapshot.warehouse_balance < quantity.value() {
                    return Err(DomainError::insufficient(
                        quantity.value(),
                        snapshot.warehouse_balance,
                    ));
                }
                (quantity, Some(w), None)
            }
            MovementType::Adjust => {
                let diff = self
                    .amount
                    .checked_sub(snapshot.warehouse_balance)
                    .ok_or_else(DomainError::out_of_range)?;
                if diff.is_zero() {
                    return Err(DomainError::no_difference(self.amount));
                }
                let quantity = Quantity::new(diff.abs())?;
                if diff.is_sign_positive() {
                    (quantity, None, Some(w))
                } else {
                    (quantity, Some(w), None)
                }
            }
            MovementType::Transfer => {
                let quantity = Quantity::new(self.amount)?;
                let available = snapshot.source_slot_quantity.ok_or_else(|| {
                    DomainError::not_found(format!(
                        "source slot {} for material {}",
                        self.source_slot
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                        self.material_id
                    ))
                })?;
                if available < quantity.value() {
                    return Err(DomainError::insufficient(quantity.value(), available));
                }
                (quantity, Some(w), Some(w))
            }
        };

        Ok(PlannedMovement {
            material_id: self.material_id,
            movement_type: self.movement_type,
            quantity,
            from_warehouse,
            to_warehouse,
            project_id: self.project_id,
            reference: self.reference,
            notes: self.notes,
            created_by: self.created_by,
            source_slot: self.source_slot,
            destination_slot: self.destination_slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotInput;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn planner() -> MovementPlanner {
        MovementPlanner::new("system")
    }

    fn slot(rack: &str) -> Slot {
        Slot::new(rack, "1", "1", None).unwrap()
    }

    fn request(movement_type: MovementType, quantity: Decimal) -> MovementRequest {
        MovementRequest::new(MaterialId::new(), WarehouseId::new(), movement_type, quantity)
    }

    fn balance(b: Decimal) -> StockSnapshot {
        StockSnapshot {
            warehouse_balance: b,
            source_slot_quantity: None,
        }
    }

    #[test]
    fn in_is_shaped_into_the_warehouse() {
        let req = request(MovementType::In, dec!(10));
        let w = req.warehouse_id;
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(0))).unwrap();
        assert_eq!(planned.from_warehouse, None);
        assert_eq!(planned.to_warehouse, Some(w));
        assert_eq!(planned.created_by, "system");
    }

    #[test]
    fn return_is_shaped_on_both_sides() {
        let req = request(MovementType::Return, dec!(1));
        let w = req.warehouse_id;
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(0))).unwrap();
        assert_eq!((planned.from_warehouse, planned.to_warehouse), (Some(w), Some(w)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let err = planner().validate(&request(MovementType::In, dec!(0))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn out_requires_a_source_slot() {
        let err = planner().validate(&request(MovementType::Out, dec!(1))).unwrap_err();
        assert_eq!(err, DomainError::validation("OUT requires a source slot"));
    }

    #[test]
    fn out_requires_complete_source_slot() {
        let mut req = request(MovementType::Out, dec!(1));
        req.source_slot = Some(SlotInput {
            rack: Some("A".into()),
            level: None,
            r#box: Some("1".into()),
            position: Some("2".into()),
        });
        let err = planner().validate(&req).unwrap_err();
        assert_eq!(err, DomainError::validation("source slot requires level"));
    }

    #[test]
    fn out_beyond_balance_is_insufficient() {
        let req = request(MovementType::Out, dec!(7)).from_slot(slot("A"));
        let err = planner().validate(&req).unwrap().plan(&balance(dec!(6))).unwrap_err();
        assert_eq!(err, DomainError::insufficient(dec!(7), dec!(6)));
    }

    #[test]
    fn out_of_exact_balance_is_allowed() {
        let req = request(MovementType::Out, dec!(6)).from_slot(slot("A"));
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(6))).unwrap();
        assert_eq!(planned.to_warehouse, None);
        assert_eq!(planned.source_slot, Some(slot("A")));
    }

    #[test]
    fn adjust_requires_a_note() {
        let req = request(MovementType::Adjust, dec!(20)).from_slot(slot("A"));
        let err = planner().validate(&req).unwrap_err();
        assert_eq!(err, DomainError::validation("an adjustment requires a note"));

        let blank = req.with_notes("   ");
        assert!(planner().validate(&blank).is_err());
    }

    #[test]
    fn adjust_up_is_in_shaped() {
        let req = request(MovementType::Adjust, dec!(20))
            .from_slot(slot("A"))
            .with_notes("cycle count");
        let w = req.warehouse_id;
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(6))).unwrap();
        assert_eq!(planned.movement_type, MovementType::Adjust);
        assert_eq!(planned.quantity.value(), dec!(14));
        assert_eq!((planned.from_warehouse, planned.to_warehouse), (None, Some(w)));
    }

    #[test]
    fn adjust_down_is_out_shaped() {
        let req = request(MovementType::Adjust, dec!(0))
            .from_slot(slot("A"))
            .with_notes("written off");
        let w = req.warehouse_id;
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(6))).unwrap();
        assert_eq!(planned.quantity.value(), dec!(6));
        assert_eq!((planned.from_warehouse, planned.to_warehouse), (Some(w), None));
    }

    #[test]
    fn adjust_to_current_balance_has_no_difference() {
        let req = request(MovementType::Adjust, dec!(6.0))
            .from_slot(slot("A"))
            .with_notes("recount");
        let err = planner().validate(&req).unwrap().plan(&balance(dec!(6))).unwrap_err();
        assert!(matches!(err, DomainError::NoDifference { .. }));
    }

    #[test]
    fn negative_adjust_target_is_rejected() {
        let req = request(MovementType::Adjust, dec!(-1))
            .from_slot(slot("A"))
            .with_notes("oops");
        assert!(planner().validate(&req).is_err());
    }

    #[test]
    fn transfer_requires_destination_slot() {
        let req = request(MovementType::Transfer, dec!(1)).from_slot(slot("A"));
        let err = planner().validate(&req).unwrap_err();
        assert_eq!(err, DomainError::validation("TRANSFER requires a destination slot"));
    }

    #[test]
    fn transfer_to_the_same_slot_is_rejected() {
        let req = request(MovementType::Transfer, dec!(1))
            .from_slot(slot("A"))
            .to_slot(slot("A"));
        assert!(planner().validate(&req).is_err());
    }

    #[test]
    fn transfer_checks_slot_level_stock_not_warehouse_stock() {
        let req = request(MovementType::Transfer, dec!(5))
            .from_slot(slot("A"))
            .to_slot(slot("B"));
        let validated = planner().validate(&req).unwrap();
        assert!(validated.needs_slot_quantity());

        let snapshot = StockSnapshot {
            warehouse_balance: dec!(100),
            source_slot_quantity: Some(dec!(4)),
        };
        let err = validated.clone().plan(&snapshot).unwrap_err();
        assert_eq!(err, DomainError::insufficient(dec!(5), dec!(4)));

        let missing = StockSnapshot {
            warehouse_balance: dec!(100),
            source_slot_quantity: None,
        };
        assert!(matches!(validated.plan(&missing), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn inbound_past_the_decimal_range_is_rejected() {
        let huge = dec!(50000000000000000000000000000);
        for movement_type in [MovementType::In, MovementType::Return] {
            let validated = planner().validate(&request(movement_type, huge)).unwrap();
            assert!(validated.needs_warehouse_balance());
            let err = validated.plan(&balance(huge)).unwrap_err();
            assert_eq!(err, DomainError::out_of_range());
        }

        let fits = planner().validate(&request(MovementType::In, huge)).unwrap();
        assert!(fits.plan(&balance(dec!(1))).is_ok());
    }

    #[test]
    fn adjust_up_to_the_largest_decimal_is_planned() {
        let req = request(MovementType::Adjust, Decimal::MAX)
            .from_slot(slot("A"))
            .with_notes("count");
        let planned = planner().validate(&req).unwrap().plan(&balance(dec!(1))).unwrap();
        assert_eq!(planned.quantity.value(), Decimal::MAX - dec!(1));
    }

    #[test]
    fn transfer_keeps_the_warehouse_on_both_sides() {
        let req = request(MovementType::Transfer, dec!(5))
            .from_slot(slot("A"))
            .to_slot(slot("B"));
        let w = req.warehouse_id;
        let snapshot = StockSnapshot {
            warehouse_balance: dec!(0),
            source_slot_quantity: Some(dec!(5)),
        };
        let planned = planner().validate(&req).unwrap().plan(&snapshot).unwrap();
        assert_eq!((planned.from_warehouse, planned.to_warehouse), (Some(w), Some(w)));
        assert_eq!(planned.destination_slot, Some(slot("B")));
    }

    #[test]
    fn explicit_actor_wins_over_system_actor() {
        let req = request(MovementType::In, dec!(1)).with_actor(" maria ");
        let validated = planner().validate(&req).unwrap();
        assert_eq!(validated.created_by, "maria");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: applying the planned adjustment to the balance it was
        /// planned against always lands exactly on the target.
        #[test]
        fn adjust_converges_on_target(
            current in -100_000i64..100_000i64,
            target in 0i64..100_000i64,
            scale in 0u32..3,
        ) {
            let current = Decimal::new(current, scale);
            let target = Decimal::new(target, scale);
            let req = request(MovementType::Adjust, target)
                .from_slot(slot("A"))
                .with_notes("count");

            match planner().validate(&req).unwrap().plan(&balance(current)) {
                Ok(planned) => {
                    let signed = if planned.to_warehouse.is_some() {
                        planned.quantity.value()
                    } else {
                        -planned.quantity.value()
                    };
                    prop_assert_eq!(current + signed, target);
                }
                Err(DomainError::NoDifference { .. }) => prop_assert_eq!(current, target),
                Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
            }
        }
    }
}
