//! TRANSFER execution across the ledger and the slot projection.
//!
//! The two stores are written in a fixed order while the caller holds the
//! (material, warehouse) lock:
//!
//! 1. snapshot the source and destination rows
//! 2. one atomic `LocationStore::transfer` (checks the source slot, moves the
//!    quantity, creates the destination row when missing)
//! 3. `LedgerStore::append`
//!
//! When step 3 fails both rows are restored from the snapshot before
//! returning, so a failed transfer leaves no visible effect in either store.

use tracing::{error, info, warn};

use kardex_core::{DomainError, WarehouseId};
use kardex_inventory::{LocationKey, MovementRecord, MovementType, PlannedMovement, Slot};

use crate::error::{EngineError, StoreError};
use crate::ledger_store::LedgerStore;
use crate::location_store::LocationStore;

pub struct TransferCoordinator<'a, L, P> {
    ledger: &'a L,
    locations: &'a P,
}

impl<'a, L, P> TransferCoordinator<'a, L, P>
where
    L: LedgerStore,
    P: LocationStore,
{
    pub fn new(ledger: &'a L, locations: &'a P) -> Self {
        Self { ledger, locations }
    }

    pub fn execute(&self, planned: PlannedMovement) -> Result<MovementRecord, EngineError> {
        let (warehouse_id, source, destination) = transfer_keys(&planned)?;
        let quantity = planned.quantity;

        let source_before = self.locations.get(&source)?;
        let destination_before = self.locations.get(&destination)?;

        self.locations
            .transfer(&source, destination.clone(), quantity)
            .inspect_err(|e| {
                warn!(error = %e, slot = %source.slot, "transfer rejected at source slot")
            })?;

        match self.ledger.append(planned) {
            Ok(record) => {
                info!(
                    movement_id = %record.id,
                    material_id = %record.material_id,
                    warehouse_id = %warehouse_id,
                    from = %source.slot,
                    to = %destination.slot,
                    quantity = %quantity,
                    "transfer committed"
                );
                Ok(record)
            }
            Err(append_err) => {
                warn!(error = %append_err, "ledger append failed, reversing slot transfer");
                let reverted = self
                    .locations
                    .restore(&source, source_before)
                    .and_then(|()| self.locations.restore(&destination, destination_before));
                if let Err(undo_err) = reverted {
                    error!(
                        error = %undo_err,
                        from = %source.slot,
                        to = %destination.slot,
                        "slot transfer could not be reversed"
                    );
                    return Err(StoreError::Storage(format!(
                        "transfer aborted and slot reversal failed: {undo_err}"
                    ))
                    .into());
                }
                Err(append_err.into())
            }
        }
    }
}

fn transfer_keys(
    planned: &PlannedMovement,
) -> Result<(WarehouseId, LocationKey, LocationKey), EngineError> {
    let invalid = |msg: &str| EngineError::from(DomainError::validation(msg));

    if planned.movement_type != MovementType::Transfer {
        return Err(invalid("transfer coordinator only executes TRANSFER movements"));
    }
    let warehouse_id = match (planned.from_warehouse, planned.to_warehouse) {
        (Some(from), Some(to)) if from == to => from,
        _ => return Err(invalid("TRANSFER must stay within one warehouse")),
    };
    let slot = |s: &Option<Slot>, role: &str| {
        s.clone()
            .ok_or_else(|| invalid(&format!("TRANSFER requires a {role} slot")))
    };
    let source = LocationKey::new(
        planned.material_id,
        warehouse_id,
        slot(&planned.source_slot, "source")?,
    );
    let destination = LocationKey::new(
        planned.material_id,
        warehouse_id,
        slot(&planned.destination_slot, "destination")?,
    );
    Ok((warehouse_id, source, destination))
}
