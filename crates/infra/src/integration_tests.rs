//! Integration tests for the full movement pipeline.
//!
//! Tests: Request → Planner → LedgerStore / LocationStore → Aggregator
//!
//! Verifies:
//! - Balances follow the ledger exactly (IN, OUT, ADJUST, TRANSFER)
//! - Concurrent movements never drive a balance or a slot negative
//! - A TRANSFER whose ledger append fails leaves no slot effect behind

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::thread;
    use std::time::Duration;

    use chrono::{Days, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use kardex_core::{MaterialId, WarehouseId};
    use kardex_inventory::{
        AssignTool, MovementRecord, MovementRequest, MovementType, NewMaterial, NewProject,
        NewWarehouse, PlannedMovement, RegisterMaintenance, Slot, SlotInput,
    };

    use crate::config::EngineConfig;
    use crate::engine::{LocationUpsert, StockEngine};
    use crate::error::{EngineError, StoreError};
    use crate::import::StockInRow;
    use crate::ledger_store::{InMemoryLedgerStore, LedgerFilter, LedgerStore};
    use crate::location_store::{InMemoryLocationStore, LocationStore};

    fn test_material() -> NewMaterial {
        NewMaterial {
            code: "M1".to_string(),
            name: "Cement".to_string(),
            min_stock: dec!(5),
            category: Some("consumable".to_string()),
            alternate_names: vec!["Portland".to_string()],
        }
    }

    fn test_warehouse() -> NewWarehouse {
        NewWarehouse {
            code: "W1".to_string(),
            name: "Main".to_string(),
        }
    }

    fn slot(rack: &str) -> Slot {
        Slot::new(rack, "1", "3", None).unwrap()
    }

    fn setup<L, P>(engine: &StockEngine<L, P>) -> (MaterialId, WarehouseId)
    where
        L: LedgerStore,
        P: LocationStore,
    {
        let m = engine.create_material(test_material()).unwrap();
        let w = engine.create_warehouse(test_warehouse()).unwrap();
        (m.id, w.id)
    }

    fn place<L, P>(
        engine: &StockEngine<L, P>,
        m: MaterialId,
        w: WarehouseId,
        rack: &str,
        q: Decimal,
    ) where
        L: LedgerStore,
        P: LocationStore,
    {
        engine
            .upsert_location(LocationUpsert {
                material_id: m,
                warehouse_id: w,
                slot: SlotInput::from(slot(rack)),
                quantity: q,
            })
            .unwrap();
    }

    fn slot_quantity<L, P>(
        engine: &StockEngine<L, P>,
        m: MaterialId,
        w: WarehouseId,
        rack: &str,
    ) -> Option<Decimal>
    where
        L: LedgerStore,
        P: LocationStore,
    {
        engine
            .locations(Some(m), Some(w))
            .unwrap()
            .into_iter()
            .find(|row| row.slot == slot(rack))
            .map(|row| row.quantity)
    }

    #[test]
    fn in_out_adjust_transfer_scenario() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        place(&engine, m, w, "A", dec!(8));

        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(10)))
            .unwrap();
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(10));

        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Out, dec!(4)).from_slot(slot("A")),
            )
            .unwrap();
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(6));

        let adjust = MovementRequest::new(m, w, MovementType::Adjust, dec!(20))
            .from_slot(slot("A"))
            .with_notes("cycle count");
        let record = engine.create_movement(adjust.clone()).unwrap();
        assert_eq!(record.movement_type, MovementType::Adjust);
        assert_eq!(record.quantity.value(), dec!(14));
        assert_eq!((record.from_warehouse, record.to_warehouse), (None, Some(w)));
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(20));

        let err = engine.create_movement(adjust).unwrap_err();
        assert_eq!(err, EngineError::NoDifference { target: dec!(20) });

        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Transfer, dec!(5))
                    .from_slot(slot("A"))
                    .to_slot(slot("B")),
            )
            .unwrap();
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(20));
        assert_eq!(slot_quantity(&engine, m, w, "A"), Some(dec!(3)));
        assert_eq!(slot_quantity(&engine, m, w, "B"), Some(dec!(5)));

        let history = engine.movement_history(&LedgerFilter::for_material(m)).unwrap();
        let sequences: Vec<u64> = history.iter().map(|e| e.record.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
        assert_eq!(
            history[3].description,
            "Transfer of 5 Cement within Main (A/1/3 -> B/1/3)"
        );
    }

    #[test]
    fn out_beyond_balance_leaves_balance_unchanged() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(3)))
            .unwrap();

        let err = engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Out, dec!(3.5)).from_slot(slot("A")),
            )
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::InsufficientStock {
                requested: dec!(3.5),
                available: dec!(3)
            }
        );
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(3));
        assert_eq!(engine.movement_history(&LedgerFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn transfer_from_missing_slot_is_not_found() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);

        let err = engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Transfer, dec!(1))
                    .from_slot(slot("A"))
                    .to_slot(slot("B")),
            )
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn stock_in_import_isolates_bad_rows() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);

        let row = |code: &str| StockInRow {
            material_code: code.to_string(),
            warehouse_code: "W1".to_string(),
            project_code: None,
            quantity: dec!(2),
            reference: Some("GR-1".to_string()),
            notes: None,
            created_by: Some("importer".to_string()),
        };
        let rows = vec![row("M1"), row("M1"), row("NOPE"), row("M1"), row("M1")];

        let report = engine.import_stock_in(rows);

        assert_eq!((report.inserted, report.failed, report.total), (4, 1, 5));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 4);
        assert_eq!(
            report.errors[0].identity.get("material_code").map(String::as_str),
            Some("NOPE")
        );
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(8));
    }

    #[test]
    fn concurrent_outs_never_overdraw() {
        let engine = Arc::new(StockEngine::in_memory(EngineConfig::default()));
        let (m, w) = setup(&*engine);
        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(100)))
            .unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    engine.create_movement(
                        MovementRequest::new(m, w, MovementType::Out, dec!(15)).from_slot(slot("A")),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let committed = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::InsufficientStock { .. })))
            .count();

        assert_eq!(committed, 6);
        assert_eq!(rejected, 4);
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(10));
        assert!(engine.negative_stock().unwrap().is_empty());
    }

    #[test]
    fn concurrent_transfers_conserve_slot_totals() {
        let engine = Arc::new(StockEngine::in_memory(EngineConfig::default()));
        let (m, w) = setup(&*engine);
        place(&*engine, m, w, "A", dec!(10));
        place(&*engine, m, w, "B", dec!(10));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let (from, to) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _ = engine.create_movement(
                            MovementRequest::new(m, w, MovementType::Transfer, dec!(3))
                                .from_slot(slot(from))
                                .to_slot(slot(to)),
                        );
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let a = slot_quantity(&*engine, m, w, "A").unwrap();
        let b = slot_quantity(&*engine, m, w, "B").unwrap();
        assert!(a >= Decimal::ZERO && b >= Decimal::ZERO);
        assert_eq!(a + b, dec!(20));
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(0));
    }

    /// Ledger that fails appends on demand.
    #[derive(Default)]
    struct FailingLedger {
        inner: InMemoryLedgerStore,
        fail_appends: AtomicBool,
    }

    impl LedgerStore for FailingLedger {
        fn append(&self, movement: PlannedMovement) -> Result<MovementRecord, StoreError> {
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            self.inner.append(movement)
        }

        fn query(&self, filter: &LedgerFilter) -> Result<Vec<MovementRecord>, StoreError> {
            self.inner.query(filter)
        }

        fn reset(&self) -> Result<usize, StoreError> {
            self.inner.reset()
        }
    }

    #[test]
    fn transfer_with_failing_ledger_leaves_slots_untouched() {
        let ledger = Arc::new(FailingLedger::default());
        let engine = StockEngine::new(
            Arc::clone(&ledger),
            InMemoryLocationStore::new(),
            EngineConfig::default(),
        );
        let (m, w) = setup(&engine);
        place(&engine, m, w, "A", dec!(8));
        let before = engine.locations(Some(m), Some(w)).unwrap();

        ledger.fail_appends.store(true, Ordering::SeqCst);
        let err = engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Transfer, dec!(5))
                    .from_slot(slot("A"))
                    .to_slot(slot("B")),
            )
            .unwrap_err();

        assert_eq!(err, EngineError::Storage("disk full".to_string()));
        assert_eq!(engine.locations(Some(m), Some(w)).unwrap(), before);
        assert!(ledger.query(&LedgerFilter::default()).unwrap().is_empty());

        ledger.fail_appends.store(false, Ordering::SeqCst);
        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Transfer, dec!(5))
                    .from_slot(slot("A"))
                    .to_slot(slot("B")),
            )
            .unwrap();
        assert_eq!(slot_quantity(&engine, m, w, "A"), Some(dec!(3)));
        assert_eq!(slot_quantity(&engine, m, w, "B"), Some(dec!(5)));
    }

    /// Ledger whose appends report in and then wait to be released.
    struct GatedLedger {
        inner: InMemoryLedgerStore,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl LedgerStore for GatedLedger {
        fn append(&self, movement: PlannedMovement) -> Result<MovementRecord, StoreError> {
            let entered = self
                .entered
                .lock()
                .map_err(|_| StoreError::LockPoisoned("gate"))?;
            let _ = entered.send(());
            drop(entered);
            let release = self
                .release
                .lock()
                .map_err(|_| StoreError::LockPoisoned("gate"))?;
            let _ = release.recv();
            self.inner.append(movement)
        }

        fn query(&self, filter: &LedgerFilter) -> Result<Vec<MovementRecord>, StoreError> {
            self.inner.query(filter)
        }

        fn reset(&self) -> Result<usize, StoreError> {
            self.inner.reset()
        }
    }

    #[test]
    fn scoped_slot_reads_wait_for_the_transfer_record() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let ledger = Arc::new(GatedLedger {
            inner: InMemoryLedgerStore::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let engine = Arc::new(StockEngine::new(
            Arc::clone(&ledger),
            InMemoryLocationStore::new(),
            EngineConfig::default(),
        ));
        let (m, w) = setup(&*engine);
        place(&*engine, m, w, "A", dec!(8));

        let mover = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.create_movement(
                    MovementRequest::new(m, w, MovementType::Transfer, dec!(5))
                        .from_slot(slot("A"))
                        .to_slot(slot("B")),
                )
            })
        };
        // The slot move is done; the ledger record is not yet appended.
        entered_rx.recv().unwrap();

        let (read_tx, read_rx) = mpsc::channel();
        let reader = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let _ = read_tx.send(engine.locations(Some(m), Some(w)));
            })
        };
        assert!(read_rx.recv_timeout(Duration::from_millis(100)).is_err());

        release_tx.send(()).unwrap();
        mover.join().unwrap().unwrap();
        let rows = read_rx.recv().unwrap().unwrap();
        reader.join().unwrap();

        let quantities: Vec<_> = rows.iter().map(|r| r.quantity).collect();
        assert_eq!(quantities, vec![dec!(3), dec!(5)]);
        assert_eq!(ledger.query(&LedgerFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn inbound_past_the_decimal_range_is_never_recorded() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        let huge = dec!(50000000000000000000000000000);

        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, huge))
            .unwrap();
        let err = engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, huge))
            .unwrap_err();

        assert_eq!(err, EngineError::Validation("quantity out of range".to_string()));
        assert_eq!(engine.current_stock(m, w, None).unwrap(), huge);
        assert_eq!(engine.stock_summary(None).unwrap()[&m][&w], huge);
        assert!(engine.low_stock().unwrap().is_empty());
        assert_eq!(engine.movement_history(&LedgerFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn slot_overflow_rejects_the_transfer_and_keeps_the_store_usable() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        let huge = dec!(79000000000000000000000000000);
        place(&engine, m, w, "A", huge);
        place(&engine, m, w, "B", huge);

        let err = engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Transfer, huge)
                    .from_slot(slot("A"))
                    .to_slot(slot("B")),
            )
            .unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(slot_quantity(&engine, m, w, "A"), Some(huge));
        assert_eq!(slot_quantity(&engine, m, w, "B"), Some(huge));
        assert_eq!(engine.locations(None, None).unwrap().len(), 2);
        assert!(engine.movement_history(&LedgerFilter::default()).unwrap().is_empty());
        place(&engine, m, w, "C", dec!(1));
    }

    #[test]
    fn upsert_location_is_idempotent_by_key() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);

        let payload = LocationUpsert {
            material_id: m,
            warehouse_id: w,
            slot: SlotInput {
                rack: Some("A".to_string()),
                level: Some("1".to_string()),
                r#box: Some("3".to_string()),
                position: Some(" ".to_string()),
            },
            quantity: dec!(7),
        };
        let first = engine.upsert_location(payload.clone()).unwrap();
        let second = engine.upsert_location(payload).unwrap();

        assert_eq!(first.quantity, second.quantity);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(engine.locations(None, None).unwrap().len(), 1);
    }

    #[test]
    fn project_attribution_does_not_scope_sufficiency() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        let p = engine
            .create_project(NewProject {
                code: "P1".to_string(),
                name: "Tower".to_string(),
            })
            .unwrap();
        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::In, dec!(5)).with_project(p.id),
            )
            .unwrap();
        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(5)))
            .unwrap();

        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Out, dec!(8))
                    .with_project(p.id)
                    .from_slot(slot("A")),
            )
            .unwrap();

        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(2));
        let rows = engine.stock_by_project(Some(p.id)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, dec!(-3));
    }

    #[test]
    fn alerts_reflect_ledger_and_catalog() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(9)))
            .unwrap();
        engine
            .create_movement(
                MovementRequest::new(m, w, MovementType::Out, dec!(4)).from_slot(slot("A")),
            )
            .unwrap();

        let low = engine.low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!((low[0].balance, low[0].min_stock), (dec!(5), dec!(5)));

        let ranked = engine.most_used(None).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_out, dec!(4));

        let summary = engine.stock_summary(Some(m)).unwrap();
        assert_eq!(summary[&m][&w], dec!(5));
    }

    #[test]
    fn tool_lifecycle_and_maintenance_alerts() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, _) = setup(&engine);
        let p = engine
            .create_project(NewProject {
                code: "P1".to_string(),
                name: "Tower".to_string(),
            })
            .unwrap();

        let assignment = engine
            .assign_tool(AssignTool {
                material_id: m,
                project_id: p.id,
                assigned_to: "Ana".to_string(),
                expected_return_at: None,
            })
            .unwrap();
        assert_eq!(engine.assigned_tools().unwrap().len(), 1);

        engine.return_tool(assignment.id).unwrap();
        assert!(engine.assigned_tools().unwrap().is_empty());
        assert_eq!(engine.return_tool(assignment.id).unwrap_err().code(), "not_found");

        let today = Utc::now().date_naive();
        engine
            .register_maintenance(RegisterMaintenance {
                material_id: m,
                maintenance_type: "calibration".to_string(),
                last_maintenance: None,
                next_due: today.checked_add_days(Days::new(3)).unwrap(),
                notes: None,
            })
            .unwrap();
        engine
            .register_maintenance(RegisterMaintenance {
                material_id: m,
                maintenance_type: "overhaul".to_string(),
                last_maintenance: None,
                next_due: today.checked_add_days(Days::new(30)).unwrap(),
                notes: None,
            })
            .unwrap();

        assert_eq!(engine.maintenance_alerts(today, None).unwrap().len(), 1);
        assert_eq!(engine.maintenance_alerts(today, Some(30)).unwrap().len(), 2);
    }

    #[test]
    fn reset_all_clears_every_store() {
        let engine = StockEngine::in_memory(EngineConfig::default());
        let (m, w) = setup(&engine);
        place(&engine, m, w, "A", dec!(1));
        engine
            .create_movement(MovementRequest::new(m, w, MovementType::In, dec!(1)))
            .unwrap();

        let report = engine.reset_all().unwrap();

        assert_eq!(report.movements, 1);
        assert_eq!(report.locations, 1);
        assert_eq!(report.registry.materials, 1);
        assert_eq!(report.registry.warehouses, 1);
        assert!(engine.materials().unwrap().is_empty());
        assert_eq!(engine.current_stock(m, w, None).unwrap(), dec!(0));
    }
}
