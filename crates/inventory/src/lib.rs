//! Inventory domain module (ledger-derived stock + slot tracking).
//!
//! This crate contains business rules for the stock ledger, implemented purely
//! as deterministic domain logic (no IO, no storage, no clocks except where a
//! timestamp is passed in).

pub mod aggregator;
pub mod alerts;
pub mod catalog;
pub mod movement;
pub mod planner;
pub mod slot;
pub mod tools;

pub use aggregator::{ProjectStockRow, StockSummary};
pub use alerts::{LowStockAlert, NegativeBalance, UsageRank};
pub use catalog::{Material, NewMaterial, NewProject, NewWarehouse, Project, Warehouse};
pub use movement::{MovementRecord, MovementRequest, MovementType, PlannedMovement, Quantity};
pub use planner::{MovementPlanner, StockSnapshot, ValidatedMovement};
pub use slot::{LocationKey, LocationRecord, Slot, SlotInput};
pub use tools::{AssignTool, AssignmentStatus, RegisterMaintenance, ToolAssignment, ToolMaintenance};
