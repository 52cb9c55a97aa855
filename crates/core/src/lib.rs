//! `kardex-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the stock ledger
//! (identifiers, the error taxonomy, marker traits). No infrastructure concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AssignmentId, MaintenanceId, MaterialId, MovementId, ProjectId, WarehouseId};
pub use value_object::ValueObject;
