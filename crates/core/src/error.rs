//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a local, expected condition that is reported back to the
/// caller as-is. None of them is retried. Storage failures belong to the infra
/// layer, not here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: unknown movement type, non-positive quantity, missing
    /// slot fields, duplicate unique code.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An aggregate (warehouse) or slot-level sufficiency check failed.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: Decimal, available: Decimal },

    /// An adjustment targeted the balance the ledger already holds.
    #[error("no difference: current stock already equals target {target}")]
    NoDifference { target: Decimal },

    /// A referenced row is absent (or not in the state the operation needs).
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn no_difference(target: Decimal) -> Self {
        Self::NoDifference { target }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// A sum or difference of quantities left the representable decimal range.
    pub fn out_of_range() -> Self {
        Self::Validation("quantity out of range".to_string())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
