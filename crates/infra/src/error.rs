//! Infrastructure and engine-level errors.

use rust_decimal::Decimal;
use thiserror::Error;

use kardex_core::DomainError;

/// Store operation error.
///
/// `Domain` carries the expected outcomes a store can report on its own
/// (missing slot row, slot sufficiency). The other variants are persistence
/// failures and abort the operation in progress.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Error surfaced by every engine operation.
///
/// Flattens domain and store errors into the taxonomy callers branch on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: Decimal, available: Decimal },

    #[error("no difference: current stock already equals target {target}")]
    NoDifference { target: Decimal },

    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence failure. No partial effect of the failed operation remains.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::InsufficientStock { .. } => "insufficient_stock",
            EngineError::NoDifference { .. } => "no_difference",
            EngineError::NotFound(_) => "not_found",
            EngineError::Storage(_) => "storage_error",
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::InsufficientStock {
                requested,
                available,
            } => EngineError::InsufficientStock {
                requested,
                available,
            },
            DomainError::NoDifference { target } => EngineError::NoDifference { target },
            DomainError::NotFound(msg) => EngineError::NotFound(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => e.into(),
            StoreError::Storage(msg) => EngineError::Storage(msg),
            StoreError::LockPoisoned(what) => EngineError::Storage(format!("lock poisoned: {what}")),
        }
    }
}
