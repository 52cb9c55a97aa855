//! Value object trait: equality by value, not identity.
//!
//! Quantities and slot coordinates have no identity. A slot at rack `A`,
//! level `1`, box `3` is the same slot wherever it is mentioned.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
