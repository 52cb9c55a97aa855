//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog rows (materials, warehouses, projects), tool assignments and
/// maintenance schedules are entities: two rows with equal fields but different
/// ids are different things.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
