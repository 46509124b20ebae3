//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Entities carrying an `active` flag (archived records stay referenced but hidden).
pub trait Archivable: Entity {
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);
}
