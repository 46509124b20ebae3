//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two attribute
/// combinations holding the same values are the same combination, whatever
/// order they were collected in.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
