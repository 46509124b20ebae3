//! `pricebook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod numeric;
pub mod value_object;

pub use entity::{Archivable, Entity};
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use lifecycle::{Deactivation, RecordLifecycle, UnlinkOutcome, unlink_or_deactivate};
pub use numeric::round_to_step;
pub use value_object::ValueObject;
