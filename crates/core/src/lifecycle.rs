//! Record deletion policy: hard delete when possible, archive otherwise.
//!
//! Storage layers report a blocked delete (typically a referential
//! constraint) as a value rather than an error, and the caller decides what
//! to do with it. [`unlink_or_deactivate`] is the standard decision.

use crate::error::DomainResult;

/// Result of a hard-delete attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlinkOutcome {
    /// The record no longer exists.
    Deleted,
    /// The storage layer refused the delete (e.g. the record is still referenced).
    Blocked { reason: String },
}

/// What [`unlink_or_deactivate`] ended up doing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Deactivation {
    Unlinked,
    Deactivated,
}

/// Minimal mutation surface needed by the deletion policy.
pub trait RecordLifecycle<Id> {
    /// Attempt a hard delete.
    fn unlink(&mut self, id: &Id) -> DomainResult<UnlinkOutcome>;

    /// Set the record's `active` flag.
    fn set_active(&mut self, id: &Id, active: bool) -> DomainResult<()>;
}

/// Delete `id`, or archive it if the storage layer refuses the delete.
///
/// Errors from the store itself (unknown id, ...) are propagated; only a
/// [`UnlinkOutcome::Blocked`] triggers the fallback.
pub fn unlink_or_deactivate<Id, S>(store: &mut S, id: &Id) -> DomainResult<Deactivation>
where
    Id: core::fmt::Debug,
    S: RecordLifecycle<Id> + ?Sized,
{
    match store.unlink(id)? {
        UnlinkOutcome::Deleted => Ok(Deactivation::Unlinked),
        UnlinkOutcome::Blocked { reason } => {
            tracing::warn!(record = ?id, %reason, "unlink blocked, deactivating instead");
            store.set_active(id, false)?;
            Ok(Deactivation::Deactivated)
        }
    }
}
