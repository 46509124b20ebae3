//! Process-wide tracing setup shared by binaries, tests and benches.

/// Initialize process-wide observability (structured JSON logs).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, formatters).
pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init_for_tests, init_with_default};
