//! Clock outbound port. Local wall-clock time for reminder planning.

use chrono::NaiveDateTime;

/// Source of "now" in local time.
///
/// Injected so reminder planning can be driven by a fixed or paused clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}
