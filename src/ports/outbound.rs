//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{ClassId, Cohort, DomainError, Notification, TimetableFetch};
use chrono::NaiveDate;

/// Cohort choices offered by the portal.
#[async_trait::async_trait]
pub trait OptionsPort: Send + Sync {
    /// Year labels available for a degree, rank-ordered. Empty means "no data available".
    async fn get_years(&self, degree: &str) -> Result<Vec<String>, DomainError>;

    /// Batch labels for a degree and year, sorted and deduplicated.
    ///
    /// Fails with `MissingParameter` before any network call when `year` is absent.
    async fn get_batches(&self, degree: &str, year: Option<&str>)
    -> Result<Vec<String>, DomainError>;
}

/// Weekly timetable of a cohort.
#[async_trait::async_trait]
pub trait TimetablePort: Send + Sync {
    /// Fail-soft: never errors. Failures come back as empty classes with a source tag.
    async fn fetch_timetable(&self, cohort: &Cohort) -> TimetableFetch;
}

/// Persisted reminder state. Every key is scoped by `Profile::scope_key`.
///
/// Writes are last-write-wins; concurrent client instances are not coordinated.
#[async_trait::async_trait]
pub trait ReminderStatePort: Send + Sync {
    async fn is_enabled(&self, scope: &str) -> Result<bool, DomainError>;

    async fn set_enabled(&self, scope: &str, enabled: bool) -> Result<(), DomainError>;

    /// Occurrence date the class was last notified for, if any.
    async fn notified_on(
        &self,
        scope: &str,
        class_id: &ClassId,
    ) -> Result<Option<NaiveDate>, DomainError>;

    async fn mark_notified(
        &self,
        scope: &str,
        class_id: &ClassId,
        occurrence: NaiveDate,
    ) -> Result<(), DomainError>;

    /// Drops notified entries whose occurrence is before `before`. Returns how many were removed.
    async fn prune_notified(&self, scope: &str, before: NaiveDate) -> Result<usize, DomainError>;

    async fn clear_notified(&self, scope: &str) -> Result<(), DomainError>;

    async fn load_snapshot(&self, scope: &str) -> Result<Option<String>, DomainError>;

    async fn save_snapshot(&self, scope: &str, snapshot: &str) -> Result<(), DomainError>;

    /// Last live week seen by any reader. Kept apart from the change-detection snapshot.
    async fn load_cached_week(&self, scope: &str) -> Result<Option<String>, DomainError>;

    async fn save_cached_week(&self, scope: &str, week: &str) -> Result<(), DomainError>;
}

/// Platform notification-show primitive.
#[async_trait::async_trait]
pub trait NotifierPort: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), DomainError>;
}
