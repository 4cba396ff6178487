//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod catalog;
pub mod entities;
pub mod errors;
pub mod rules;

pub use entities::{
    BatchRecord, ClassId, ClassType, Cohort, Day, Notification, Profile, ScheduleSource,
    TimeRange, TimetableEntry, TimetableFetch, WeeklySchedule,
};
pub use errors::DomainError;
pub use rules::{infer_type, order_batches, order_years};
