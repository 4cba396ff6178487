//! timetable-sync: resilient client for an undocumented university timetable
//! portal, with client-side class reminders. Hexagonal architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
