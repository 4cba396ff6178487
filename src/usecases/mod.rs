//! Application use cases. Orchestrate domain logic via ports.

pub mod reminder_planner;
pub mod reminder_service;
pub mod schedule_reader;
pub mod timer_registry;
pub mod timetable_service;

pub use reminder_service::{ReminderHandle, ReminderService, SchedulerState};
pub use schedule_reader::ScheduleReader;
pub use timer_registry::TimerRegistry;
pub use timetable_service::{
    OptionsRequest, OptionsResponse, TimetableRequest, TimetableResponse, TimetableService,
};
