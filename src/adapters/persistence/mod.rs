//! Persistence adapters. Implement ReminderStatePort.

pub mod state_json;

pub use state_json::JsonReminderStore;
