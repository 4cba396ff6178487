//! Infrastructure adapters. Implement outbound ports.
//!
//! Portal scraping, JSON HTTP surface, filesystem state, notifications, terminal UI.
//! Map errors to DomainError.

pub mod http;
pub mod notify;
pub mod persistence;
pub mod portal;
pub mod system_clock;
pub mod ui;
