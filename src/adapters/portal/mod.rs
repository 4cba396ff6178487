//! Scraping client for the university timetable portal.
//!
//! The portal exposes no stable API: sessions come from an HTML page, payload
//! shapes vary between endpoints, and several endpoints may answer the same question.

pub mod client;
pub mod normalizer;
pub mod options;
pub mod session;
pub mod timetable;

pub use client::PortalClient;
pub use options::OptionsResolver;
pub use session::{SessionAcquirer, SessionContext};
pub use timetable::TimetableFetcher;
