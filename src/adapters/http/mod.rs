//! JSON HTTP surface over `TimetableService`.
//!
//! ```text
//! POST /resolve-options  {action, degree, year?}  -> {success, options, error?}
//! POST /fetch-timetable  {degree, year, batch}    -> {success, classes, source}
//! GET  /health
//! ```

pub mod error;
pub mod handlers;
pub mod router;

pub use router::{AppState, create_router};
