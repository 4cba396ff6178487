//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Network-level failure reaching the portal.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// Portal answered with a non-2xx status.
    #[error("Upstream returned status {status}")]
    UpstreamStatus { status: u16 },

    /// Body parsed as JSON but no known record array or success shape was found.
    #[error("Upstream shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Malformed JSON from upstream: {0}")]
    MalformedJson(String),

    /// Caller omitted a value the operation requires.
    #[error("Missing {0}")]
    MissingParameter(&'static str),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl DomainError {
    /// True for the kinds a caller must fix (400-equivalent). All other kinds degrade softly.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DomainError::MissingParameter(_) | DomainError::UnknownAction(_)
        )
    }
}
