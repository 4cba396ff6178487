//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: interactive client invokes application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive flow (pick cohort, view week, manage reminders) until the user quits.
    async fn run(&self) -> Result<(), DomainError>;
}
