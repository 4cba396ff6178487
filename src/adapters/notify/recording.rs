//! In-memory notifier. Keeps every notification it was asked to show.

use crate::domain::{DomainError, Notification};
use crate::ports::NotifierPort;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications shown so far, oldest first.
    pub fn shown(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait::async_trait]
impl NotifierPort for RecordingNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), DomainError> {
        self.shown
            .lock()
            .map_err(|e| DomainError::Notify(e.to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
