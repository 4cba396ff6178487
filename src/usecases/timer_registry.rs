//! Owns the armed reminder timers of one scheduler instance.
//!
//! Maps class identity to a cancellation handle. Every timer is a child of one
//! root token, so `shutdown` invalidates all of them at once. Notified tracking
//! goes through the injected `ReminderStatePort`.

use crate::domain::{ClassId, DomainError};
use crate::ports::ReminderStatePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct ArmedTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ArmedTimer {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

pub struct TimerRegistry {
    store: Arc<dyn ReminderStatePort>,
    scope: String,
    root: CancellationToken,
    timers: Mutex<HashMap<ClassId, ArmedTimer>>,
}

impl TimerRegistry {
    pub fn new(store: Arc<dyn ReminderStatePort>, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
            root: CancellationToken::new(),
            timers: Mutex::new(HashMap::new()),
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<ClassId, ArmedTimer>> {
        // Never held across an await; a poisoned map is still consistent.
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `action` at `at` unless cancelled first.
    ///
    /// Returns false without arming when `id` already has a pending timer or
    /// the registry is shut down.
    pub fn arm<F>(&self, id: ClassId, at: Instant, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.root.is_cancelled() {
            return false;
        }
        let mut timers = self.timers();
        if timers.get(&id).is_some_and(|t| !t.handle.is_finished()) {
            debug!(class_id = %id, "timer already armed");
            return false;
        }

        let token = self.root.child_token();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep_until(at) => {}
            }
            if task_token.is_cancelled() {
                return;
            }
            action.await;
        });
        timers.insert(id, ArmedTimer { token, handle });
        true
    }

    /// Cancels every pending timer. The registry stays usable for re-arming.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<ArmedTimer> = self.timers().drain().map(|(_, t)| t).collect();
        let count = drained.len();
        drained.into_iter().for_each(ArmedTimer::cancel);
        count
    }

    /// Cancels everything for good; later `arm` calls are refused.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.cancel_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Root token. Cancelled by `shutdown`.
    pub fn root_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Timers that have not fired or been cancelled yet.
    pub fn armed_count(&self) -> usize {
        self.timers()
            .values()
            .filter(|t| !t.handle.is_finished())
            .count()
    }

    /// True when the class was already notified for this occurrence or a later one.
    pub async fn is_notified(
        &self,
        id: &ClassId,
        occurrence: NaiveDate,
    ) -> Result<bool, DomainError> {
        Ok(self
            .store
            .notified_on(&self.scope, id)
            .await?
            .is_some_and(|d| d >= occurrence))
    }

    pub async fn mark_notified(&self, id: &ClassId, occurrence: NaiveDate) -> Result<(), DomainError> {
        self.store.mark_notified(&self.scope, id, occurrence).await
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
