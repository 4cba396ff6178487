//! Reminder scheduler use case.
//!
//! `Idle → Armed → (Firing | Rearmed) → Armed`, back to `Idle` only on cancel.
//! Each arming cycle fetches the week, compares it to the last snapshot, then
//! arms one timer per class ahead of its next start. A weekly task rearms on
//! Friday 00:00 local time and every 7 days after that.

use crate::domain::{Cohort, Notification, Profile, ScheduleSource, WeeklySchedule};
use crate::ports::{Clock, NotifierPort, ReminderStatePort, TimetablePort};
use crate::usecases::reminder_planner::{PlannedReminder, next_weekly_boundary, plan_reminders};
use crate::usecases::schedule_reader::ScheduleReader;
use crate::usecases::timer_registry::TimerRegistry;
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Notified entries older than this are pruned on every arming cycle.
const NOTIFIED_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
    Firing,
    Rearmed,
}

#[derive(Clone)]
pub struct ReminderService {
    reader: ScheduleReader,
    store: Arc<dyn ReminderStatePort>,
    notifier: Arc<dyn NotifierPort>,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(
        timetable: Arc<dyn TimetablePort>,
        store: Arc<dyn ReminderStatePort>,
        notifier: Arc<dyn NotifierPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader: ScheduleReader::new(timetable, Arc::clone(&store)),
            store,
            notifier,
            clock,
        }
    }

    /// Arms reminders for `profile` and returns the handle that cancels them.
    ///
    /// Stays `Idle` when disabled or when the profile lacks degree, year or batch.
    pub async fn schedule(
        &self,
        profile: Profile,
        enabled: bool,
        lead_minutes: u32,
    ) -> ReminderHandle {
        let Some(cohort) = profile.cohort().filter(|_| enabled) else {
            debug!(enabled, complete = profile.is_complete(), "reminders stay idle");
            return ReminderHandle::idle();
        };

        let scope = profile.scope_key();
        let scheduler = Arc::new(Scheduler {
            service: self.clone(),
            registry: TimerRegistry::new(Arc::clone(&self.store), scope.clone()),
            lead: chrono::Duration::minutes(i64::from(lead_minutes)),
            profile,
            cohort,
            scope,
            state: Mutex::new(SchedulerState::Idle),
            weekly: Mutex::new(None),
        });

        scheduler.arm_cycle().await;
        scheduler.set_state(SchedulerState::Armed);
        let weekly = tokio::spawn(Arc::clone(&scheduler).weekly_loop());
        *lock(&scheduler.weekly) = Some(weekly);

        info!(
            cohort = %scheduler.cohort,
            lead_minutes,
            armed = scheduler.registry.armed_count(),
            "reminders armed"
        );
        ReminderHandle {
            scheduler: Some(scheduler),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// One armed scheduler instance. Shared by its timers and the weekly task.
struct Scheduler {
    service: ReminderService,
    registry: TimerRegistry,
    lead: chrono::Duration,
    profile: Profile,
    cohort: Cohort,
    scope: String,
    state: Mutex<SchedulerState>,
    weekly: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    fn set_state(&self, state: SchedulerState) {
        if self.registry.is_shut_down() {
            *lock(&self.state) = SchedulerState::Idle;
            return;
        }
        *lock(&self.state) = state;
    }

    fn now(&self) -> NaiveDateTime {
        self.service.clock.now()
    }

    /// Tokio instant matching a local wall-clock time. Past times map to now.
    fn instant_at(&self, at: NaiveDateTime) -> Instant {
        let delay = (at - self.now()).to_std().unwrap_or(Duration::ZERO);
        Instant::now() + delay
    }

    /// Fetch, compare with the snapshot, prune, then fire or arm every class.
    async fn arm_cycle(self: &Arc<Self>) {
        let fetch = self.service.reader.read(&self.profile).await;
        info!(cohort = %self.cohort, source = %fetch.source, classes = fetch.classes.class_count(), "arming cycle");
        if fetch.source == ScheduleSource::Live {
            self.detect_change(&fetch.classes).await;
        }

        let now = self.now();
        let cutoff = now.date() - chrono::Duration::days(NOTIFIED_RETENTION_DAYS);
        match self.service.store.prune_notified(&self.scope, cutoff).await {
            Ok(0) => {}
            Ok(pruned) => debug!(pruned, "pruned old notified entries"),
            Err(e) => warn!(error = %e, "pruning notified entries failed"),
        }

        for planned in plan_reminders(&fetch.classes, now, self.lead) {
            if self.registry.is_shut_down() {
                return;
            }
            match self.registry.is_notified(&planned.class_id, planned.occurrence()).await {
                Ok(true) => {
                    debug!(class_id = %planned.class_id, "already notified");
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(class_id = %planned.class_id, error = %e, "notified lookup failed"),
            }

            if planned.is_due(now) {
                info!(class_id = %planned.class_id, "reminder past due; firing now");
                self.fire(&planned).await;
            } else {
                let at = self.instant_at(planned.fire_at);
                let scheduler = Arc::clone(self);
                let id = planned.class_id.clone();
                self.registry.arm(id, at, async move {
                    scheduler.set_state(SchedulerState::Firing);
                    scheduler.fire(&planned).await;
                    scheduler.set_state(SchedulerState::Armed);
                });
            }
        }
    }

    /// One "schedule changed" notification when a previous snapshot exists and differs.
    async fn detect_change(&self, classes: &WeeklySchedule) {
        let current = classes.snapshot();
        let previous = match self.service.store.load_snapshot(&self.scope).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "loading snapshot failed");
                None
            }
        };
        if let Some(previous) = previous.filter(|p| *p != current) {
            info!(cohort = %self.cohort, previous_len = previous.len(), "timetable changed");
            self.show(&Notification::schedule_changed(&self.profile)).await;
        }
        if let Err(e) = self.service.store.save_snapshot(&self.scope, &current).await {
            warn!(error = %e, "saving snapshot failed");
        }
    }

    async fn fire(&self, planned: &PlannedReminder) {
        if self.registry.is_shut_down() {
            return;
        }
        let notification = Notification::class_reminder(&self.profile, &planned.entry);
        if !self.show(&notification).await {
            return;
        }
        if let Err(e) = self
            .registry
            .mark_notified(&planned.class_id, planned.occurrence())
            .await
        {
            warn!(class_id = %planned.class_id, error = %e, "marking notified failed");
        }
    }

    async fn show(&self, notification: &Notification) -> bool {
        match self.service.notifier.show(notification).await {
            Ok(()) => true,
            Err(e) => {
                warn!(title = %notification.title, error = %e, "notification not shown");
                false
            }
        }
    }

    async fn rearm(self: &Arc<Self>) {
        self.set_state(SchedulerState::Rearmed);
        let cancelled = self.registry.cancel_all();
        info!(cohort = %self.cohort, cancelled, "weekly rearm");
        self.arm_cycle().await;
        self.set_state(SchedulerState::Armed);
    }

    async fn weekly_loop(self: Arc<Self>) {
        let root = self.registry.root_token();
        let boundary = self.instant_at(next_weekly_boundary(self.now()));
        tokio::select! {
            biased;
            _ = root.cancelled() => return,
            _ = tokio::time::sleep_until(boundary) => {}
        }
        self.rearm().await;

        let mut interval = tokio::time::interval_at(boundary + WEEK, WEEK);
        loop {
            tokio::select! {
                biased;
                _ = root.cancelled() => break,
                _ = interval.tick() => self.rearm().await,
            }
        }
    }

    /// False when already cancelled.
    fn cancel(&self) -> bool {
        if self.registry.is_shut_down() {
            return false;
        }
        self.registry.shutdown();
        if let Some(weekly) = lock(&self.weekly).take() {
            weekly.abort();
        }
        *lock(&self.state) = SchedulerState::Idle;
        true
    }
}

/// Returned by `ReminderService::schedule`. Dropping it cancels every reminder.
pub struct ReminderHandle {
    scheduler: Option<Arc<Scheduler>>,
}

impl ReminderHandle {
    fn idle() -> Self {
        Self { scheduler: None }
    }

    /// Cancels every armed timer and the weekly rearm. Idempotent.
    pub fn cancel(&self) {
        if let Some(scheduler) = self.scheduler.as_ref().filter(|s| s.cancel()) {
            info!(cohort = %scheduler.cohort, "reminders cancelled");
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler
            .as_ref()
            .map_or(SchedulerState::Idle, |s| *lock(&s.state))
    }

    pub fn is_armed(&self) -> bool {
        self.state() != SchedulerState::Idle
    }

    pub fn armed_timers(&self) -> usize {
        self.scheduler
            .as_ref()
            .map_or(0, |s| s.registry.armed_count())
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
