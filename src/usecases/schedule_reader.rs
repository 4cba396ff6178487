//! Reads a cohort's week with the best-effort local cache behind it.

use crate::domain::{Profile, ScheduleSource, TimetableFetch, WeeklySchedule};
use crate::ports::{ReminderStatePort, TimetablePort};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ScheduleReader {
    timetable: Arc<dyn TimetablePort>,
    store: Arc<dyn ReminderStatePort>,
}

impl ScheduleReader {
    pub fn new(timetable: Arc<dyn TimetablePort>, store: Arc<dyn ReminderStatePort>) -> Self {
        Self { timetable, store }
    }

    /// Live data when the portal answers; otherwise the last live week tagged
    /// `cached`, or the change-detection snapshot when no week was cached yet.
    /// With neither, the failed fetch comes back as is.
    ///
    /// A live week is cached under its own key so reading never counts as
    /// "seen" for change detection.
    pub async fn read(&self, profile: &Profile) -> TimetableFetch {
        let Some(cohort) = profile.cohort() else {
            return TimetableFetch::empty(ScheduleSource::Unavailable);
        };
        let scope = profile.scope_key();
        let fetch = self.timetable.fetch_timetable(&cohort).await;
        if fetch.source == ScheduleSource::Live {
            if let Err(e) = self
                .store
                .save_cached_week(&scope, &fetch.classes.snapshot())
                .await
            {
                warn!(cohort = %cohort, error = %e, "caching week failed");
            }
            return fetch;
        }

        let stored = match self.store.load_cached_week(&scope).await {
            Ok(Some(week)) => Ok(Some(week)),
            Ok(None) => self.store.load_snapshot(&scope).await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(Some(stored)) => match WeeklySchedule::from_snapshot(&stored) {
                Some(classes) => {
                    info!(cohort = %cohort, upstream = %fetch.source, "serving cached timetable");
                    TimetableFetch {
                        classes,
                        source: ScheduleSource::Cached,
                        degree: None,
                        year: None,
                    }
                }
                None => {
                    warn!(cohort = %cohort, "stored week unreadable");
                    fetch
                }
            },
            Ok(None) => fetch,
            Err(e) => {
                warn!(cohort = %cohort, error = %e, "loading cached week failed");
                fetch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::state_json::JsonReminderStore;
    use crate::domain::{ClassType, Cohort, Day, TimeRange, TimetableEntry};

    struct FixedTimetable(TimetableFetch);

    #[async_trait::async_trait]
    impl TimetablePort for FixedTimetable {
        async fn fetch_timetable(&self, _cohort: &Cohort) -> TimetableFetch {
            self.0.clone()
        }
    }

    fn profile() -> Profile {
        Profile {
            degree: "BTECH-CSE".into(),
            year: "Second".into(),
            batch: "CSE-A".into(),
            full_name: None,
        }
    }

    fn week() -> WeeklySchedule {
        let mut week = WeeklySchedule::new();
        week.extend_day(
            Day::Monday,
            vec![TimetableEntry {
                day: Day::Monday,
                time: TimeRange::parse("09:00-09:50").unwrap(),
                subject: "DBMS".into(),
                faculty: "Dr. Iyer".into(),
                room: "B-204".into(),
                kind: ClassType::Lecture,
                ltp: Some("3-0-0".into()),
            }],
        );
        week
    }

    #[tokio::test]
    async fn test_falls_back_to_snapshot() {
        let store = Arc::new(JsonReminderStore::ephemeral());
        store
            .save_snapshot(&profile().scope_key(), &week().snapshot())
            .await
            .unwrap();
        let reader = ScheduleReader::new(
            Arc::new(FixedTimetable(TimetableFetch::empty(ScheduleSource::Error))),
            store,
        );
        let fetch = reader.read(&profile()).await;
        assert_eq!(fetch.source, ScheduleSource::Cached);
        assert_eq!(fetch.classes, week());
    }

    #[tokio::test]
    async fn test_passes_failure_through_without_snapshot() {
        let reader = ScheduleReader::new(
            Arc::new(FixedTimetable(TimetableFetch::empty(ScheduleSource::Unavailable))),
            Arc::new(JsonReminderStore::ephemeral()),
        );
        let fetch = reader.read(&profile()).await;
        assert_eq!(fetch.source, ScheduleSource::Unavailable);
        assert!(fetch.classes.is_empty());
    }

    #[tokio::test]
    async fn test_view_only_reads_cache_the_week_offline() {
        let store = Arc::new(JsonReminderStore::ephemeral());
        let online = ScheduleReader::new(
            Arc::new(FixedTimetable(TimetableFetch::live(week()))),
            Arc::clone(&store) as Arc<dyn ReminderStatePort>,
        );
        assert_eq!(online.read(&profile()).await.source, ScheduleSource::Live);
        // Change detection still has nothing to compare against.
        assert_eq!(store.load_snapshot(&profile().scope_key()).await.unwrap(), None);

        let offline = ScheduleReader::new(
            Arc::new(FixedTimetable(TimetableFetch::empty(ScheduleSource::Error))),
            Arc::clone(&store) as Arc<dyn ReminderStatePort>,
        );
        let fetch = offline.read(&profile()).await;
        assert_eq!(fetch.source, ScheduleSource::Cached);
        assert_eq!(fetch.classes, week());
    }

    #[tokio::test]
    async fn test_live_wins_over_snapshot() {
        let store = Arc::new(JsonReminderStore::ephemeral());
        store.save_snapshot(&profile().scope_key(), "{}").await.unwrap();
        let reader = ScheduleReader::new(
            Arc::new(FixedTimetable(TimetableFetch::live(week()))),
            store,
        );
        let fetch = reader.read(&profile()).await;
        assert_eq!(fetch.source, ScheduleSource::Live);
        assert_eq!(fetch.classes, week());
    }
}
