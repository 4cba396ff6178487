//! Calendar math for reminders. Pure functions over local wall-clock time.
//!
//! Weeks are Monday-anchored. A class whose start has already passed this week
//! is planned for next week's occurrence.

use crate::domain::{ClassId, Day, TimeRange, TimetableEntry, WeeklySchedule};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::collections::HashSet;

/// Monday of the week containing `today`. Sunday belongs to the week that started six days earlier.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// Next start of a class on `day` at `time`, not before `now`.
pub fn next_class_start(day: Day, time: &TimeRange, now: NaiveDateTime) -> NaiveDateTime {
    let date = week_start(now.date()) + Duration::days(i64::from(day.offset_from_monday()));
    let start = date.and_time(time.start);
    if start < now {
        start + Duration::days(7)
    } else {
        start
    }
}

/// One reminder derived from a timetable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub class_id: ClassId,
    pub entry: TimetableEntry,
    pub class_start: NaiveDateTime,
    /// `class_start - lead`. May be in the past; such reminders fire immediately.
    pub fire_at: NaiveDateTime,
}

impl PlannedReminder {
    /// Date of the class instance this reminder is for.
    pub fn occurrence(&self) -> NaiveDate {
        self.class_start.date()
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.fire_at <= now
    }
}

/// Reminders for every class in the week, ordered by fire time.
/// Repeated class identities are planned once.
pub fn plan_reminders(
    schedule: &WeeklySchedule,
    now: NaiveDateTime,
    lead: Duration,
) -> Vec<PlannedReminder> {
    let mut seen = HashSet::new();
    let mut planned: Vec<PlannedReminder> = schedule
        .entries()
        .filter(|entry| seen.insert(entry.class_id()))
        .map(|entry| {
            let class_start = next_class_start(entry.day, &entry.time, now);
            PlannedReminder {
                class_id: entry.class_id(),
                entry: entry.clone(),
                class_start,
                fire_at: class_start - lead,
            }
        })
        .collect();
    planned.sort_by_key(|p| p.fire_at);
    planned
}

/// Next Friday 00:00 strictly after today. On a Friday that is next week's Friday.
pub fn next_weekly_boundary(now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let days_ahead = match (friday + 7 - today) % 7 {
        0 => 7,
        n => n,
    };
    (now.date() + Duration::days(i64::from(days_ahead))).and_time(NaiveTime::MIN)
}
