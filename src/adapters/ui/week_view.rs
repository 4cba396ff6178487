//! Plain-text rendering of a fetched week.

use crate::domain::{Day, ScheduleSource, TimetableFetch};
use crate::usecases::timetable_service::CONNECT_ERROR;
use std::fmt::Write;

/// One-line provenance notice. None for live data.
pub fn source_notice(source: ScheduleSource) -> Option<&'static str> {
    match source {
        ScheduleSource::Live => None,
        ScheduleSource::Cached => Some("Offline: showing your last saved timetable"),
        ScheduleSource::Unavailable | ScheduleSource::Error => Some(CONNECT_ERROR),
    }
}

pub fn render_week(fetch: &TimetableFetch) -> String {
    let mut out = String::new();
    if let Some(notice) = source_notice(fetch.source) {
        let _ = writeln!(out, "[{}] {}", fetch.source, notice);
    }
    if fetch.classes.is_empty() {
        out.push_str("No classes to show.\n");
        return out;
    }

    for day in Day::ALL {
        let entries = fetch.classes.day(day);
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{day}");
        for e in entries {
            let _ = writeln!(
                out,
                "  {}  {:<28} {:<9} {:<10} {}",
                e.time,
                e.subject,
                e.kind.to_string(),
                e.room,
                e.faculty
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassType, TimeRange, TimetableEntry, WeeklySchedule};

    #[test]
    fn test_render_orders_days_and_tags_cache() {
        let mut week = WeeklySchedule::new();
        for (day, subject) in [(Day::Wednesday, "OS"), (Day::Monday, "DBMS")] {
            week.extend_day(
                day,
                vec![TimetableEntry {
                    day,
                    time: TimeRange::parse("09:00-09:50").unwrap(),
                    subject: subject.into(),
                    faculty: "TBA".into(),
                    room: "A-101".into(),
                    kind: ClassType::Lecture,
                    ltp: None,
                }],
            );
        }
        let fetch = TimetableFetch {
            classes: week,
            source: ScheduleSource::Cached,
            degree: None,
            year: None,
        };
        let text = render_week(&fetch);
        assert!(text.starts_with("[cached]"));
        let monday = text.find("Monday").unwrap();
        let wednesday = text.find("Wednesday").unwrap();
        assert!(monday < wednesday);
        assert!(!text.contains("Tuesday"));
    }

    #[test]
    fn test_render_empty_failure() {
        let text = render_week(&TimetableFetch::empty(ScheduleSource::Error));
        assert!(text.contains(CONNECT_ERROR));
        assert!(text.contains("No classes to show."));
    }
}
