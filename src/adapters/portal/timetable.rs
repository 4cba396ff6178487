//! Implements TimetablePort against the portal's search endpoint.
//!
//! Response shape: `{success: true, data: {day: {time: [schedule, ...]}}}`, flattened
//! into a per-day, time-ordered list of classified entries. Fail-soft: the UI
//! always gets something to render.

use crate::adapters::portal::client::PortalClient;
use crate::adapters::portal::session::SessionAcquirer;
use crate::domain::{
    Cohort, Day, DomainError, ScheduleSource, TimeRange, TimetableEntry, TimetableFetch,
    WeeklySchedule, infer_type,
};
use crate::ports::TimetablePort;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TimetableFetcher {
    client: Arc<PortalClient>,
    sessions: SessionAcquirer,
}

impl TimetableFetcher {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self {
            sessions: SessionAcquirer::new(Arc::clone(&client)),
            client,
        }
    }

    async fn try_fetch(&self, cohort: &Cohort) -> Result<TimetableFetch, DomainError> {
        let session = self.sessions.acquire().await?;
        info!(
            cohort = %cohort,
            csrf = session.csrf_token.is_some(),
            cookies = session.cookies.len(),
            "fetching timetable"
        );

        let form = [
            ("_token", session.token()),
            ("degree", cohort.degree.as_str()),
            ("year", cohort.year.as_str()),
            ("batch", cohort.batch.as_str()),
        ];
        let payload = self
            .client
            .post_form(&self.client.endpoints().search, &form, &session)
            .await?;

        let mut fetch = TimetableFetch::live(parse_search_response(&payload)?);
        fetch.degree = string_field(&payload, "degree");
        fetch.year = string_field(&payload, "year");
        Ok(fetch)
    }
}

#[async_trait::async_trait]
impl TimetablePort for TimetableFetcher {
    async fn fetch_timetable(&self, cohort: &Cohort) -> TimetableFetch {
        match self.try_fetch(cohort).await {
            Ok(fetch) => {
                info!(cohort = %cohort, classes = fetch.classes.class_count(), "timetable fetched");
                fetch
            }
            Err(e) => {
                let source = source_for_error(&e);
                warn!(cohort = %cohort, error = %e, source = %source, "timetable unavailable");
                TimetableFetch::empty(source)
            }
        }
    }
}

/// Network and parse failures are `error`; a portal that answered but not usefully is `unavailable`.
fn source_for_error(error: &DomainError) -> ScheduleSource {
    match error {
        DomainError::Unreachable(_) | DomainError::MalformedJson(_) => ScheduleSource::Error,
        _ => ScheduleSource::Unavailable,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validates the success envelope and flattens `data`.
pub fn parse_search_response(payload: &Value) -> Result<WeeklySchedule, DomainError> {
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(DomainError::ShapeMismatch("search: success is not true".into()));
    }
    match payload.get("data") {
        Some(Value::Object(data)) => Ok(flatten_days(data)),
        // PHP encodes an empty associative array as `[]`.
        Some(Value::Array(items)) if items.is_empty() => Ok(WeeklySchedule::new()),
        _ => Err(DomainError::ShapeMismatch("search: data is not an object".into())),
    }
}

/// day → time → [schedule] into a WeeklySchedule. Unknown days and unparseable
/// time slots are dropped.
fn flatten_days(data: &Map<String, Value>) -> WeeklySchedule {
    let mut week = WeeklySchedule::new();
    for (day_key, slots) in data {
        let Some(day) = Day::parse(day_key) else {
            debug!(day = %day_key, "skipping day outside the teaching week");
            continue;
        };
        let mut entries = Vec::new();
        if let Some(slots) = slots.as_object() {
            for (time_key, schedules) in slots {
                let Some(time) = TimeRange::parse(time_key) else {
                    debug!(day = %day, time = %time_key, "skipping unparseable time slot");
                    continue;
                };
                let Some(schedules) = schedules.as_array() else {
                    continue;
                };
                entries.extend(schedules.iter().map(|s| entry_from_schedule(day, time, s)));
            }
        }
        week.extend_day(day, entries);
    }
    week
}

/// Non-empty string field, like the portal's own `value || default` handling.
fn non_empty<'a>(schedule: &'a Value, key: &str) -> Option<&'a str> {
    schedule
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn entry_from_schedule(day: Day, time: TimeRange, schedule: &Value) -> TimetableEntry {
    let subject = non_empty(schedule, "subject");
    let ltp = non_empty(schedule, "ltp");
    TimetableEntry {
        day,
        time,
        subject: subject.unwrap_or("Unknown").to_string(),
        faculty: non_empty(schedule, "facultyName")
            .unwrap_or("TBA")
            .to_string(),
        room: non_empty(schedule, "room_name").unwrap_or("TBA").to_string(),
        kind: infer_type(ltp, subject),
        ltp: ltp.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClassType;
    use serde_json::json;

    #[test]
    fn test_flattens_and_sorts_each_day() {
        let payload = json!({
            "success": true,
            "degree": "BTECH-CSE",
            "data": {
                "Monday": {
                    "13:30-14:20": [{"subject": "OS", "facultyName": "Dr. Rao", "room_name": "A-101", "ltp": "3-0-0"}],
                    "09:00-09:50": [
                        {"subject": "DBMS", "facultyName": "Dr. Iyer", "room_name": "B-204", "ltp": "0-0-2"},
                        {"subject": "Maths", "ltp": "3-1-0"}
                    ]
                },
                "Tuesday": {}
            }
        });
        let week = parse_search_response(&payload).unwrap();

        let monday = week.day(Day::Monday);
        assert_eq!(monday.len(), 3);
        assert_eq!(monday[0].time.to_string(), "09:00-09:50");
        assert_eq!(monday[0].subject, "DBMS");
        assert_eq!(monday[0].kind, ClassType::Lab);
        assert_eq!(monday[1].subject, "Maths");
        assert_eq!(monday[1].kind, ClassType::Tutorial);
        assert_eq!(monday[1].faculty, "TBA");
        assert_eq!(monday[1].room, "TBA");
        assert_eq!(monday[2].subject, "OS");
        assert_eq!(monday[2].kind, ClassType::Lecture);
        assert!(week.day(Day::Tuesday).is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let payload = json!({"success": true, "data": {"Friday": {"10:50-11:40": [{}]}}});
        let week = parse_search_response(&payload).unwrap();
        let e = &week.day(Day::Friday)[0];
        assert_eq!(e.subject, "Unknown");
        assert_eq!(e.faculty, "TBA");
        assert_eq!(e.room, "TBA");
        assert_eq!(e.kind, ClassType::Lecture);
        assert_eq!(e.ltp, None);
    }

    #[test]
    fn test_drops_unknown_days_and_bad_slots() {
        let payload = json!({
            "success": true,
            "data": {
                "Sunday": {"09:00-09:50": [{"subject": "Ghost"}]},
                "Wednesday": {"Lunch": [{"subject": "Food"}], "11:40-12:30": [{"subject": "CN Lab"}]}
            }
        });
        let week = parse_search_response(&payload).unwrap();
        assert_eq!(week.class_count(), 1);
        assert_eq!(week.day(Day::Wednesday)[0].kind, ClassType::Lab);
    }

    #[test]
    fn test_rejects_non_matching_shape() {
        assert!(matches!(
            parse_search_response(&json!({"success": false, "data": {}})),
            Err(DomainError::ShapeMismatch(_))
        ));
        assert!(matches!(
            parse_search_response(&json!({"success": true, "data": [{"Monday": {}}]})),
            Err(DomainError::ShapeMismatch(_))
        ));
        assert!(matches!(
            parse_search_response(&json!({"success": true, "data": "none"})),
            Err(DomainError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_empty_data_array_is_empty_week() {
        let week = parse_search_response(&json!({"success": true, "data": []})).unwrap();
        assert_eq!(week, WeeklySchedule::new());
        assert_eq!(week.class_count(), 0);
    }

    #[test]
    fn test_source_for_error() {
        assert_eq!(
            source_for_error(&DomainError::Unreachable("down".into())),
            ScheduleSource::Error
        );
        assert_eq!(
            source_for_error(&DomainError::UpstreamStatus { status: 419 }),
            ScheduleSource::Unavailable
        );
    }
}
