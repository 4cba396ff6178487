//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/portal types here; adapters map raw upstream JSON into these.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The six-day teaching week. Sunday is never part of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Case-insensitive lookup of a day name as sent by the portal.
    pub fn parse(name: &str) -> Option<Day> {
        let name = name.trim();
        Day::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }

    /// Offset from Monday (Monday = 0).
    pub fn offset_from_monday(self) -> u32 {
        self.weekday().num_days_from_monday()
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Day::Monday => Weekday::Mon,
            Day::Tuesday => Weekday::Tue,
            Day::Wednesday => Weekday::Wed,
            Day::Thursday => Weekday::Thu,
            Day::Friday => Weekday::Fri,
            Day::Saturday => Weekday::Sat,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A class slot, always two valid clock times. Serialized as zero-padded `HH:MM-HH:MM`,
/// so lexicographic order on the string matches chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Parses `09:00-09:50`, `9:00 - 9:50` and similar. Returns None unless both halves are clock times.
    pub fn parse(raw: &str) -> Option<TimeRange> {
        let (start, end) = raw.split_once('-')?;
        Some(TimeRange {
            start: parse_clock(start)?,
            end: parse_clock(end)?,
        })
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl TryFrom<String> for TimeRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeRange::parse(&value).ok_or_else(|| format!("invalid time range: {value}"))
    }
}

impl From<TimeRange> for String {
    fn from(value: TimeRange) -> Self {
        value.to_string()
    }
}

/// Pedagogical type of a session. Inferred locally, never sent by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Lecture,
    Lab,
    Tutorial,
    Free,
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassType::Lecture => "lecture",
            ClassType::Lab => "lab",
            ClassType::Tutorial => "tutorial",
            ClassType::Free => "free",
        })
    }
}

/// Canonical unit of a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub day: Day,
    pub time: TimeRange,
    pub subject: String,
    pub faculty: String,
    pub room: String,
    #[serde(rename = "type")]
    pub kind: ClassType,
    /// Raw Lecture-Tutorial-Practical code, e.g. `3-1-0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltp: Option<String>,
}

impl TimetableEntry {
    pub fn class_id(&self) -> ClassId {
        ClassId::new(self.day, &self.time, &self.subject, &self.room)
    }
}

/// Stable identity of a class across independent fetches: (day, time, subject, room).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(day: Day, time: &TimeRange, subject: &str, room: &str) -> Self {
        Self(format!("{day}|{time}|{subject}|{room}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Day → classes ordered by time. Only Monday..Saturday can appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule(BTreeMap<Day, Vec<TimetableEntry>>);

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends entries to a day and keeps the day sorted by time (stable).
    pub fn extend_day(&mut self, day: Day, entries: impl IntoIterator<Item = TimetableEntry>) {
        let slot = self.0.entry(day).or_default();
        slot.extend(entries);
        slot.sort_by(|a, b| a.time.cmp(&b.time));
    }

    pub fn day(&self, day: Day) -> &[TimetableEntry] {
        self.0.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn days(&self) -> impl Iterator<Item = (Day, &[TimetableEntry])> {
        self.0.iter().map(|(d, e)| (*d, e.as_slice()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &TimetableEntry> {
        self.0.values().flatten()
    }

    pub fn class_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.class_count() == 0
    }

    /// Serialized form used for change detection between fetches.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_snapshot(snapshot: &str) -> Option<Self> {
        serde_json::from_str(snapshot).ok()
    }
}

/// Degree/Year/Batch: the three-part key of a cohort's timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub degree: String,
    pub year: String,
    pub batch: String,
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.degree, self.year, self.batch)
    }
}

/// Student profile, read from the external account store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        !self.degree.trim().is_empty()
            && !self.year.trim().is_empty()
            && !self.batch.trim().is_empty()
    }

    pub fn cohort(&self) -> Option<Cohort> {
        self.is_complete().then(|| Cohort {
            degree: self.degree.clone(),
            year: self.year.clone(),
            batch: self.batch.clone(),
        })
    }

    /// Key under which reminder state for this profile is persisted.
    pub fn scope_key(&self) -> String {
        format!("{}|{}|{}", self.degree, self.year, self.batch)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
    }
}

/// Raw academic-batch record as the portal sends it. Transient; lives only during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRecord {
    pub degree: String,
    pub year: String,
    pub batch: String,
    pub semester: String,
    pub school_dept: String,
    pub session: String,
    pub group_name: Option<String>,
    pub sub_batch: Option<String>,
    pub status: String,
}

/// Provenance of returned schedule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSource {
    Live,
    Cached,
    Unavailable,
    Error,
}

impl fmt::Display for ScheduleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleSource::Live => "live",
            ScheduleSource::Cached => "cached",
            ScheduleSource::Unavailable => "unavailable",
            ScheduleSource::Error => "error",
        })
    }
}

/// Result of a timetable fetch. Never an error: failures are a source tag with empty classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableFetch {
    pub classes: WeeklySchedule,
    pub source: ScheduleSource,
    /// Cohort labels echoed by the portal on live responses.
    pub degree: Option<String>,
    pub year: Option<String>,
}

impl TimetableFetch {
    pub fn live(classes: WeeklySchedule) -> Self {
        Self {
            classes,
            source: ScheduleSource::Live,
            degree: None,
            year: None,
        }
    }

    pub fn empty(source: ScheduleSource) -> Self {
        Self {
            classes: WeeklySchedule::new(),
            source,
            degree: None,
            year: None,
        }
    }
}

/// A local notification handed to the platform notification primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Collapses repeated notifications for the same thing on platforms that support it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Notification {
    /// Reminder shown ahead of a class.
    pub fn class_reminder(profile: &Profile, entry: &TimetableEntry) -> Self {
        let title = match profile.first_name() {
            Some(name) => format!("Hey {name}!!"),
            None => format!("Next: {}", entry.subject),
        };
        let body = format!(
            "{} ({}) • {} • {} • Starts at {}",
            entry.subject, entry.kind, entry.room, entry.faculty, entry.time
        );
        Self {
            title,
            body,
            tag: Some(entry.class_id().to_string()),
        }
    }

    /// Shown when the fetched week differs from the last one seen.
    pub fn schedule_changed(profile: &Profile) -> Self {
        let title = match profile.first_name() {
            Some(name) => format!("Hey {name}!!"),
            None => "Timetable updated".to_string(),
        };
        Self {
            title,
            body: format!(
                "Your timetable for {} {} {} got updated.",
                profile.degree, profile.year, profile.batch
            ),
            tag: Some(format!("schedule-changed:{}", profile.scope_key())),
        }
    }
}
