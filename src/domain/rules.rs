//! Pure business rules: session classification and year ordering.

use crate::domain::ClassType;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Any non-zero practical component, e.g. `2-0-2`.
static PRACTICAL_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+-\d+-[1-9]").expect("practical hours pattern"));

/// Any non-zero tutorial component, e.g. `3-1-0`.
static TUTORIAL_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+-[1-9]+-\d+").expect("tutorial hours pattern"));

/// Rank for year labels the portal uses. Unknown labels sort last.
const YEAR_RANKS: &[(&str, u32)] = &[
    ("First", 1),
    ("Second", 2),
    ("Third", 3),
    ("Fourth", 4),
    ("Fifth", 5),
];
const UNKNOWN_YEAR_RANK: u32 = 99;

/// Infers the session type from the subject name and LTP code. Priority order:
/// lab subject, practical hours, tutorial subject, tutorial hours, otherwise lecture.
pub fn infer_type(ltp: Option<&str>, subject: Option<&str>) -> ClassType {
    let ltp = ltp.unwrap_or_default().to_lowercase();
    let subject = subject.unwrap_or_default().to_lowercase();

    if subject.contains("lab") {
        return ClassType::Lab;
    }
    if ltp.contains("0-0-") || PRACTICAL_HOURS.is_match(&ltp) {
        return ClassType::Lab;
    }
    if subject.contains("tutorial") {
        return ClassType::Tutorial;
    }
    if TUTORIAL_HOURS.is_match(&ltp) {
        return ClassType::Tutorial;
    }
    ClassType::Lecture
}

pub fn year_rank(label: &str) -> u32 {
    YEAR_RANKS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNKNOWN_YEAR_RANK)
}

/// Collapses duplicates (first occurrence kept) and stable-sorts by rank.
pub fn order_years<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut years: Vec<String> = labels
        .into_iter()
        .map(Into::into)
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect();
    years.sort_by_key(|l| year_rank(l));
    years
}

/// Lexicographic order without duplicates.
pub fn order_batches<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut batches: Vec<String> = labels
        .into_iter()
        .map(Into::into)
        .filter(|l| !l.is_empty())
        .collect();
    batches.sort();
    batches.dedup();
    batches
}
