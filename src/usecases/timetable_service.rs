//! The two operations exposed to the surrounding application:
//! `resolveOptions` and `fetchTimetable`.
//!
//! Validates requests and shapes fail-soft responses. Missing parameters and
//! unknown actions are errors for the caller; anything the portal does wrong
//! degrades to an empty result.

use crate::domain::{Cohort, DomainError, ScheduleSource, WeeklySchedule};
use crate::ports::{OptionsPort, TimetablePort};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Shown instead of any upstream error text.
pub const CONNECT_ERROR: &str = "Could not connect to the timetable portal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsAction {
    GetYears,
    GetBatches,
}

impl OptionsAction {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "getYears" => Ok(Self::GetYears),
            "getBatches" => Ok(Self::GetBatches),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsRequest {
    #[serde(default, deserialize_with = "text_or_number")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsResponse {
    pub success: bool,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimetableRequest {
    #[serde(default, deserialize_with = "text_or_number")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub batch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableResponse {
    pub success: bool,
    pub classes: WeeklySchedule,
    pub source: ScheduleSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Request fields arrive as text or as bare numbers (`"year": 2`).
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected text, got {other}"))),
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, DomainError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(DomainError::MissingParameter(name))
}

pub struct TimetableService {
    options: Arc<dyn OptionsPort>,
    timetable: Arc<dyn TimetablePort>,
}

impl TimetableService {
    pub fn new(options: Arc<dyn OptionsPort>, timetable: Arc<dyn TimetablePort>) -> Self {
        Self { options, timetable }
    }

    pub async fn resolve_options(
        &self,
        request: &OptionsRequest,
    ) -> Result<OptionsResponse, DomainError> {
        let action = OptionsAction::parse(required(&request.action, "action")?)?;
        let degree = required(&request.degree, "degree")?;
        info!(?action, degree, year = ?request.year, "resolve options");

        let result = match action {
            OptionsAction::GetYears => self.options.get_years(degree).await,
            OptionsAction::GetBatches => {
                self.options
                    .get_batches(degree, request.year.as_deref())
                    .await
            }
        };

        match result {
            Ok(options) => Ok(OptionsResponse {
                success: true,
                options,
                error: None,
            }),
            Err(e) if e.is_caller_error() => Err(e),
            Err(e) => {
                warn!(?action, degree, error = %e, "options unavailable");
                Ok(OptionsResponse {
                    success: false,
                    options: Vec::new(),
                    error: Some(CONNECT_ERROR.to_string()),
                })
            }
        }
    }

    pub async fn fetch_timetable(
        &self,
        request: &TimetableRequest,
    ) -> Result<TimetableResponse, DomainError> {
        let cohort = Cohort {
            degree: required(&request.degree, "degree")?.to_string(),
            year: required(&request.year, "year")?.to_string(),
            batch: required(&request.batch, "batch")?.to_string(),
        };
        let fetch = self.timetable.fetch_timetable(&cohort).await;
        // Fail-soft: connectivity is reported through `source` alone.
        Ok(TimetableResponse {
            success: true,
            classes: fetch.classes,
            source: fetch.source,
            degree: fetch.degree,
            year: fetch.year,
        })
    }
}
