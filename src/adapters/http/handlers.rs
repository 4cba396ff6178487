//! HTTP handlers. Parse the JSON body and delegate to `TimetableService`.

use super::error::AppError;
use super::router::AppState;
use crate::usecases::{OptionsRequest, OptionsResponse, TimetableRequest, TimetableResponse};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Serialize;
use tracing::debug;

pub type HandlerResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        debug!(error = %rejection, "rejected request body");
        AppError::BadRequest("Invalid JSON body".to_string())
    })
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /resolve-options
pub async fn resolve_options(
    State(state): State<AppState>,
    payload: Result<Json<OptionsRequest>, JsonRejection>,
) -> HandlerResult<OptionsResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.resolve_options(&request).await?))
}

/// POST /fetch-timetable
pub async fn fetch_timetable(
    State(state): State<AppState>,
    payload: Result<Json<TimetableRequest>, JsonRejection>,
) -> HandlerResult<TimetableResponse> {
    let request = body(payload)?;
    Ok(Json(state.service.fetch_timetable(&request).await?))
}
