//! Routes and middleware (CORS, request tracing).

use super::handlers;
use crate::usecases::TimetableService;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TimetableService>,
}

impl AppState {
    pub fn new(service: Arc<TimetableService>) -> Self {
        Self { service }
    }
}

pub fn create_router(state: AppState) -> Router {
    // Browser clients call from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/resolve-options", post(handlers::resolve_options))
        .route("/fetch-timetable", post(handlers::fetch_timetable))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
