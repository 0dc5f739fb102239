//! HTTP request handlers.

use super::AppState;
use crate::db::{DbError, EndpointConfig};
use crate::monitor::{Window, WindowStats};
use crate::probe::parse_url;
use crate::report::collect_alerts;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

// ============================================================================
// API: Endpoints
// ============================================================================

pub async fn handle_get_endpoints(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.get_endpoints() {
        Ok(endpoints) => Json(endpoints).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn handle_get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.get_endpoint(id) {
        Ok(endpoint) => Json(endpoint).into_response(),
        Err(DbError::NotFound) => (StatusCode::NOT_FOUND, "Endpoint not found").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEndpointRequest {
    pub url: String,
    pub check_interval_secs: u32,
}

pub async fn handle_create_endpoint(
    State(state): State<AppState>,
    Json(req): Json<CreateEndpointRequest>,
) -> impl IntoResponse {
    if req.url.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "URL must not be empty").into_response();
    }
    if let Err(e) = parse_url(&req.url) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    if req.check_interval_secs == 0 {
        return (StatusCode::BAD_REQUEST, "Check interval must be positive").into_response();
    }

    let mut endpoint = EndpointConfig::new(req.url.trim(), req.check_interval_secs);
    match state.store.add_endpoint(&mut endpoint) {
        Ok(_) => {
            state.scheduler.add_endpoint(endpoint.clone()).await;
            (StatusCode::CREATED, Json(endpoint)).into_response()
        }
        Err(DbError::Duplicate(_)) => (StatusCode::CONFLICT, "Endpoint already monitored").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn handle_delete_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.delete_endpoint(id) {
        Ok(_) => {
            state.scheduler.remove_endpoint(id).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(DbError::NotFound) => (StatusCode::NOT_FOUND, "Endpoint not found").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ============================================================================
// API: Stats and alerts
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub window: Option<String>,
}

pub async fn handle_get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let window = match query.window.as_deref().map(str::parse::<Window>) {
        None => Window::Medium,
        Some(Ok(w)) => w,
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let mut stats: Vec<WindowStats> = Vec::new();
    for handle in state.scheduler.endpoints().await {
        stats.push(handle.read().await.stats(window));
    }

    Json(stats).into_response()
}

pub async fn handle_get_alerts(State(state): State<AppState>) -> impl IntoResponse {
    let endpoints = state.scheduler.endpoints().await;
    Json(collect_alerts(&endpoints).await)
}
