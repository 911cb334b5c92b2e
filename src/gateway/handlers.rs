use super::AppState;
use super::error::ApiError;
use crate::app::{StatsReport, collect_stats};
use crate::cache::Fingerprint;
use crate::game::{StartedSession, TurnOutcome};
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

/// POST /act request body
#[derive(Debug, Deserialize)]
pub struct ActBody {
    pub session_id: String,
    pub item: String,
    pub object: String,
}

/// Query of GET /image/{fingerprint}.png
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub session: Option<String>,
}

fn parse_fingerprint(raw: &str) -> Result<Fingerprint, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid fingerprint: {raw}")))
}

/// GET /health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /start: new session plus its opening turn
pub(super) async fn handle_start(
    State(state): State<AppState>,
) -> Result<Json<StartedSession>, ApiError> {
    let started = state.services.engine.start_session().await?;
    Ok(Json(started))
}

/// POST /act: guarded `use {item} on {object}`
pub(super) async fn handle_act(
    State(state): State<AppState>,
    body: Result<Json<ActBody>, JsonRejection>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if body.item.trim().is_empty() || body.object.trim().is_empty() {
        return Err(ApiError::bad_request("item and object are required"));
    }

    let outcome = state
        .services
        .engine
        .act(&body.session_id, &body.item, &body.object)
        .await?;
    Ok(Json(outcome))
}

/// GET /state/{session_id}
pub(super) async fn handle_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TurnOutcome>, ApiError> {
    Ok(Json(state.services.engine.snapshot(&session_id).await?))
}

/// GET /image/{fingerprint}.png?session=<id>: generated on first request
pub(super) async fn handle_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = file
        .strip_suffix(".png")
        .ok_or_else(|| ApiError::not_found(format!("no such image: {file}")))?;
    let fingerprint = parse_fingerprint(raw)?;

    let bytes = state
        .services
        .images
        .resolve(query.session.as_deref(), &fingerprint)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}

/// GET /api/continuations/{fingerprint}: cached raw narrator reply
pub(super) async fn handle_continuation(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let fingerprint = parse_fingerprint(&raw)?;
    let bytes = state
        .services
        .engine
        .narrator()
        .cache()
        .get(&fingerprint)
        .await?
        .ok_or_else(|| ApiError::not_found("Continuation not found"))?;

    Ok(Json(serde_json::json!({
        "fingerprint": fingerprint.as_str(),
        "response": String::from_utf8_lossy(&bytes),
    })))
}

/// GET /stats
pub(super) async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsReport>, ApiError> {
    Ok(Json(collect_stats(&state.services).await?))
}
