use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use tracing::instrument;

use crate::state::AppState;

use super::dto::{CaptureBase64, SessionView};
use super::services::{self, AnalyzeOutcome};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/capture", post(capture_multipart))
        .route("/capture/base64", post(capture_base64))
        .route("/analyze", post(analyze))
        .route("/dismiss", post(dismiss))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(services::session_view(&state).await)
}

/// POST /capture (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn capture_multipart(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let mut bytes = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            bytes = Some(field.bytes().await.map_err(bad_request)?);
        }
    }
    let Some(bytes) = bytes else {
        return Err((StatusCode::BAD_REQUEST, "file field is required".into()));
    };

    Ok(Json(services::capture_image(&state, bytes).await))
}

/// POST /capture/base64 { "image_b64": "..." }
#[instrument(skip(state, body))]
pub async fn capture_base64(
    State(state): State<AppState>,
    Json(body): Json<CaptureBase64>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let bytes = general_purpose::STANDARD
        .decode(body.image_b64.as_bytes())
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid base64".to_string()))?;

    Ok(Json(services::capture_image(&state, Bytes::from(bytes)).await))
}

/// POST /analyze: runs the pending capture to a terminal state.
#[instrument(skip(state))]
pub async fn analyze(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    match services::run_analysis(&state).await {
        AnalyzeOutcome::Completed(view) | AnalyzeOutcome::NoImage(view) => Ok(Json(view)),
        AnalyzeOutcome::Busy => Err((
            StatusCode::CONFLICT,
            "an analysis is already in flight".into(),
        )),
    }
}

#[instrument(skip(state))]
pub async fn dismiss(State(state): State<AppState>) -> Json<SessionView> {
    Json(services::dismiss(&state).await)
}

fn bad_request<E: std::error::Error>(e: E) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}
