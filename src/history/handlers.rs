use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;

use super::dto::HistoryListItem;
use super::store::HistoryEntry;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:id", get(get_history_entry))
}

#[instrument(skip(state))]
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryListItem>> {
    let items = state
        .history
        .snapshot()
        .await
        .iter()
        .map(HistoryListItem::from)
        .collect();
    Json(items)
}

#[instrument(skip(state))]
pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, (StatusCode, String)> {
    match state.history.get(id).await {
        Some(entry) => Ok(Json(entry)),
        None => Err((StatusCode::NOT_FOUND, "History entry not found".into())),
    }
}
