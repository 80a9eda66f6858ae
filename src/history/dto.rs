use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::history::store::HistoryEntry;

/// Compact row for the history list; the full entry is fetched by id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryListItem {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub display_name: String,
    pub total_calories: f64,
    pub health_score: f64,
    pub health_label: String,
}

impl From<&HistoryEntry> for HistoryListItem {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            recorded_at: entry.recorded_at,
            display_name: entry.display_name.clone(),
            total_calories: entry.result.total_calories,
            health_score: entry.result.health_score,
            health_label: entry.result.health_label.clone(),
        }
    }
}
