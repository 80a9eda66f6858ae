use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::types::AnalysisResult;

/// A completed analysis as the history keeps it: the result plus identity,
/// a timestamp and the display image. Never mutated after insertion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl HistoryEntry {
    /// "Repas" only covers the theoretical empty-foods case; validation
    /// rejects such results before they can get here.
    pub fn from_result(result: AnalysisResult, source_image: Option<String>) -> Self {
        let display_name = result
            .foods
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "Repas".to_string());
        Self {
            id: Uuid::new_v4(),
            recorded_at: OffsetDateTime::now_utc(),
            display_name,
            source_image,
            result,
        }
    }
}

/// Ordered log of past analyses, most recent first. Insertion prepends;
/// nothing reorders, dedupes or deletes. Readers get snapshots.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    pub fn new(seed: Vec<HistoryEntry>) -> Self {
        Self {
            entries: RwLock::new(seed),
        }
    }

    pub async fn prepend(&self, entry: HistoryEntry) {
        self.entries.write().await.insert(0, entry);
    }

    pub async fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<HistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
