use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One recognised component of the plate. `name` and `calories` are the
/// only fields the model is required to fill; macros stay absent when the
/// model does not estimate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub portion: String,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

/// The structured payload the model must return, one per successful call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub foods: Vec<FoodItem>,
    pub total_calories: f64,
    pub health_score: f64,
    pub health_label: String,
    pub analysis: String,
    pub recommendation: String,
}

impl AnalysisResult {
    /// Invariants the response schema cannot express. A payload that fails
    /// here must never reach a succeeded session or the history.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.foods.is_empty() {
            return Err(AnalysisError::MalformedResponse(
                "foods must be a non-empty list".into(),
            ));
        }
        if !(0.0..=10.0).contains(&self.health_score) {
            return Err(AnalysisError::MalformedResponse(format!(
                "healthScore {} outside [0, 10]",
                self.health_score
            )));
        }
        Ok(())
    }
}
