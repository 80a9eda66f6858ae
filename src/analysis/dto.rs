use serde::{Deserialize, Serialize};

use crate::analysis::session::{Phase, Session};
use crate::analysis::types::AnalysisResult;
use crate::error::AnalysisError;

#[derive(Debug, Deserialize)]
pub struct CaptureBase64 {
    pub image_b64: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub category: &'static str,
    pub message: &'static str,
}

impl From<&AnalysisError> for ErrorView {
    fn from(err: &AnalysisError) -> Self {
        Self {
            category: err.category(),
            message: err.user_message(),
        }
    }
}

/// Read-only projection of the current session for the display layer.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            phase: session.phase(),
            result: session.result().cloned(),
            error: session.error().map(ErrorView::from),
        }
    }
}
