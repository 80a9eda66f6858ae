use serde::Serialize;
use uuid::Uuid;

use crate::analysis::encoder::EncodedImage;
use crate::analysis::types::AnalysisResult;
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Capturing,
    Analyzing,
    Succeeded,
    Failed,
}

/// Outcome of asking the session to start an analysis.
#[derive(Debug)]
pub enum StartAnalysis {
    /// Proceed with this attempt tag and image; the session is `Analyzing`.
    Started { attempt: Uuid, image: EncodedImage },
    /// No captured image is pending; the request is a no-op.
    NoImage,
    /// An analysis is already in flight; reject, never queue.
    Busy,
}

/// One capture-through-result lifecycle. `id` doubles as the attempt tag:
/// any result or error carrying a stale id is silently discarded, so an
/// abandoned in-flight request can never touch a newer session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    phase: Phase,
    image: Option<EncodedImage>,
    result: Option<AnalysisResult>,
    error: Option<AnalysisError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Idle,
            image: None,
            result: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.error.as_ref()
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// A new capture replaces whatever came before, including an analysis
    /// still in flight. An image that failed to encode lands in `Failed`.
    pub fn begin_capture(&mut self, encoded: Result<EncodedImage, AnalysisError>) {
        self.id = Uuid::new_v4();
        self.result = None;
        match encoded {
            Ok(image) => {
                self.image = Some(image);
                self.error = None;
                self.phase = Phase::Capturing;
            }
            Err(err) => {
                self.image = None;
                self.error = Some(err);
                self.phase = Phase::Failed;
            }
        }
    }

    pub fn start_analysis(&mut self) -> StartAnalysis {
        if self.phase == Phase::Analyzing {
            return StartAnalysis::Busy;
        }
        if self.phase != Phase::Capturing {
            return StartAnalysis::NoImage;
        }
        match &self.image {
            Some(image) => {
                self.phase = Phase::Analyzing;
                StartAnalysis::Started {
                    attempt: self.id,
                    image: image.clone(),
                }
            }
            None => StartAnalysis::NoImage,
        }
    }

    /// Apply a successful result. Returns false (and changes nothing) when
    /// the attempt tag is stale or the session already left `Analyzing`.
    pub fn complete(&mut self, attempt: Uuid, result: AnalysisResult) -> bool {
        if attempt != self.id || self.phase != Phase::Analyzing {
            return false;
        }
        self.result = Some(result);
        self.error = None;
        self.phase = Phase::Succeeded;
        true
    }

    pub fn fail(&mut self, attempt: Uuid, error: AnalysisError) -> bool {
        if attempt != self.id || self.phase != Phase::Analyzing {
            return false;
        }
        self.error = Some(error);
        self.phase = Phase::Failed;
        true
    }

    pub fn dismiss(&mut self) {
        *self = Self::new();
    }
}
