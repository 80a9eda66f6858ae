use thiserror::Error;

/// Everything that can go wrong between a captured image and a stored
/// analysis. Handlers never leak the raw transport error; they expose
/// `category()` plus `user_message()` and keep the detail for logs.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("image could not be read: {0}")]
    Encoding(String),

    #[error("attempt failed: {0}")]
    Transport(String),

    #[error("model returned no usable text")]
    EmptyGeneration,

    #[error("gave up after {attempts} attempts, last error: {last}")]
    NetworkExhausted { attempts: u32, last: Box<AnalysisError> },

    #[error("response payload rejected: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Transient faults only. A malformed payload would come back
    /// byte-identical on retry, and an unreadable image never changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::EmptyGeneration)
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "encoding",
            Self::Transport(_) => "transport",
            Self::EmptyGeneration => "empty_generation",
            Self::NetworkExhausted { .. } => "network_exhausted",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Generic product copy shown to the user; classification stays internal.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "Image illisible. Reprenez la photo.",
            Self::MalformedResponse(_) => "Analyse impossible. Réessayez.",
            _ => "Erreur réseau. Réessayez.",
        }
    }
}
