use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::analysis::schema::GenerateContentRequest;
use crate::analysis::transport::ModelTransport;
use crate::analysis::types::AnalysisResult;
use crate::error::AnalysisError;

/// Bounded pure-exponential backoff: `base_delay * 2^attempt`, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Decide the wait before the next attempt. `attempt` is zero-based:
    /// the attempt that just failed. `None` means give up, because the
    /// error class is not transient or the budget is spent.
    pub fn next_delay(&self, attempt: u32, error: &AnalysisError) -> Option<Duration> {
        if !error.is_retryable() {
            return None;
        }
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        // An oversized configured budget caps the delay instead of
        // overflowing the doubling factor.
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor))
    }
}

/// Drives one request to a terminal outcome: retries transient faults under
/// the policy, extracts the generated text from the envelope and validates
/// the structured payload.
pub struct AnalysisClient {
    transport: Arc<dyn ModelTransport>,
    policy: RetryPolicy,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn ModelTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub async fn execute(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt_once(request).await {
                Ok(result) => {
                    debug!(attempt, "analysis succeeded");
                    return Ok(result);
                }
                // A syntactically broken payload will not be fixed by
                // resending the same request.
                Err(err @ AnalysisError::MalformedResponse(_)) => return Err(err),
                Err(err) => match self.policy.next_delay(attempt, &err) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(AnalysisError::NetworkExhausted {
                            attempts: attempt + 1,
                            last: Box::new(err),
                        })
                    }
                },
            }
        }
    }

    async fn attempt_once(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let envelope = self
            .transport
            .generate(request)
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        // An empty generation is indistinguishable from a transient fault.
        let text = envelope
            .generated_text()
            .ok_or(AnalysisError::EmptyGeneration)?;

        parse_result(text)
    }
}

/// Text payload -> validated `AnalysisResult`. Failures here are terminal.
fn parse_result(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let result: AnalysisResult = serde_json::from_str(text)
        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    result.validate()?;
    Ok(result)
}
