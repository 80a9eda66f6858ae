use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use serde::Deserialize;

use crate::analysis::schema::GenerateContentRequest;
use crate::config::GeminiConfig;

/// One network attempt against the model, no retry logic. The retrying
/// client owns classification and backoff; tests swap in scripted fakes.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse>;
}

// --- response envelope ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, treating blank text the same
    /// as a missing part.
    pub fn generated_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![CandidatePart {
                        text: Some(text.into()),
                    }],
                }),
            }],
        }
    }
}

// --- live Gemini transport ---

pub struct GeminiTransport {
    http: reqwest::Client,
    // Holds the API key as a query parameter; never logged.
    url: String,
}

impl GeminiTransport {
    pub fn new(config: &GeminiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build gemini http client")?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            config.base_url.trim_end_matches('/'),
            config.model,
            config.api_key
        );
        Ok(Self { http, url })
    }
}

#[async_trait]
impl ModelTransport for GeminiTransport {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .context("gemini request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            anyhow::bail!("gemini returned {status}: {snippet}");
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("decode gemini envelope")
    }
}
