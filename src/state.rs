use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::analysis::client::RetryPolicy;
use crate::analysis::session::Session;
use crate::analysis::transport::{GeminiTransport, ModelTransport};
use crate::config::AppConfig;
use crate::history::store::{HistoryEntry, HistoryStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub transport: Arc<dyn ModelTransport>,
    pub session: Arc<Mutex<Session>>,
    pub history: Arc<HistoryStore>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let transport =
            Arc::new(GeminiTransport::new(&config.gemini)?) as Arc<dyn ModelTransport>;
        Ok(Self::from_parts(config, transport, Vec::new()))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        transport: Arc<dyn ModelTransport>,
        seed: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            config,
            transport,
            session: Arc::new(Mutex::new(Session::new())),
            history: Arc::new(HistoryStore::new(seed)),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.gemini.max_attempts,
            base_delay: Duration::from_millis(self.config.gemini.base_delay_ms),
        }
    }

    #[cfg(test)]
    pub fn fake(transport: Arc<dyn ModelTransport>) -> Self {
        use crate::config::GeminiConfig;

        let config = Arc::new(AppConfig {
            gemini: GeminiConfig {
                api_key: "test".into(),
                model: "test-model".into(),
                base_url: "https://fake.local/v1beta".into(),
                max_attempts: 5,
                base_delay_ms: 1000,
                timeout_secs: 5,
            },
        });
        Self::from_parts(config, transport, Vec::new())
    }
}
