use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, instrument};

use crate::analysis::client::AnalysisClient;
use crate::analysis::dto::SessionView;
use crate::analysis::encoder;
use crate::analysis::schema::{build_request, ANALYSIS_PROMPT};
use crate::analysis::session::StartAnalysis;
use crate::history::store::HistoryEntry;
use crate::state::AppState;

/// Encode the uploaded bytes and reset the session around them. An image
/// that cannot be read parks the session in `failed` instead of erroring
/// the request.
#[instrument(skip(state, bytes), fields(len = bytes.len()))]
pub async fn capture_image(state: &AppState, bytes: Bytes) -> SessionView {
    let encoded = encoder::encode_image(&bytes);
    if let Err(e) = &encoded {
        error!(error = %e, "image encoding failed");
    }
    let mut session = state.session.lock().await;
    session.begin_capture(encoded);
    SessionView::from(&*session)
}

pub enum AnalyzeOutcome {
    /// Ran to a terminal phase; the view reflects it.
    Completed(SessionView),
    /// Nothing captured yet; analyze is a no-op.
    NoImage(SessionView),
    /// Another analysis is in flight.
    Busy,
}

/// Drive one analysis to its terminal state. The session lock is never held
/// across the network call; the attempt tag decides afterwards whether the
/// outcome still belongs to the current session.
#[instrument(skip(state))]
pub async fn run_analysis(state: &AppState) -> AnalyzeOutcome {
    let (attempt, image) = {
        let mut session = state.session.lock().await;
        match session.start_analysis() {
            StartAnalysis::Started { attempt, image } => (attempt, image),
            StartAnalysis::NoImage => {
                return AnalyzeOutcome::NoImage(SessionView::from(&*session))
            }
            StartAnalysis::Busy => return AnalyzeOutcome::Busy,
        }
    };

    let request = build_request(ANALYSIS_PROMPT, &image.payload);
    let client = AnalysisClient::new(Arc::clone(&state.transport), state.retry_policy());
    let outcome = client.execute(&request).await;

    let mut session = state.session.lock().await;
    match outcome {
        Ok(result) => {
            if session.complete(attempt, result.clone()) {
                let entry = HistoryEntry::from_result(result, Some(image.data_url));
                info!(entry_id = %entry.id, "analysis stored to history");
                state.history.prepend(entry).await;
            } else {
                info!(%attempt, "stale analysis result discarded");
            }
        }
        Err(e) => {
            if session.fail(attempt, e.clone()) {
                error!(error = %e, category = e.category(), "analysis failed");
            } else {
                info!(%attempt, "stale analysis error discarded");
            }
        }
    }
    AnalyzeOutcome::Completed(SessionView::from(&*session))
}

pub async fn session_view(state: &AppState) -> SessionView {
    let session = state.session.lock().await;
    SessionView::from(&*session)
}

pub async fn dismiss(state: &AppState) -> SessionView {
    let mut session = state.session.lock().await;
    session.dismiss();
    SessionView::from(&*session)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::async_trait;

    use super::*;
    use crate::analysis::client::tests::{ScriptedTransport, BANANA_JSON};
    use crate::analysis::encoder::tests::png_fixture;
    use crate::analysis::schema::GenerateContentRequest;
    use crate::analysis::session::Phase;
    use crate::analysis::transport::{GenerateContentResponse, ModelTransport};
    use crate::state::AppState;

    fn scripted(script: Vec<anyhow::Result<GenerateContentResponse>>) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::new(script))
    }

    fn ok_banana() -> anyhow::Result<GenerateContentResponse> {
        Ok(GenerateContentResponse::from_text(BANANA_JSON))
    }

    fn http_500() -> anyhow::Result<GenerateContentResponse> {
        Err(anyhow::anyhow!("gemini returned 500 Internal Server Error"))
    }

    async fn completed(state: &AppState) -> SessionView {
        match run_analysis(state).await {
            AnalyzeOutcome::Completed(view) => view,
            AnalyzeOutcome::NoImage(_) => panic!("unexpected no-image outcome"),
            AnalyzeOutcome::Busy => panic!("unexpected busy outcome"),
        }
    }

    #[tokio::test]
    async fn first_call_success_stores_one_history_entry() {
        let transport = scripted(vec![ok_banana()]);
        let state = AppState::fake(transport.clone());

        capture_image(&state, Bytes::from(png_fixture())).await;
        let view = completed(&state).await;

        assert_eq!(view.phase, Phase::Succeeded);
        assert_eq!(transport.call_count(), 1);
        let entries = state.history.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result.total_calories, 80.0);
        assert_eq!(entries[0].display_name, "Banane");
        assert!(entries[0]
            .source_image
            .as_deref()
            .expect("image kept")
            .starts_with("data:image/png;base64,"));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_within_the_retry_budget() {
        let transport = scripted(vec![
            http_500(),
            http_500(),
            http_500(),
            http_500(),
            ok_banana(),
        ]);
        let state = AppState::fake(transport.clone());

        capture_image(&state, Bytes::from(png_fixture())).await;
        let view = completed(&state).await;

        assert_eq!(view.phase, Phase::Succeeded);
        assert_eq!(transport.call_count(), 5);
        assert_eq!(state.history.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_fails_the_session_and_skips_history() {
        let transport = scripted(vec![
            http_500(),
            http_500(),
            http_500(),
            http_500(),
            http_500(),
        ]);
        let state = AppState::fake(transport.clone());

        capture_image(&state, Bytes::from(png_fixture())).await;
        let view = completed(&state).await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(transport.call_count(), 5);
        let error = view.error.expect("error view");
        assert_eq!(error.category, "network_exhausted");
        assert_eq!(error.message, "Erreur réseau. Réessayez.");
        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn malformed_payload_fails_without_touching_history() {
        let transport = scripted(vec![Ok(GenerateContentResponse::from_text(
            "{\"foods\":[],\"totalCalories\":0,\"healthScore\":3,\
             \"healthLabel\":\"\",\"analysis\":\"\",\"recommendation\":\"\"}",
        ))]);
        let state = AppState::fake(transport.clone());

        capture_image(&state, Bytes::from(png_fixture())).await;
        let view = completed(&state).await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(view.error.expect("error view").category, "malformed_response");
        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn analyze_without_capture_is_a_noop() {
        let state = AppState::fake(scripted(vec![ok_banana()]));
        match run_analysis(&state).await {
            AnalyzeOutcome::NoImage(view) => assert_eq!(view.phase, Phase::Idle),
            _ => panic!("expected no-image outcome"),
        }
        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn history_preserves_completion_order() {
        let first = BANANA_JSON;
        let second = first.replace("Banane", "Pizza");
        let transport = scripted(vec![
            Ok(GenerateContentResponse::from_text(first)),
            Ok(GenerateContentResponse::from_text(second)),
        ]);
        let state = AppState::fake(transport);

        for _ in 0..2 {
            capture_image(&state, Bytes::from(png_fixture())).await;
            completed(&state).await;
        }

        let entries = state.history.snapshot().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name, "Pizza");
        assert_eq!(entries[1].display_name, "Banane");
    }

    /// Transport that parks until time advances, so a capture can overtake
    /// the in-flight analysis.
    struct SlowTransport {
        delay: Duration,
    }

    #[async_trait]
    impl ModelTransport for SlowTransport {
        async fn generate(
            &self,
            _request: &GenerateContentRequest,
        ) -> anyhow::Result<GenerateContentResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(GenerateContentResponse::from_text(BANANA_JSON))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_neither_flips_the_session_nor_appends_history() {
        let state = AppState::fake(Arc::new(SlowTransport {
            delay: Duration::from_secs(10),
        }));

        capture_image(&state, Bytes::from(png_fixture())).await;
        let state_bg = state.clone();
        let in_flight = tokio::spawn(async move { run_analysis(&state_bg).await });
        tokio::task::yield_now().await;

        // New capture abandons the in-flight attempt.
        let view = capture_image(&state, Bytes::from(png_fixture())).await;
        assert_eq!(view.phase, Phase::Capturing);

        match in_flight.await.expect("task joins") {
            AnalyzeOutcome::Completed(view) => assert_eq!(view.phase, Phase::Capturing),
            _ => panic!("expected completed outcome"),
        }
        assert_eq!(state.history.len().await, 0);
        assert_eq!(session_view(&state).await.phase, Phase::Capturing);
    }
}
