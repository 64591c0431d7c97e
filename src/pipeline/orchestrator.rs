//! The three user-facing operations.
//!
//! Each one runs embed → windowed retrieval → generate → extract in sequence.
//! The `try_*` methods surface the failing stage; the public methods log it and
//! return the fixed default so callers always get a well-formed payload.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::{PipelineError, PipelineResult};
use crate::generative::GenerativeClient;
use crate::types::{ConversationTurn, FeedbackRecord, LocationMarker, MetricsSnapshot};
use crate::vector::VectorIndex;

use super::window::{filter_to_range, retrieve_in_window, QueryWindow};
use super::{defaults, extract, prompt};

#[derive(Clone)]
pub struct SentimentService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn GenerativeClient>,
    retrieval: RetrievalConfig,
}

impl SentimentService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn GenerativeClient>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            retrieval,
        }
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// The default relative window (`retrieval.default_days_back`).
    pub fn default_window(&self) -> QueryWindow {
        QueryWindow::LastDays(self.retrieval.default_days_back)
    }

    /// Locations the feedback associates with `query`.
    pub async fn map_markers(&self, query: &str) -> Vec<LocationMarker> {
        match self.try_map_markers(query).await {
            Ok(markers) => markers,
            Err(e) => {
                tracing::warn!(error = %e, query, "marker discovery failed, using default cities");
                defaults::default_markers()
            }
        }
    }

    pub async fn try_map_markers(&self, query: &str) -> PipelineResult<Vec<LocationMarker>> {
        let records = self
            .retrieve(query, self.retrieval.marker_top_k, self.default_window())
            .await?;
        let text = self.generate(&prompt::marker_prompt(query, &records)).await?;
        let markers = extract::extract_markers(&text, &records);
        tracing::info!(query, records = records.len(), markers = markers.len(), "map markers");
        Ok(markers)
    }

    /// Answer `message` grounded in feedback from `window`.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
        window: QueryWindow,
    ) -> String {
        match self.try_chat(message, history, window).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "chat failed, returning apology");
                defaults::apology(message)
            }
        }
    }

    pub async fn try_chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
        window: QueryWindow,
    ) -> PipelineResult<String> {
        let mut records = self
            .retrieve(message, self.retrieval.chat_top_k, window)
            .await?;
        if let QueryWindow::Between(range) = window {
            records = filter_to_range(records, range);
        }

        let prompt =
            prompt::chat_prompt(message, history, self.retrieval.history_turns, &records);
        let text = self.generate(&prompt).await?;
        let answer = text.trim();
        if answer.is_empty() {
            return Err(PipelineError::Generation(anyhow::anyhow!(
                "model returned an empty answer"
            )));
        }
        tracing::info!(records = records.len(), history = history.len(), "chat answered");
        Ok(answer.to_string())
    }

    /// The six dashboard metrics for `window`.
    pub async fn metrics(&self, window: QueryWindow) -> MetricsSnapshot {
        match self.try_metrics(window).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "metrics failed, returning zeroed snapshot");
                defaults::default_metrics()
            }
        }
    }

    pub async fn try_metrics(&self, window: QueryWindow) -> PipelineResult<MetricsSnapshot> {
        let query = self.retrieval.metrics_query.clone();
        let records = self
            .retrieve(&query, self.retrieval.metrics_top_k, window)
            .await?;
        let text = self.generate(&prompt::metrics_prompt(&records)).await?;
        let snapshot = extract::extract_metrics(&text, &records);
        tracing::info!(records = records.len(), "metrics computed");
        Ok(snapshot)
    }

    async fn retrieve(
        &self,
        text: &str,
        top_k: usize,
        window: QueryWindow,
    ) -> PipelineResult<Vec<FeedbackRecord>> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(PipelineError::Embedding)?;
        let range = window.resolve(chrono::Utc::now().timestamp());
        Ok(retrieve_in_window(self.index.as_ref(), &vector, top_k, range).await)
    }

    async fn generate(&self, prompt: &str) -> PipelineResult<String> {
        tracing::debug!(model = self.llm.model(), chars = prompt.len(), "generating");
        self.llm
            .generate(prompt)
            .await
            .map_err(PipelineError::Generation)
    }
}
