pub mod chat;
pub mod compare_sentiment;
pub mod fetch_recent_posts;
pub mod map_markers;
pub mod metrics;
pub mod search_sentiment;
pub mod sentiment_summary;
pub mod trending_topics;

use chat::ChatParams;
use compare_sentiment::CompareSentimentParams;
use fetch_recent_posts::FetchRecentPostsParams;
use map_markers::MapMarkersParams;
use metrics::MetricsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_sentiment::SearchSentimentParams;
use sentiment_summary::SentimentSummaryParams;
use serde::Serialize;
use trending_topics::TrendingTopicsParams;

use crate::analytics::Analytics;
use crate::pipeline::SentimentService;
use crate::rpc::dates::window_from_strings;

/// The T-Time MCP tool handler. Wraps the pipeline service and analytics and
/// exposes them via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct SentimentTools {
    tool_router: ToolRouter<Self>,
    service: SentimentService,
    analytics: Analytics,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl SentimentTools {
    pub fn new(service: SentimentService, analytics: Analytics) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
            analytics,
        }
    }

    #[tool(description = "Find map locations that recent customer feedback associates with a topic. Returns [{name, coordinates: [lng, lat]}].")]
    async fn get_map_markers(
        &self,
        Parameters(params): Parameters<MapMarkersParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, "get_map_markers called");
        to_json(&self.service.map_markers(&params.query).await)
    }

    #[tool(description = "Answer a question about customer sentiment, grounded in retrieved feedback. Optional date window and prior conversation.")]
    async fn chat(&self, Parameters(params): Parameters<ChatParams>) -> Result<String, String> {
        if params.message.trim().is_empty() {
            return Err("message must not be empty".into());
        }
        let window = window_from_strings(
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            self.service.retrieval().default_days_back,
        );
        let history = params.conversation_history;
        tracing::info!(history = history.len(), "chat called");
        let response = self.service.chat(&params.message, &history, window).await;
        to_json(&serde_json::json!({ "response": response }))
    }

    #[tool(description = "Dashboard metrics (happiness index, sentiment percentages, response time, resolution rate) for a date window.")]
    async fn get_metrics(
        &self,
        Parameters(params): Parameters<MetricsParams>,
    ) -> Result<String, String> {
        let window = window_from_strings(
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            self.service.retrieval().default_days_back,
        );
        tracing::info!(?window, "get_metrics called");
        to_json(&self.service.metrics(window).await)
    }

    #[tool(description = "Semantic search across customer feedback from Reddit, Threads, Consumer Affairs and PissedConsumer. Returns the most relevant posts.")]
    async fn search_sentiment(
        &self,
        Parameters(params): Parameters<SearchSentimentParams>,
    ) -> Result<String, String> {
        let results = self
            .analytics
            .search(&params.into())
            .await
            .map_err(|e| format!("search failed: {e:#}"))?;
        to_json(&results)
    }

    #[tool(description = "Recent posts and comments with platform, sentiment, type and recency filters, sorted by time, sentiment strength or upvotes.")]
    async fn fetch_recent_posts(
        &self,
        Parameters(params): Parameters<FetchRecentPostsParams>,
    ) -> Result<String, String> {
        let posts = self
            .analytics
            .recent_posts(&params.into())
            .await
            .map_err(|e| format!("fetch failed: {e:#}"))?;
        to_json(&posts)
    }

    #[tool(description = "Aggregated sentiment statistics: totals, positive/negative percentages, average score and a per-platform breakdown.")]
    async fn get_sentiment_summary(
        &self,
        Parameters(params): Parameters<SentimentSummaryParams>,
    ) -> Result<String, String> {
        let summary = self
            .analytics
            .summary(params.platform.as_deref(), params.timeframe_days.unwrap_or(30))
            .await
            .map_err(|e| format!("summary failed: {e:#}"))?;
        to_json(&summary)
    }

    #[tool(description = "Trending keywords in recent feedback with mention counts and average sentiment.")]
    async fn get_trending_topics(
        &self,
        Parameters(params): Parameters<TrendingTopicsParams>,
    ) -> Result<String, String> {
        let report = self
            .analytics
            .trending(
                params.platform.as_deref(),
                params.timeframe_days.unwrap_or(7),
                params.min_mentions.unwrap_or(3),
            )
            .await
            .map_err(|e| format!("trending failed: {e:#}"))?;
        to_json(&report)
    }

    #[tool(description = "Compare sentiment in the most recent period with the period before it. Reports improving, declining or stable.")]
    async fn compare_sentiment(
        &self,
        Parameters(params): Parameters<CompareSentimentParams>,
    ) -> Result<String, String> {
        let comparison = self
            .analytics
            .compare(
                params.platform.as_deref(),
                params.recent_days.unwrap_or(7),
                params.previous_days.unwrap_or(7),
            )
            .await
            .map_err(|e| format!("compare failed: {e:#}"))?;
        to_json(&comparison)
    }
}

#[tool_handler]
impl ServerHandler for SentimentTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "T-Time customer sentiment server. Use chat to ask questions about feedback, \
                 get_metrics for dashboard numbers, search_sentiment or fetch_recent_posts \
                 to find posts, \
                 get_sentiment_summary or get_trending_topics for aggregates, and \
                 compare_sentiment for period-over-period change."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
