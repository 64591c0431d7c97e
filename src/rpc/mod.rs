//! JSON RPC surface consumed by the dashboard.
//!
//! The three pipeline routes always answer 200 with a well-formed payload, even
//! for a missing or malformed body; the analytics routes report upstream
//! failures as 502 `{ "error": ... }`.

pub mod dates;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::analytics::{
    Analytics, PeriodComparison, RecentPosts, RecentPostsQuery, SearchQuery, SearchResults,
    SentimentSummary, TrendingReport,
};
use crate::pipeline::SentimentService;
use crate::types::{deserialize_history, ConversationTurn, LocationMarker, MetricsSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub service: SentimentService,
    pub analytics: Analytics,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/markers", post(markers))
        .route("/api/chat", post(chat))
        .route("/api/metrics", post(metrics))
        .route("/api/search", post(search))
        .route("/api/posts", post(posts))
        .route("/api/summary", post(summary))
        .route("/api/trending", post(trending))
        .route("/api/compare", post(compare))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkersRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Turns with an unknown role are dropped.
    #[serde(default, deserialize_with = "deserialize_history")]
    pub conversation_history: Vec<ConversationTurn>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub platform: Option<String>,
    #[serde(default = "default_summary_days", alias = "timeframe_days")]
    pub timeframe_days: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRequest {
    pub platform: Option<String>,
    #[serde(default = "default_trending_days", alias = "timeframe_days")]
    pub timeframe_days: u32,
    #[serde(default = "default_min_mentions", alias = "min_mentions")]
    pub min_mentions: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub platform: Option<String>,
    #[serde(default = "default_trending_days", alias = "recent_days", alias = "period1_days")]
    pub recent_days: u32,
    #[serde(default = "default_trending_days", alias = "previous_days", alias = "period2_days")]
    pub previous_days: u32,
}

fn default_summary_days() -> u32 {
    30
}

fn default_trending_days() -> u32 {
    7
}

fn default_min_mentions() -> usize {
    3
}

/// An upstream failure on an analytics route.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %format!("{:#}", self.0), "analytics request failed");
        let body = serde_json::json!({ "error": format!("{:#}", self.0) });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

/// Body for a pipeline route. An empty or unreadable body means "all defaults".
fn lenient_body<T: DeserializeOwned + Default>(route: &str, body: &Bytes) -> T {
    if body.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::warn!(route, error = %e, "malformed request body, using defaults");
        T::default()
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn markers(State(state): State<AppState>, body: Bytes) -> Json<Vec<LocationMarker>> {
    let request: MarkersRequest = lenient_body("markers", &body);
    Json(state.service.map_markers(&request.query).await)
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Json<ChatResponse> {
    let request: ChatRequest = lenient_body("chat", &body);
    let window = dates::window_from_strings(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        state.service.retrieval().default_days_back,
    );
    let response = state
        .service
        .chat(&request.message, &request.conversation_history, window)
        .await;
    Json(ChatResponse { response })
}

async fn metrics(State(state): State<AppState>, body: Bytes) -> Json<MetricsSnapshot> {
    let request: MetricsRequest = lenient_body("metrics", &body);
    let window = dates::window_from_strings(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        state.service.retrieval().default_days_back,
    );
    Json(state.service.metrics(window).await)
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    Ok(Json(state.analytics.search(&request).await?))
}

async fn posts(
    State(state): State<AppState>,
    Json(request): Json<RecentPostsQuery>,
) -> Result<Json<RecentPosts>, ApiError> {
    Ok(Json(state.analytics.recent_posts(&request).await?))
}

async fn summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SentimentSummary>, ApiError> {
    let summary = state
        .analytics
        .summary(request.platform.as_deref(), request.timeframe_days)
        .await?;
    Ok(Json(summary))
}

async fn trending(
    State(state): State<AppState>,
    Json(request): Json<TrendingRequest>,
) -> Result<Json<TrendingReport>, ApiError> {
    let report = state
        .analytics
        .trending(
            request.platform.as_deref(),
            request.timeframe_days,
            request.min_mentions,
        )
        .await?;
    Ok(Json(report))
}

async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<PeriodComparison>, ApiError> {
    let comparison = state
        .analytics
        .compare(
            request.platform.as_deref(),
            request.recent_days,
            request.previous_days,
        )
        .await?;
    Ok(Json(comparison))
}
