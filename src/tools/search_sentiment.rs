//! MCP `search_sentiment` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::SearchQuery;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchSentimentParams {
    #[schemars(description = "Natural language search query, e.g. 'network coverage issues'")]
    pub query: String,

    #[schemars(description = "Filter by platform: 'reddit', 'threads', 'consumer-affairs', 'pissedconsumer' or 'all'")]
    pub platform: Option<String>,

    #[schemars(description = "Limit to posts from the last N days (optional)")]
    pub timeframe_days: Option<u32>,

    #[schemars(description = "Filter by sentiment: 'positive' or 'negative'")]
    pub sentiment_filter: Option<String>,

    /// Maximum number of results (1-50). Defaults to 10.
    #[schemars(description = "Maximum number of results to return (1-50). Defaults to 10.")]
    pub limit: Option<usize>,
}

impl From<SearchSentimentParams> for SearchQuery {
    fn from(params: SearchSentimentParams) -> Self {
        Self {
            query: params.query,
            platform: params.platform,
            sentiment: params.sentiment_filter,
            timeframe_days: params.timeframe_days,
            limit: params.limit,
        }
    }
}
