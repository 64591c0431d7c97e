//! MCP `get_sentiment_summary` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SentimentSummaryParams {
    #[schemars(description = "Filter by platform, or 'all'")]
    pub platform: Option<String>,

    /// Days to analyze. Defaults to 30.
    #[schemars(description = "Number of days to analyze. Defaults to 30.")]
    pub timeframe_days: Option<u32>,
}
