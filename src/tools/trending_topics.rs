//! MCP `get_trending_topics` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TrendingTopicsParams {
    #[schemars(description = "Filter by platform, or 'all'")]
    pub platform: Option<String>,

    #[schemars(description = "Number of days to analyze. Defaults to 7.")]
    pub timeframe_days: Option<u32>,

    #[schemars(description = "Minimum mentions for a keyword to count as trending. Defaults to 3.")]
    pub min_mentions: Option<usize>,
}
