//! MCP `fetch_recent_posts` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{PostSort, RecentPostsQuery};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FetchRecentPostsParams {
    #[schemars(description = "Filter by platform: 'reddit', 'threads', 'consumer-affairs', 'pissedconsumer' or 'all'")]
    pub platform: Option<String>,

    #[schemars(description = "Filter by sentiment: 'positive', 'negative' or 'all'")]
    pub sentiment: Option<String>,

    #[schemars(description = "Number of days to look back. Defaults to 7.")]
    pub timeframe_days: Option<u32>,

    #[schemars(description = "Filter by type: 'post', 'comment', 'reply' or 'review'. Omit for all.")]
    pub post_type: Option<String>,

    #[schemars(description = "Maximum number of posts to return (1-100). Defaults to 20.")]
    pub limit: Option<usize>,

    #[schemars(description = "'timestamp' (newest first), 'sentiment_score' (strongest first) or 'upvotes'")]
    pub sort_by: Option<PostSort>,
}

impl From<FetchRecentPostsParams> for RecentPostsQuery {
    fn from(params: FetchRecentPostsParams) -> Self {
        Self {
            platform: params.platform,
            sentiment: params.sentiment,
            post_type: params.post_type,
            timeframe_days: params.timeframe_days,
            limit: params.limit,
            sort_by: params.sort_by.unwrap_or_default(),
        }
    }
}
