//! MCP `get_metrics` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct MetricsParams {
    #[schemars(description = "Window start, RFC 3339 or YYYY-MM-DD (optional, defaults to the last 7 days)")]
    pub start_date: Option<String>,

    #[schemars(description = "Window end, RFC 3339 or YYYY-MM-DD (optional)")]
    pub end_date: Option<String>,
}
