//! MCP `get_map_markers` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MapMarkersParams {
    /// Topic to locate, e.g. "dropped calls" or "billing complaints".
    #[schemars(description = "Topic to locate in recent feedback, e.g. 'dropped calls'")]
    pub query: String,
}
