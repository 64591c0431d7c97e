//! MCP `chat` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{deserialize_history, ConversationTurn};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatParams {
    #[schemars(description = "The question to answer from customer feedback")]
    pub message: String,

    /// Earlier turns, oldest first. Only the most recent ones reach the model,
    /// and turns with an unknown role are dropped.
    #[serde(default, deserialize_with = "deserialize_history")]
    #[schemars(with = "Option<Vec<ConversationTurn>>")]
    #[schemars(description = "Earlier conversation turns, oldest first")]
    pub conversation_history: Vec<ConversationTurn>,

    #[schemars(description = "Window start, RFC 3339 or YYYY-MM-DD (optional)")]
    pub start_date: Option<String>,

    #[schemars(description = "Window end, RFC 3339 or YYYY-MM-DD (optional)")]
    pub end_date: Option<String>,
}
