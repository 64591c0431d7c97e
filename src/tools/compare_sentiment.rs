//! MCP `compare_sentiment` tool parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CompareSentimentParams {
    #[schemars(description = "Filter by platform, or 'all'")]
    pub platform: Option<String>,

    /// Also accepted as `period1_days`.
    #[serde(alias = "period1_days")]
    #[schemars(description = "Length of the recent period in days. Defaults to 7.")]
    pub recent_days: Option<u32>,

    /// Also accepted as `period2_days`.
    #[serde(alias = "period2_days")]
    #[schemars(description = "Length of the period before it in days. Defaults to 7.")]
    pub previous_days: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_names_are_accepted() {
        let params: CompareSentimentParams = serde_json::from_value(serde_json::json!({
            "platform": "reddit",
            "period1_days": 3,
            "period2_days": 14
        }))
        .unwrap();
        assert_eq!(params.recent_days, Some(3));
        assert_eq!(params.previous_days, Some(14));
    }

    #[test]
    fn periods_default_to_none() {
        let params: CompareSentimentParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(params.recent_days, None);
        assert_eq!(params.previous_days, None);
    }
}
