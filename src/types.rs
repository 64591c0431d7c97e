//! Core data types shared by the pipeline and both RPC surfaces.
//!
//! [`FeedbackRecord`] is what the vector index hands back; [`LocationMarker`],
//! [`MetricsSnapshot`] and the chat reply are what callers receive.
//! [`ConversationTurn`] is caller-supplied chat history.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// One customer-feedback item returned by vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    /// Similarity to the query vector (higher is closer).
    pub score: f32,
    pub metadata: FeedbackMetadata,
}

/// Metadata stored alongside each feedback vector.
///
/// Field names follow the scraper output (`location_city`, `location_state`, ...);
/// the aliases accept the shorter spellings some indexes were loaded with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Unix seconds.
    #[serde(
        default,
        deserialize_with = "deserialize_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Score, likes or helpful votes, depending on the platform.
    #[serde(
        default,
        deserialize_with = "deserialize_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub upvotes: Option<i64>,
    /// The post's id on its own platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        rename = "location_country",
        alias = "country",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<String>,
    #[serde(
        default,
        rename = "location_state",
        alias = "location_region",
        alias = "region",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,
    #[serde(
        default,
        rename = "location_city",
        alias = "city",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
    #[serde(default, alias = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Pinecone returns every number as a float; truncate to a whole number.
fn deserialize_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).map(|n| n as i64))
}

impl FeedbackRecord {
    pub fn text(&self) -> &str {
        self.metadata.text.as_deref().unwrap_or("")
    }

    /// Human-readable place name, most specific part first: `"Austin, TX, USA"`.
    pub fn place_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.metadata.city, &self.metadata.region, &self.metadata.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// A named point on the dashboard map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMarker {
    pub name: String,
    /// `[longitude, latitude]`, GeoJSON order.
    pub coordinates: [f64; 2],
}

impl LocationMarker {
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: [longitude, latitude],
        }
    }
}

/// Direction of a metric relative to the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Metric {
    pub value: f64,
    pub change: f64,
    pub trend: Trend,
}

impl Metric {
    /// A metric with no period-over-period signal.
    pub fn flat(value: f64) -> Self {
        Self {
            value,
            change: 0.0,
            trend: Trend::Neutral,
        }
    }
}

/// The six dashboard metrics. Recomputed per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub happiness_index: Metric,
    pub positive_sentiment: Metric,
    pub negative_sentiment: Metric,
    pub neutral_sentiment: Metric,
    pub response_time: Metric,
    pub resolution_rate: Metric,
}

impl MetricsSnapshot {
    /// Wire names of the six metrics, in display order.
    pub const KEYS: [&'static str; 6] = [
        "happinessIndex",
        "positiveSentiment",
        "negativeSentiment",
        "neutralSentiment",
        "responseTime",
        "resolutionRate",
    ];

    /// Every metric zero with a neutral trend.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used when rendering history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConversationTurn {
    pub role: Role,
    #[serde(alias = "text")]
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller history, skipping turns that are not a user or assistant message
/// (a `system` turn, a missing `content`). `null` reads as no history.
pub fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<ConversationTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ConversationTurn>(value) {
            Ok(turn) => Some(turn),
            Err(e) => {
                tracing::debug!(error = %e, "dropping unusable history turn");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_accepts_float_timestamps_and_aliases() {
        let json = r#"{
            "text": "Coverage dropped downtown",
            "timestamp": 1717171717.0,
            "location_city": "Austin",
            "location_state": "TX",
            "location_country": "USA",
            "lat": 30.27,
            "lng": -97.74
        }"#;
        let meta: FeedbackMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.timestamp, Some(1_717_171_717));
        assert_eq!(meta.city.as_deref(), Some("Austin"));
        assert_eq!(meta.region.as_deref(), Some("TX"));
        assert_eq!(meta.latitude, Some(30.27));
        assert_eq!(meta.longitude, Some(-97.74));
    }

    #[test]
    fn metadata_reads_float_upvotes() {
        let meta: FeedbackMetadata =
            serde_json::from_str(r#"{"upvotes": 42.0, "source_identifier": "t3_abc"}"#).unwrap();
        assert_eq!(meta.upvotes, Some(42));
        assert_eq!(meta.source_identifier.as_deref(), Some("t3_abc"));
    }

    #[test]
    fn metadata_ignores_non_numeric_timestamp() {
        let meta: FeedbackMetadata =
            serde_json::from_str(r#"{"timestamp": "yesterday"}"#).unwrap();
        assert_eq!(meta.timestamp, None);
    }

    #[test]
    fn place_name_skips_missing_parts() {
        let record = FeedbackRecord {
            id: "r1".into(),
            score: 0.9,
            metadata: FeedbackMetadata {
                city: Some("Denver".into()),
                country: Some("USA".into()),
                ..Default::default()
            },
        };
        assert_eq!(record.place_name().as_deref(), Some("Denver, USA"));

        let bare = FeedbackRecord {
            id: "r2".into(),
            score: 0.5,
            metadata: FeedbackMetadata::default(),
        };
        assert_eq!(bare.place_name(), None);
    }

    #[test]
    fn metrics_snapshot_uses_camel_case_keys() {
        let value = serde_json::to_value(MetricsSnapshot::zeroed()).unwrap();
        let obj = value.as_object().unwrap();
        for key in MetricsSnapshot::KEYS {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(value["happinessIndex"]["trend"], "neutral");
    }

    #[test]
    fn conversation_turn_accepts_text_alias() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"role": "assistant", "text": "Hi there"}"#).unwrap();
        assert_eq!(turn, ConversationTurn::assistant("Hi there"));
    }

    #[derive(Deserialize)]
    struct WithHistory {
        #[serde(default, deserialize_with = "deserialize_history")]
        history: Vec<ConversationTurn>,
    }

    #[test]
    fn history_drops_unknown_roles() {
        let parsed: WithHistory = serde_json::from_str(
            r#"{"history": [
                {"role": "system", "content": "be terse"},
                {"role": "user", "content": "hi"},
                {"role": "assistant"},
                {"role": "assistant", "content": "hello"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.history,
            vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello")]
        );
    }

    #[test]
    fn null_or_missing_history_is_empty() {
        let null: WithHistory = serde_json::from_str(r#"{"history": null}"#).unwrap();
        assert!(null.history.is_empty());
        let missing: WithHistory = serde_json::from_str("{}").unwrap();
        assert!(missing.history.is_empty());
    }
}
