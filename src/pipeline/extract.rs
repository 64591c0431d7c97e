//! Recover structured output from free-form model text.
//!
//! Models wrap JSON in prose and code fences, so extraction grabs the widest
//! bracket or brace span and tries to parse it. When that fails the result is
//! computed from the retrieved records instead; extraction never errors.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{FeedbackRecord, LocationMarker, Metric, MetricsSnapshot};

static ARRAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"));
static OBJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"));

const POSITIVE_KEYWORDS: &[&str] = &[
    "great", "excellent", "amazing", "love", "good", "fast", "helpful", "best", "happy",
    "satisfied", "awesome", "fantastic", "reliable", "recommend",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "terrible", "awful", "bad", "worst", "hate", "slow", "poor", "horrible", "disappointed",
    "frustrated", "issue", "problem", "broken", "scam", "angry", "useless",
];

/// Hours. The records carry no response-time signal.
const PLACEHOLDER_RESPONSE_TIME: f64 = 2.5;
/// Percent. The records carry no resolution signal.
const PLACEHOLDER_RESOLUTION_RATE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Markers from model text, or from record coordinates when the text has none.
pub fn extract_markers(text: &str, records: &[FeedbackRecord]) -> Vec<LocationMarker> {
    match parse_markers(text) {
        Ok(markers) => markers,
        Err(e) => {
            tracing::debug!(error = %e, "marker extraction fell back to record geography");
            markers_from_records(records)
        }
    }
}

pub fn parse_markers(text: &str) -> PipelineResult<Vec<LocationMarker>> {
    let span = ARRAY_PATTERN
        .find(text)
        .ok_or_else(|| PipelineError::Extraction("no JSON array in response".into()))?;
    serde_json::from_str(span.as_str())
        .map_err(|e| PipelineError::Extraction(format!("marker array did not parse: {e}")))
}

/// Every record with both coordinates becomes a marker.
pub fn markers_from_records(records: &[FeedbackRecord]) -> Vec<LocationMarker> {
    records
        .iter()
        .filter_map(|r| {
            let (lat, lng) = (r.metadata.latitude?, r.metadata.longitude?);
            let name = r.place_name().unwrap_or_else(|| "Unknown".to_string());
            Some(LocationMarker::new(name, lng, lat))
        })
        .collect()
}

/// Metrics from model text, or from the keyword classifier when the text has none.
pub fn extract_metrics(text: &str, records: &[FeedbackRecord]) -> MetricsSnapshot {
    match parse_metrics(text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::debug!(error = %e, "metrics extraction fell back to keyword classifier");
            metrics_from_records(records)
        }
    }
}

pub fn parse_metrics(text: &str) -> PipelineResult<MetricsSnapshot> {
    let span = OBJECT_PATTERN
        .find(text)
        .ok_or_else(|| PipelineError::Extraction("no JSON object in response".into()))?;
    let value: serde_json::Value = serde_json::from_str(span.as_str())
        .map_err(|e| PipelineError::Extraction(format!("metrics object did not parse: {e}")))?;

    let missing: Vec<&str> = MetricsSnapshot::KEYS
        .iter()
        .copied()
        .filter(|key| value.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Extraction(format!(
            "metrics object missing {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| PipelineError::Extraction(format!("metrics object has wrong shape: {e}")))
}

/// Keyword classification. Mixed or keyword-free text is neutral.
pub fn classify(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_KEYWORDS.iter().any(|k| lower.contains(k));
    let negative = NEGATIVE_KEYWORDS.iter().any(|k| lower.contains(k));
    match (positive, negative) {
        (true, false) => Sentiment::Positive,
        (false, true) => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// Deterministic snapshot computed from record text alone.
pub fn metrics_from_records(records: &[FeedbackRecord]) -> MetricsSnapshot {
    if records.is_empty() {
        return MetricsSnapshot::zeroed();
    }

    let (mut positive, mut negative, mut neutral) = (0usize, 0usize, 0usize);
    for record in records {
        match classify(record.text()) {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => neutral += 1,
        }
    }

    let total = records.len() as f64;
    let pct = |n: usize| round1(n as f64 / total * 100.0);
    let (pos_pct, neg_pct, neu_pct) = (pct(positive), pct(negative), pct(neutral));
    let happiness = (0.7 * pos_pct + 0.3 * neu_pct - 0.5 * neg_pct).clamp(0.0, 100.0);

    MetricsSnapshot {
        happiness_index: Metric::flat(round1(happiness)),
        positive_sentiment: Metric::flat(pos_pct),
        negative_sentiment: Metric::flat(neg_pct),
        neutral_sentiment: Metric::flat(neu_pct),
        response_time: Metric::flat(PLACEHOLDER_RESPONSE_TIME),
        resolution_rate: Metric::flat(PLACEHOLDER_RESOLUTION_RATE),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedbackMetadata, Trend};

    fn with_text(text: &str) -> FeedbackRecord {
        FeedbackRecord {
            id: text.into(),
            score: 1.0,
            metadata: FeedbackMetadata {
                text: Some(text.into()),
                ..Default::default()
            },
        }
    }

    fn located(city: &str, lat: Option<f64>, lng: Option<f64>) -> FeedbackRecord {
        FeedbackRecord {
            id: city.into(),
            score: 1.0,
            metadata: FeedbackMetadata {
                city: Some(city.into()),
                country: Some("USA".into()),
                latitude: lat,
                longitude: lng,
                ..Default::default()
            },
        }
    }

    #[test]
    fn markers_parse_from_surrounding_prose() {
        let text = r#"Here are the places:
```json
[{"name":"Paris","coordinates":[2.35,48.85]}]
```"#;
        let markers = extract_markers(text, &[]);
        assert_eq!(markers, vec![LocationMarker::new("Paris", 2.35, 48.85)]);
    }

    #[test]
    fn markers_fall_back_to_geography() {
        let records = vec![
            located("Austin", Some(30.27), Some(-97.74)),
            located("Nowhere", Some(1.0), None),
        ];
        let markers = extract_markers("I could not find any locations.", &records);
        assert_eq!(markers, vec![LocationMarker::new("Austin, USA", -97.74, 30.27)]);
    }

    #[test]
    fn malformed_array_falls_back() {
        let records = vec![located("Miami", Some(25.76), Some(-80.19))];
        let markers = extract_markers("[not json at all]", &records);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Miami, USA");
    }

    #[test]
    fn metrics_require_all_six_keys() {
        let partial = r#"{"happinessIndex": {"value": 70, "change": 1, "trend": "up"}}"#;
        let err = parse_metrics(partial).unwrap_err();
        assert!(err.to_string().contains("positiveSentiment"));
    }

    #[test]
    fn metrics_parse_when_complete() {
        let metric = r#"{"value": 42.0, "change": -1.5, "trend": "down"}"#;
        let text = format!(
            "Result: {{\"happinessIndex\": {metric}, \"positiveSentiment\": {metric}, \
             \"negativeSentiment\": {metric}, \"neutralSentiment\": {metric}, \
             \"responseTime\": {metric}, \"resolutionRate\": {metric}}} done"
        );
        let snapshot = extract_metrics(&text, &[]);
        assert_eq!(snapshot.happiness_index.value, 42.0);
        assert_eq!(snapshot.resolution_rate.trend, Trend::Down);
    }

    #[test]
    fn classifier_cases() {
        assert_eq!(classify("This service is great"), Sentiment::Positive);
        assert_eq!(classify("This is terrible"), Sentiment::Negative);
        assert_eq!(classify("Great phone, terrible battery"), Sentiment::Neutral);
        assert_eq!(classify("I switched plans yesterday"), Sentiment::Neutral);
    }

    #[test]
    fn empty_records_give_zero_snapshot() {
        let snapshot = metrics_from_records(&[]);
        assert_eq!(snapshot, MetricsSnapshot::zeroed());
        assert_eq!(snapshot.happiness_index.value, 0.0);
        assert_eq!(snapshot.happiness_index.trend, Trend::Neutral);
    }

    #[test]
    fn fallback_percentages_and_happiness() {
        let records = vec![
            with_text("great support"),
            with_text("love it"),
            with_text("terrible coverage"),
            with_text("switched last week"),
        ];
        let snapshot = metrics_from_records(&records);
        assert_eq!(snapshot.positive_sentiment.value, 50.0);
        assert_eq!(snapshot.negative_sentiment.value, 25.0);
        assert_eq!(snapshot.neutral_sentiment.value, 25.0);
        // 0.7 * 50 + 0.3 * 25 - 0.5 * 25
        assert_eq!(snapshot.happiness_index.value, 30.0);
        assert_eq!(snapshot.response_time.value, 2.5);
        assert_eq!(snapshot.resolution_rate.value, 85.0);
    }

    #[test]
    fn happiness_clamps_at_zero() {
        let records = vec![with_text("awful"), with_text("the worst")];
        let snapshot = metrics_from_records(&records);
        assert_eq!(snapshot.negative_sentiment.value, 100.0);
        assert_eq!(snapshot.happiness_index.value, 0.0);
    }

    #[test]
    fn fallback_is_deterministic() {
        let records = vec![with_text("fast and reliable"), with_text("slow"), with_text("ok")];
        assert_eq!(metrics_from_records(&records), metrics_from_records(&records));
    }
}
