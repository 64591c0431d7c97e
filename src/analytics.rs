//! Sentiment analytics over the raw index.
//!
//! Unlike the pipeline operations these do not call the generative model and
//! do report failures, so callers can tell an outage from an empty result.
//! Aggregation is split into pure functions over record slices.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::embedding::{Embedder, EMBEDDING_DIM};
use crate::pipeline::window::SECONDS_PER_DAY;
use crate::types::FeedbackRecord;
use crate::vector::{MetadataFilter, TimeRange, VectorIndex};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_POSTS_LIMIT: usize = 20;
pub const MAX_POSTS_LIMIT: usize = 100;
const DEFAULT_POSTS_DAYS: u32 = 7;
const TRENDING_LIMIT: usize = 20;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "was", "are", "been", "be", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "can", "this", "that", "these", "those", "i",
    "you", "he", "she", "it", "we", "they", "my", "your", "his", "her", "its", "our", "their",
    "me", "him", "them", "us",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub platform: Option<String>,
    pub sentiment: Option<String>,
    pub timeframe_days: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub count: usize,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub sentiment_label: String,
    pub sentiment_score: f64,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub upvotes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<FeedbackRecord> for SearchMatch {
    fn from(record: FeedbackRecord) -> Self {
        let location = record.place_name();
        let m = record.metadata;
        Self {
            id: record.id,
            score: record.score,
            text: m.text.unwrap_or_default(),
            sentiment_label: m.sentiment_label.unwrap_or_else(|| "UNKNOWN".into()),
            sentiment_score: m.sentiment_score.unwrap_or(0.0),
            platform: m.source_platform.unwrap_or_default(),
            post_type: m.post_type,
            author: m.author,
            upvotes: m.upvotes.unwrap_or(0),
            source_id: m.source_identifier,
            url: m.url,
            datetime: m.datetime,
            location,
        }
    }
}

/// Ordering for [`Analytics::recent_posts`]. Every order is descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    /// Newest first. Undated posts go last.
    #[default]
    Timestamp,
    /// Strongest sentiment first, by absolute score.
    SentimentScore,
    Upvotes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentPostsQuery {
    pub platform: Option<String>,
    pub sentiment: Option<String>,
    pub post_type: Option<String>,
    pub timeframe_days: Option<u32>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub sort_by: PostSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentPosts {
    pub platform: String,
    pub timeframe_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
    pub sort_by: PostSort,
    pub count: usize,
    pub posts: Vec<SearchMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformBreakdown {
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    pub positive_percentage: f64,
    pub average_sentiment_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub timeframe_days: u32,
    pub platform: String,
    pub total_posts: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub average_sentiment_score: f64,
    pub by_platform: HashMap<String, PlatformBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingTopic {
    pub keyword: String,
    pub mentions: usize,
    pub average_sentiment: f64,
    pub sentiment_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingReport {
    pub platform: String,
    pub timeframe_days: u32,
    pub total_posts_analyzed: usize,
    pub trending_topics: Vec<TrendingTopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub platform: String,
    pub recent: SentimentSummary,
    pub previous: SentimentSummary,
    pub sentiment_score_change: f64,
    pub positive_percentage_change: f64,
    /// `"improving"`, `"declining"` or `"stable"`.
    pub trend: String,
}

/// Read-side queries used by the `/api/search|posts|summary|trending|compare` routes
/// and the matching MCP tools.
#[derive(Clone)]
pub struct Analytics {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    scan_limit: usize,
}

impl Analytics {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, scan_limit: usize) -> Self {
        Self {
            embedder,
            index,
            scan_limit,
        }
    }

    /// Semantic search with optional platform, sentiment and recency filters.
    pub async fn search(&self, params: &SearchQuery) -> Result<SearchResults> {
        anyhow::ensure!(!params.query.trim().is_empty(), "query must not be empty");
        let limit = params
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let filter = MetadataFilter {
            timestamp: params.timeframe_days.map(|days| last_days(days, now())),
            source_platform: platform_filter(params.platform.as_deref()),
            sentiment_label: sentiment_filter(params.sentiment.as_deref()),
            post_type: None,
        };

        let vector = self.embedder.embed(&params.query).await?;
        let records = self.index.query(&vector, limit, Some(&filter)).await?;
        let matches: Vec<SearchMatch> = records.into_iter().map(SearchMatch::from).collect();
        tracing::info!(query = %params.query, count = matches.len(), "sentiment search");
        Ok(SearchResults {
            query: params.query.clone(),
            count: matches.len(),
            matches,
        })
    }

    /// Metadata-only listing of recent posts, filtered and sorted.
    ///
    /// Fetches twice `limit` so the sort has candidates beyond the index's
    /// own order, then keeps the first `limit`.
    pub async fn recent_posts(&self, params: &RecentPostsQuery) -> Result<RecentPosts> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_POSTS_LIMIT)
            .clamp(1, MAX_POSTS_LIMIT);
        let days = params.timeframe_days.unwrap_or(DEFAULT_POSTS_DAYS);
        let post_type = params
            .post_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let filter = MetadataFilter {
            timestamp: Some(last_days(days, now())),
            source_platform: platform_filter(params.platform.as_deref()),
            sentiment_label: sentiment_filter(params.sentiment.as_deref()),
            post_type: post_type.clone(),
        };
        let zero = vec![0.0f32; EMBEDDING_DIM];
        let mut records = self.index.query(&zero, limit * 2, Some(&filter)).await?;

        sort_posts(&mut records, params.sort_by);
        records.truncate(limit);
        let posts: Vec<SearchMatch> = records.into_iter().map(SearchMatch::from).collect();
        tracing::info!(count = posts.len(), sort = ?params.sort_by, "recent posts");
        Ok(RecentPosts {
            platform: platform_label(params.platform.as_deref()).to_string(),
            timeframe_days: days,
            post_type,
            sort_by: params.sort_by,
            count: posts.len(),
            posts,
        })
    }

    /// Aggregate counts over the last `timeframe_days`.
    pub async fn summary(&self, platform: Option<&str>, timeframe_days: u32) -> Result<SentimentSummary> {
        let range = last_days(timeframe_days, now());
        let records = self.scan(platform, range).await?;
        Ok(summarize(&records, platform_label(platform), timeframe_days))
    }

    /// Most frequent words over the last `timeframe_days`.
    pub async fn trending(
        &self,
        platform: Option<&str>,
        timeframe_days: u32,
        min_mentions: usize,
    ) -> Result<TrendingReport> {
        let range = last_days(timeframe_days, now());
        let records = self.scan(platform, range).await?;
        Ok(TrendingReport {
            platform: platform_label(platform).to_string(),
            timeframe_days,
            total_posts_analyzed: records.len(),
            trending_topics: trending_topics(&records, min_mentions),
        })
    }

    /// The last `recent_days` against the `previous_days` before them.
    pub async fn compare(
        &self,
        platform: Option<&str>,
        recent_days: u32,
        previous_days: u32,
    ) -> Result<PeriodComparison> {
        let now = now();
        let recent_range = last_days(recent_days, now);
        let previous_range = TimeRange::new(
            recent_range.start - i64::from(previous_days) * SECONDS_PER_DAY,
            recent_range.start,
        );
        let label = platform_label(platform);
        let recent = summarize(&self.scan(platform, recent_range).await?, label, recent_days);
        let previous = summarize(
            &self.scan(platform, previous_range).await?,
            label,
            previous_days,
        );
        Ok(compare_periods(recent, previous))
    }

    async fn scan(&self, platform: Option<&str>, range: TimeRange) -> Result<Vec<FeedbackRecord>> {
        let filter = MetadataFilter {
            timestamp: Some(range),
            source_platform: platform_filter(platform),
            sentiment_label: None,
            post_type: None,
        };
        let zero = vec![0.0f32; EMBEDDING_DIM];
        self.index.query(&zero, self.scan_limit, Some(&filter)).await
    }
}

/// Stable descending sort; missing values rank lowest.
pub fn sort_posts(records: &mut [FeedbackRecord], order: PostSort) {
    match order {
        PostSort::Timestamp => records.sort_by(|a, b| b.metadata.timestamp.cmp(&a.metadata.timestamp)),
        PostSort::SentimentScore => records.sort_by(|a, b| {
            let strength = |r: &FeedbackRecord| r.metadata.sentiment_score.unwrap_or(0.0).abs();
            strength(b).total_cmp(&strength(a))
        }),
        PostSort::Upvotes => records.sort_by(|a, b| {
            b.metadata.upvotes.unwrap_or(0).cmp(&a.metadata.upvotes.unwrap_or(0))
        }),
    }
}

pub fn summarize(records: &[FeedbackRecord], platform: &str, timeframe_days: u32) -> SentimentSummary {
    let mut positive = 0;
    let mut negative = 0;
    let mut score_sum = 0.0;
    let mut platforms: HashMap<String, (usize, usize, usize, f64)> = HashMap::new();

    for record in records {
        let label = record.metadata.sentiment_label.as_deref().unwrap_or("UNKNOWN");
        let score = record.metadata.sentiment_score.unwrap_or(0.0);
        let source = record
            .metadata
            .source_platform
            .clone()
            .unwrap_or_else(|| "unknown".into());

        let entry = platforms.entry(source).or_default();
        entry.0 += 1;
        entry.3 += score;
        score_sum += score;
        match label {
            "POSITIVE" => {
                positive += 1;
                entry.1 += 1;
            }
            "NEGATIVE" => {
                negative += 1;
                entry.2 += 1;
            }
            _ => {}
        }
    }

    let total = records.len();
    let by_platform = platforms
        .into_iter()
        .map(|(name, (count, pos, neg, sum))| {
            let breakdown = PlatformBreakdown {
                count,
                positive: pos,
                negative: neg,
                positive_percentage: percentage(pos, count),
                average_sentiment_score: round_to(sum / count as f64, 4),
            };
            (name, breakdown)
        })
        .collect();

    SentimentSummary {
        timeframe_days,
        platform: platform.to_string(),
        total_posts: total,
        positive_count: positive,
        negative_count: negative,
        positive_percentage: percentage(positive, total),
        negative_percentage: percentage(negative, total),
        average_sentiment_score: if total == 0 {
            0.0
        } else {
            round_to(score_sum / total as f64, 4)
        },
        by_platform,
    }
}

/// Top words by mention count, ties in first-seen order.
pub fn trending_topics(records: &[FeedbackRecord], min_mentions: usize) -> Vec<TrendingTopic> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, (usize, f64)> = HashMap::new();

    for record in records {
        let score = record.metadata.sentiment_score.unwrap_or(0.0);
        let text = record.text().to_lowercase();
        for raw in text.split_whitespace() {
            let word: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
            if word.chars().count() <= 3 || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            let entry = stats.entry(word.clone()).or_insert_with(|| {
                order.push(word);
                (0, 0.0)
            });
            entry.0 += 1;
            entry.1 += score;
        }
    }

    let mut ranked: Vec<(usize, String)> = order.into_iter().enumerate().collect();
    ranked.sort_by(|(ia, a), (ib, b)| stats[b].0.cmp(&stats[a].0).then(ia.cmp(ib)));

    ranked
        .into_iter()
        .take(TRENDING_LIMIT)
        .filter_map(|(_, word)| {
            let (mentions, sum) = stats[&word];
            if mentions < min_mentions {
                return None;
            }
            let average = sum / mentions as f64;
            Some(TrendingTopic {
                keyword: word,
                mentions,
                average_sentiment: round_to(average, 4),
                sentiment_label: if average > 0.0 { "positive" } else { "negative" }.into(),
            })
        })
        .collect()
}

pub fn compare_periods(recent: SentimentSummary, previous: SentimentSummary) -> PeriodComparison {
    let score_change = recent.average_sentiment_score - previous.average_sentiment_score;
    let trend = if score_change > 0.0 {
        "improving"
    } else if score_change < 0.0 {
        "declining"
    } else {
        "stable"
    };
    PeriodComparison {
        platform: recent.platform.clone(),
        sentiment_score_change: round_to(score_change, 4),
        positive_percentage_change: round_to(
            recent.positive_percentage - previous.positive_percentage,
            2,
        ),
        trend: trend.into(),
        recent,
        previous,
    }
}

/// `None`, `""` and `"all"` mean every platform.
fn platform_filter(platform: Option<&str>) -> Option<String> {
    platform
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

fn platform_label(platform: Option<&str>) -> &str {
    match platform.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => "all",
    }
}

/// `positive`/`negative` map to the stored upper-case labels; anything else is no filter.
fn sentiment_filter(sentiment: Option<&str>) -> Option<String> {
    match sentiment.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("positive") => Some("POSITIVE".into()),
        Some("negative") => Some("NEGATIVE".into()),
        _ => None,
    }
}

fn last_days(days: u32, now: i64) -> TimeRange {
    TimeRange::new(now - i64::from(days) * SECONDS_PER_DAY, now)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
