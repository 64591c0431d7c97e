#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use ttime::analytics::Analytics;
use ttime::config::RetrievalConfig;
use ttime::embedding::Embedder;
use ttime::generative::GenerativeClient;
use ttime::pipeline::SentimentService;
use ttime::rpc::AppState;
use ttime::types::{FeedbackMetadata, FeedbackRecord};
use ttime::vector::{IndexedFeedback, MetadataFilter, VectorIndex};

/// Returns the same small vector for every input, or always fails.
pub struct FakeEmbedder {
    fail: bool,
    pub inputs: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            inputs: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inputs.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("embedding service unavailable");
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// What the fake index does for one kind of query.
#[derive(Clone)]
pub enum Outcome {
    Records(Vec<FeedbackRecord>),
    Fail,
}

/// One observed `query` call.
#[derive(Debug, Clone)]
pub struct QueryCall {
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
}

/// Answers filtered and unfiltered queries differently and records every call.
/// Returned lists are truncated to `top_k` like a real index.
pub struct FakeIndex {
    filtered: Outcome,
    unfiltered: Outcome,
    pub calls: Mutex<Vec<QueryCall>>,
}

impl FakeIndex {
    pub fn new(filtered: Outcome, unfiltered: Outcome) -> Arc<Self> {
        Arc::new(Self {
            filtered,
            unfiltered,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Same records for every query.
    pub fn serving(records: Vec<FeedbackRecord>) -> Arc<Self> {
        Self::new(Outcome::Records(records.clone()), Outcome::Records(records))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Outcome::Fail, Outcome::Fail)
    }

    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<FeedbackRecord>> {
        self.calls.lock().unwrap().push(QueryCall {
            top_k,
            filter: filter.cloned(),
        });
        let outcome = if filter.is_some() {
            &self.filtered
        } else {
            &self.unfiltered
        };
        match outcome {
            Outcome::Records(records) => Ok(records.iter().take(top_k).cloned().collect()),
            Outcome::Fail => anyhow::bail!("index rejected the query"),
        }
    }

    async fn upsert(&self, items: Vec<IndexedFeedback>) -> Result<usize> {
        Ok(items.len())
    }
}

/// Replies with fixed text (or fails) and keeps every prompt it was given.
pub struct FakeLlm {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeClient for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("model server returned HTTP 503"),
        }
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

pub fn service(
    embedder: Arc<FakeEmbedder>,
    index: Arc<FakeIndex>,
    llm: Arc<FakeLlm>,
) -> SentimentService {
    SentimentService::new(embedder, index, llm, RetrievalConfig::default())
}

pub fn app_state(
    embedder: Arc<FakeEmbedder>,
    index: Arc<FakeIndex>,
    llm: Arc<FakeLlm>,
) -> AppState {
    let analytics = Analytics::new(embedder.clone(), index.clone(), 10_000);
    AppState {
        service: service(embedder, index, llm),
        analytics,
    }
}

/// A feedback record with text and an optional timestamp.
pub fn record(id: &str, text: &str, timestamp: Option<i64>) -> FeedbackRecord {
    FeedbackRecord {
        id: id.to_string(),
        score: 0.8,
        metadata: FeedbackMetadata {
            text: Some(text.to_string()),
            timestamp,
            ..Default::default()
        },
    }
}

/// A record with a place and coordinates.
pub fn located(id: &str, city: &str, lat: f64, lng: f64) -> FeedbackRecord {
    FeedbackRecord {
        id: id.to_string(),
        score: 0.8,
        metadata: FeedbackMetadata {
            text: Some(format!("signal is fine in {city}")),
            city: Some(city.to_string()),
            latitude: Some(lat),
            longitude: Some(lng),
            ..Default::default()
        },
    }
}

/// A record with platform and sentiment labels, timestamped now.
pub fn labelled(id: &str, text: &str, platform: &str, label: &str, score: f64) -> FeedbackRecord {
    FeedbackRecord {
        id: id.to_string(),
        score: 0.0,
        metadata: FeedbackMetadata {
            text: Some(text.to_string()),
            timestamp: Some(chrono::Utc::now().timestamp()),
            source_platform: Some(platform.to_string()),
            sentiment_label: Some(label.to_string()),
            sentiment_score: Some(score),
            ..Default::default()
        },
    }
}
