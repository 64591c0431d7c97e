use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TtimeConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub generative: GenerativeConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub transport: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"http"` (embedding service) or `"local"` (ONNX Runtime).
    pub provider: String,
    pub url: String,
    pub model: String,
    pub cache_dir: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VectorConfig {
    /// `"pinecone"` or `"local"` (SQLite + sqlite-vec).
    pub provider: String,
    pub index_host: String,
    pub api_key: String,
    pub namespace: String,
    pub db_path: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerativeConfig {
    /// `"openai"`, `"ollama"` or `"gemini"`.
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_days_back: u32,
    pub marker_top_k: usize,
    pub chat_top_k: usize,
    pub metrics_top_k: usize,
    pub history_turns: usize,
    pub metrics_query: String,
    pub analytics_top_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            transport: "http".into(),
            log_level: "info".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_ttime_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "http".into(),
            url: "http://localhost:5000".into(),
            model: "intfloat/e5-base-v2".into(),
            cache_dir,
            timeout_secs: None,
        }
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        let db_path = default_ttime_dir()
            .join("feedback.db")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "pinecone".into(),
            index_host: String::new(),
            api_key: String::new(),
            namespace: String::new(),
            db_path,
            timeout_secs: None,
        }
    }
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "http://localhost:8001/v1".into(),
            model: "nvidia/Llama-3.1-Nemotron-51B-Instruct".into(),
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_days_back: 7,
            marker_top_k: 50,
            chat_top_k: 20,
            metrics_top_k: 100,
            history_turns: 10,
            metrics_query: "customer service and product reviews".into(),
            analytics_top_k: 10_000,
        }
    }
}

/// Returns `~/.ttime/`, or `./.ttime/` when no home directory is known.
pub fn default_ttime_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ttime")
}

/// Returns the config file path: `$TTIME_CONFIG` or `~/.ttime/config.toml`.
pub fn default_config_path() -> PathBuf {
    std::env::var("TTIME_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_ttime_dir().join("config.toml"))
}

impl TtimeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TtimeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TTIME_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("TTIME_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid TTIME_PORT"),
            }
        }
        if let Ok(val) = std::env::var("TTIME_EMBEDDING_URL") {
            self.embedding.url = val;
        }
        if let Ok(val) = std::env::var("PINECONE_API_KEY") {
            self.vector.api_key = val;
        }
        if let Ok(val) = std::env::var("PINECONE_INDEX_HOST") {
            self.vector.index_host = val;
        }
        if let Ok(val) = std::env::var("TTIME_VECTOR_DB") {
            self.vector.db_path = val;
        }
        if let Ok(val) = std::env::var("TTIME_LLM_BASE_URL") {
            self.generative.base_url = val;
        }
        if let Ok(val) = std::env::var("TTIME_LLM_MODEL") {
            self.generative.model = val;
        }
        if let Ok(val) = std::env::var("TTIME_LLM_API_KEY") {
            self.generative.api_key = val;
        }
    }

    /// Resolve the local index path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.vector.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
