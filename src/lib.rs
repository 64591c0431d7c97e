//! Customer-sentiment retrieval service for the T-Time dashboard.
//!
//! Answers three questions about customer feedback stored in a vector index:
//! where people are talking about a topic (map markers), what they are saying
//! (conversational answers grounded in retrieved posts), and how they feel
//! overall (six dashboard metrics). Each answer is produced by the same
//! retrieval-augmented pipeline:
//!
//! | Stage | Module | Failure handling |
//! |-------|--------|------------------|
//! | Embed the query (e5-base-v2, 768 dims) | [`embedding`] | operation falls back to its default |
//! | Nearest-neighbour search in a date window | [`vector`], [`pipeline::window`] | unfiltered retry, then empty |
//! | Prompt a generative model | [`generative`], [`pipeline::prompt`] | operation falls back to its default |
//! | Recover JSON from the reply | [`pipeline::extract`] | computed from the records |
//!
//! # Architecture
//!
//! - **Vector search**: Pinecone over HTTP, or a local SQLite file with
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec)
//! - **Embeddings**: an embedding service over HTTP, or ONNX Runtime in process
//! - **Generation**: OpenAI-compatible servers (vLLM, NIM), Ollama or Gemini
//! - **Transport**: JSON RPC over HTTP for the dashboard, MCP over stdio or
//!   Streamable HTTP for agents
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`types`]: feedback records, markers, metrics and conversation turns
//! - [`error`]: pipeline failure taxonomy
//! - [`db`]: local index database and schema
//! - [`analytics`]: search, recent posts, summary, trending and period comparison
//! - [`ingest`]: embedding scraped feedback into the index
//! - [`pipeline`]: the [`pipeline::SentimentService`] orchestrator
//! - [`rpc`] and [`tools`]: the HTTP and MCP surfaces
//! - [`server`]: wiring for both transports

pub mod analytics;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generative;
pub mod ingest;
pub mod pipeline;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod types;
pub mod vector;
