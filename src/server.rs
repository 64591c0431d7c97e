//! Server start-up for the HTTP and stdio transports.
//!
//! [`build_state`] constructs the embedder, vector index and generative client
//! once; [`serve_http`] mounts the JSON RPC routes and the MCP endpoint on one
//! axum router, [`serve_stdio`] runs the MCP tools over stdin/stdout.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::ServiceExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analytics::Analytics;
use crate::config::TtimeConfig;
use crate::pipeline::SentimentService;
use crate::rpc::{self, AppState};
use crate::tools::SentimentTools;
use crate::{embedding, generative, vector};

/// Construct the shared services from config.
pub fn build_state(config: &TtimeConfig) -> Result<AppState> {
    let embedder = embedding::create_embedder(&config.embedding)?;
    tracing::info!(provider = %config.embedding.provider, "embedding provider ready");

    let index = vector::create_index(&config.vector)?;
    tracing::info!(provider = %config.vector.provider, "vector index ready");

    let llm = generative::create_client(&config.generative)?;
    tracing::info!(
        provider = %config.generative.provider,
        model = %config.generative.model,
        "generative client ready"
    );

    let analytics = Analytics::new(
        Arc::clone(&embedder),
        Arc::clone(&index),
        config.retrieval.analytics_top_k,
    );
    let service = SentimentService::new(embedder, index, llm, config.retrieval.clone());
    Ok(AppState { service, analytics })
}

/// RPC routes plus the MCP endpoint at `/mcp`, with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let service = state.service.clone();
    let analytics = state.analytics.clone();
    let mcp = StreamableHttpService::new(
        move || Ok(SentimentTools::new(service.clone(), analytics.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    rpc::router(state)
        .nest_service("/mcp", mcp)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the RPC surface and MCP-over-HTTP until ctrl-c.
pub async fn serve_http(config: TtimeConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(&config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening: RPC at /api, MCP at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Serve the MCP tools over stdio.
pub async fn serve_stdio(config: TtimeConfig) -> Result<()> {
    tracing::info!("starting T-Time MCP server on stdio");
    let AppState { service, analytics } = build_state(&config)?;

    let server = SentimentTools::new(service, analytics)
        .serve(rmcp::transport::stdio())
        .await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down HTTP server");
}
