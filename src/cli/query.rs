//! One-shot pipeline operations from the terminal.

use anyhow::{Context, Result};

use ttime::config::TtimeConfig;
use ttime::rpc::dates::window_from_strings;

pub async fn ask(
    config: &TtimeConfig,
    message: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let state = ttime::server::build_state(config)?;
    let window = window_from_strings(start, end, config.retrieval.default_days_back);
    let answer = state.service.chat(message, &[], window).await;
    println!("{answer}");
    Ok(())
}

pub async fn markers(config: &TtimeConfig, query: &str) -> Result<()> {
    let state = ttime::server::build_state(config)?;
    let markers = state.service.map_markers(query).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&markers).context("failed to serialize markers")?
    );
    Ok(())
}

pub async fn metrics(config: &TtimeConfig, start: Option<&str>, end: Option<&str>) -> Result<()> {
    let state = ttime::server::build_state(config)?;
    let window = window_from_strings(start, end, config.retrieval.default_days_back);
    let snapshot = state.service.metrics(window).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("failed to serialize metrics")?
    );
    Ok(())
}
