use anyhow::Result;

use ttime::analytics::SearchQuery;
use ttime::config::TtimeConfig;

/// Run a semantic search from the terminal.
pub async fn search(config: &TtimeConfig, params: SearchQuery) -> Result<()> {
    let state = ttime::server::build_state(config)?;
    let results = state.analytics.search(&params).await?;

    if results.matches.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.count);

    for (i, m) in results.matches.iter().enumerate() {
        let preview: String = if m.text.chars().count() > 120 {
            format!("{}...", m.text.chars().take(120).collect::<String>())
        } else {
            m.text.clone()
        };

        println!(
            "  {}. [{}] {} (sentiment: {} {:.2}, score: {:.4})",
            i + 1,
            if m.platform.is_empty() { "?" } else { m.platform.as_str() },
            m.id,
            m.sentiment_label,
            m.sentiment_score,
            m.score,
        );
        if let Some(location) = &m.location {
            println!("     {location}");
        }
        println!("     {preview}");
        println!();
    }

    Ok(())
}
