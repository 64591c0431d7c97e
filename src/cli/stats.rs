use anyhow::Result;

use ttime::config::TtimeConfig;

/// Print aggregated sentiment statistics for the last `days` days.
pub async fn stats(config: &TtimeConfig, platform: Option<&str>, days: u32) -> Result<()> {
    let state = ttime::server::build_state(config)?;
    let summary = state.analytics.summary(platform, days).await?;

    println!("Sentiment summary ({}, last {} days)", summary.platform, days);
    println!("{}", "=".repeat(40));
    println!("  Total posts:         {}", summary.total_posts);
    println!(
        "  Positive:            {} ({:.1}%)",
        summary.positive_count, summary.positive_percentage
    );
    println!(
        "  Negative:            {} ({:.1}%)",
        summary.negative_count, summary.negative_percentage
    );
    println!("  Avg sentiment score: {:.4}", summary.average_sentiment_score);

    if !summary.by_platform.is_empty() {
        println!();
        println!("By Platform:");
        let mut platforms: Vec<_> = summary.by_platform.iter().collect();
        platforms.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(b.0)));
        for (name, breakdown) in platforms {
            println!(
                "  {:<18} {:>6} posts  {:>5.1}% positive  avg {:.4}",
                name, breakdown.count, breakdown.positive_percentage, breakdown.average_sentiment_score
            );
        }
    }

    Ok(())
}
