//! Library statistics overview.
//!
//! A quick summary of what's stored: transcript counts, caption coverage,
//! and the per-topic breakdown. Used by `tsg stats` to confirm that fetches
//! are landing where expected.

use anyhow::Result;

use crate::config::Config;
use crate::store::TranscriptStore;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(store: &dyn TranscriptStore, config: &Config) -> Result<()> {
    let total = store.count().await?;
    // An empty topic filter matches every record; only records with
    // transcript text come back.
    let with_text = store.by_topic("").await?.len() as i64;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Tubesage — Library Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Videos:       {}", total);
    println!(
        "  Transcribed:  {} / {} ({}%)",
        with_text,
        total,
        if total > 0 { (with_text * 100) / total } else { 0 }
    );

    let topics = store.topics().await?;
    if !topics.is_empty() {
        println!();
        println!("  By topic:");
        println!("  {:<32} {:>8}", "TOPIC", "VIDEOS");
        println!("  {}", "-".repeat(42));
        for (topic, count) in &topics {
            println!("  {:<32} {:>8}", topic, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
