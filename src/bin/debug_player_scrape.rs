use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use rs_player_stats::config::{ConfigOverrides, IngestConfig};
use rs_player_stats::model::Player;
use rs_player_stats::per_game::{RemoteStatSource, player_page_url};

// Scrapes one player page and prints the rows that would be offered to the
// store. Usage: debug_player_scrape <player_id> [name]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let player_id = args
        .next()
        .ok_or_else(|| anyhow!("usage: debug_player_scrape <player_id> [name]"))?;
    let name = args.next().unwrap_or_else(|| player_id.clone());
    let as_json = std::env::var("DEBUG_SCRAPE_JSON")
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // The store is not touched, so point it anywhere.
    let config = IngestConfig::resolve(
        ConfigOverrides {
            db_path: Some(":memory:".into()),
            ..ConfigOverrides::default()
        },
        |key| std::env::var(key).ok(),
    )?;
    println!("GET {}", player_page_url(&config.base_url, &player_id)?);

    let source = RemoteStatSource::new(&config)?;
    let player = Player::new(player_id, name);
    let table = source.scrape(&player)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&table.to_records())?);
        return Ok(());
    }

    println!("{} rows, columns: {}", table.len(), table.columns.join(" | "));
    for row in &table.rows {
        let line = row
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{line}");
    }
    Ok(())
}
