use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use rs_player_stats::config::{ConfigOverrides, DbSource, IngestConfig, parse_timeout_secs};
use rs_player_stats::ingest;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let timeout_secs = parse_arg("--timeout-secs")
        .map(|raw| parse_timeout_secs("--timeout-secs", &raw))
        .transpose()?;
    let overrides = ConfigOverrides {
        db_path: parse_arg("--db").map(PathBuf::from),
        base_url: parse_arg("--base-url"),
        timeout_secs,
    };
    let config = IngestConfig::from_env(overrides).context("unable to resolve ingest config")?;
    let source = match &config.db_source {
        DbSource::Argument => "--db".to_string(),
        DbSource::Variable => "RS_STATS_DB".to_string(),
        DbSource::Profile(name) => format!("profile {name}"),
    };
    tracing::info!(
        db = %config.db_path.display(),
        source = %source,
        timeout_secs = config.request_timeout.as_secs(),
        "starting rs_player_stats ingest"
    );

    let summary = ingest::run(&config)?;

    println!("rs_player_stats ingest complete");
    println!("DB: {}", config.db_path.display());
    println!("{} players queued", summary.players_queued);
    println!(
        "Players scraped: {}/{}",
        summary.players_scraped, summary.players_queued
    );
    println!("{summary}");
    if !summary.started_at.is_empty() {
        println!("Run: {} -> {}", summary.started_at, summary.finished_at);
    }

    Ok(())
}

fn parse_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
