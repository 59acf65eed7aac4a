use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::html_table::{HtmlTable, parse_tables};
use crate::http_client::{fetch_page, http_client};
use crate::ingest::StatSource;
use crate::model::{
    NAME_COLUMN, PLAYER_ID_COLUMN, Player, SEASON_COLUMN, StatRow, StatTable, StatValue,
    TEAM_COLUMN, TEXT_COLUMNS,
};

/// Marks the per-game table among the many tables on a player page.
pub const REQUIRED_COLUMNS: &[&str] = &[SEASON_COLUMN, "PTS"];

// "(15 Yrs)" style span rows under the career line.
static YEARS_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\d+ Yrs\)").expect("static years span regex"));
static SUMMARY_SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Career|Yrs").expect("static summary season regex"));
static AGGREGATE_TEAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TOT|\d+TM").expect("static aggregate team regex"));

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{0:#}")]
    Fetch(anyhow::Error),
    #[error("Table not found")]
    TableNotFound,
    #[error("{0}")]
    Parse(String),
}

pub fn player_page_url(base_url: &str, player_id: &str) -> Result<String, ScrapeError> {
    let Some(first) = player_id.chars().next() else {
        return Err(ScrapeError::Parse("empty player id".to_string()));
    };
    Ok(format!(
        "{}/players/{first}/{player_id}.html",
        base_url.trim_end_matches('/')
    ))
}

pub fn is_aggregate_team(team: &str) -> bool {
    AGGREGATE_TEAM_RE.is_match(team)
}

pub fn is_summary_season(season: &str) -> bool {
    SUMMARY_SEASON_RE.is_match(season)
}

/// First table carrying every required column wins.
pub fn select_per_game_table(tables: &[HtmlTable]) -> Option<&HtmlTable> {
    tables.iter().find(|t| t.has_columns(REQUIRED_COLUMNS))
}

pub fn parse_per_game_html(
    player_id: &str,
    name: &str,
    html: &str,
) -> Result<StatTable, ScrapeError> {
    let tables = parse_tables(html);
    let table = select_per_game_table(&tables).ok_or(ScrapeError::TableNotFound)?;
    normalize_per_game(player_id, name, table)
}

pub fn normalize_per_game(
    player_id: &str,
    name: &str,
    table: &HtmlTable,
) -> Result<StatTable, ScrapeError> {
    let headers = table.headers();
    let column = |col: &str| {
        headers
            .iter()
            .position(|h| h == col)
            .ok_or_else(|| ScrapeError::Parse(format!("missing {col} column")))
    };
    let season_idx = column(SEASON_COLUMN)?;
    let team_idx = column(TEAM_COLUMN)?;

    let mut rows: Vec<&Vec<String>> = table
        .rows
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        // No season means no natural key.
        .filter(|row| !cell(row, season_idx).trim().is_empty())
        .filter(|row| !YEARS_SPAN_RE.is_match(cell(row, season_idx)))
        .collect();

    // A season listed more than once is a mid-season trade: one aggregate row
    // plus a row per team.
    let mut season_counts: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        let season = cell(row, season_idx);
        if !is_summary_season(season) {
            *season_counts.entry(season.to_string()).or_default() += 1;
        }
    }
    let mut drop_partials: HashSet<String> = HashSet::new();
    for (season, count) in season_counts {
        if count < 2 {
            continue;
        }
        let has_aggregate = rows.iter().any(|row| {
            cell(row, season_idx) == season && is_aggregate_team(cell(row, team_idx))
        });
        if has_aggregate {
            drop_partials.insert(season);
        }
    }

    rows.retain(|row| {
        let season = cell(row, season_idx);
        if is_summary_season(season) {
            return false;
        }
        !drop_partials.contains(season) || is_aggregate_team(cell(row, team_idx))
    });

    let mut columns = Vec::with_capacity(headers.len() + 2);
    columns.push(PLAYER_ID_COLUMN.to_string());
    columns.push(NAME_COLUMN.to_string());
    columns.extend(headers.iter().cloned());

    let out_rows = rows
        .into_iter()
        .map(|row| {
            let mut values = Vec::with_capacity(columns.len());
            values.push(StatValue::text(player_id));
            values.push(StatValue::text(name));
            for (idx, header) in headers.iter().enumerate() {
                let raw = cell(row, idx);
                let value = if idx == season_idx || idx == team_idx {
                    StatValue::text(raw)
                } else if TEXT_COLUMNS.contains(&header.as_str()) {
                    if raw.trim().is_empty() {
                        StatValue::Missing
                    } else {
                        StatValue::text(raw)
                    }
                } else {
                    StatValue::numeric(raw)
                };
                values.push(value);
            }
            StatRow {
                player_id: player_id.to_string(),
                name: name.to_string(),
                season: cell(row, season_idx).to_string(),
                team: cell(row, team_idx).to_string(),
                values,
            }
        })
        .collect();

    Ok(StatTable {
        columns,
        rows: out_rows,
    })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Scrapes basketball-reference player pages over HTTP.
pub struct RemoteStatSource {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl RemoteStatSource {
    pub fn new(config: &IngestConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn scrape(&self, player: &Player) -> Result<StatTable, ScrapeError> {
        let url = player_page_url(&self.base_url, &player.player_id)?;
        let html =
            fetch_page(&self.client, &url, &self.user_agent).map_err(ScrapeError::Fetch)?;
        parse_per_game_html(&player.player_id, &player.name, &html)
    }
}

impl StatSource for RemoteStatSource {
    fn fetch(&mut self, player: &Player) -> Option<StatTable> {
        match self.scrape(player) {
            Ok(table) => {
                info!(player_id = %player.player_id, rows = table.len(), "{} is good", player.name);
                Some(table)
            }
            Err(ScrapeError::TableNotFound) => {
                warn!(player_id = %player.player_id, "{}  Table not found", player.name);
                None
            }
            Err(err) => {
                warn!(player_id = %player.player_id, "{}  Failed: {err}", player.name);
                None
            }
        }
    }
}
