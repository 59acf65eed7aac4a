use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::model::{Player, StatRow, StatTable};
use crate::per_game::RemoteStatSource;
use crate::roster;
use crate::store::{self, STATS_TABLE};

/// Produces normalized per-game rows for one player. `None` means the player
/// has nothing usable this run; it never aborts the run.
pub trait StatSource {
    fn fetch(&mut self, player: &Player) -> Option<StatTable>;
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub players_queued: usize,
    pub players_scraped: usize,
    pub players_skipped: usize,
    pub rows_checked: usize,
    pub rows_inserted: usize,
    pub started_at: String,
    pub finished_at: String,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.players_queued == 0 {
            return f.write_str("No players found.");
        }
        write!(
            f,
            "Checked {} rows; inserted {} new rows.",
            self.rows_checked, self.rows_inserted
        )
    }
}

/// Opens the store, loads the roster and runs one incremental load against
/// basketball-reference.
pub fn run(config: &IngestConfig) -> Result<RunSummary> {
    let mut conn = store::open_db(&config.db_path)?;
    let players = roster::load_players(&conn)?;
    info!("{}", roster::queued_message(&players));
    let mut source = RemoteStatSource::new(config)?;
    load_incremental(&mut conn, &players, &mut source)
}

/// Scrapes every player in order and inserts rows whose
/// `(player_id, Season, Team)` is not stored yet. All writes share one
/// transaction; any store error rolls back the whole run.
pub fn load_incremental(
    conn: &mut Connection,
    players: &[Player],
    source: &mut impl StatSource,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        players_queued: players.len(),
        started_at: Utc::now().to_rfc3339(),
        ..RunSummary::default()
    };
    if players.is_empty() {
        summary.finished_at = Utc::now().to_rfc3339();
        return Ok(summary);
    }

    let tx = conn.transaction().context("begin ingest transaction")?;
    let store_columns = store::table_columns(&tx, STATS_TABLE)?;
    let mut warned_columns: HashSet<String> = HashSet::new();

    for player in players {
        let Some(table) = source.fetch(player) else {
            summary.players_skipped += 1;
            continue;
        };
        if table.is_empty() {
            summary.players_skipped += 1;
            continue;
        }
        let seasons = table.seasons();
        if seasons.is_empty() {
            summary.players_skipped += 1;
            continue;
        }
        summary.players_scraped += 1;

        let existing = store::existing_keys(&tx, &player.player_id, &seasons)?;
        let new_rows: Vec<&StatRow> = table
            .rows
            .iter()
            .filter(|row| !existing.contains(&row.key()))
            .collect();

        summary.rows_checked += table.len();
        if new_rows.is_empty() {
            continue;
        }

        let plan = store::plan_insert(&store_columns, &table.columns)?;
        for col in &plan.skipped {
            if warned_columns.insert(col.clone()) {
                warn!(column = %col, "column not present in {STATS_TABLE}; not stored");
            }
        }
        let written = store::insert_rows(&tx, &plan, &new_rows)?;
        if written < new_rows.len() {
            warn!(
                player_id = %player.player_id,
                expected = new_rows.len(),
                written,
                "some rows already existed at insert time"
            );
        }
        summary.rows_inserted += new_rows.len();
    }

    tx.commit().context("commit ingest transaction")?;
    summary.finished_at = Utc::now().to_rfc3339();
    info!(
        players = summary.players_queued,
        scraped = summary.players_scraped,
        skipped = summary.players_skipped,
        "{summary}"
    );
    Ok(summary)
}
