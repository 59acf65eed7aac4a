use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params_from_iter};

use crate::model::{PLAYER_ID_COLUMN, SEASON_COLUMN, SeasonTeam, StatRow, StatValue, TEAM_COLUMN};

pub const STATS_TABLE: &str = "rs_player_stats";

static MISSING: StatValue = StatValue::Missing;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the roster and stats tables when missing. Existing tables are left
/// alone; the stats table is expected to carry `UNIQUE(player_id, Season, Team)`.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            player_id TEXT NULL UNIQUE,
            name TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS rs_player_stats (
            player_id TEXT NOT NULL,
            "Name" TEXT NULL,
            "Season" TEXT NOT NULL,
            "Age" REAL NULL,
            "Team" TEXT NOT NULL,
            "Lg" TEXT NULL,
            "Pos" TEXT NULL,
            "G" REAL NULL,
            "GS" REAL NULL,
            "MP" REAL NULL,
            "FG" REAL NULL,
            "FGA" REAL NULL,
            "FG%" REAL NULL,
            "3P" REAL NULL,
            "3PA" REAL NULL,
            "3P%" REAL NULL,
            "2P" REAL NULL,
            "2PA" REAL NULL,
            "2P%" REAL NULL,
            "eFG%" REAL NULL,
            "FT" REAL NULL,
            "FTA" REAL NULL,
            "FT%" REAL NULL,
            "ORB" REAL NULL,
            "DRB" REAL NULL,
            "TRB" REAL NULL,
            "AST" REAL NULL,
            "STL" REAL NULL,
            "BLK" REAL NULL,
            "TOV" REAL NULL,
            "PF" REAL NULL,
            "PTS" REAL NULL,
            "Awards" TEXT NULL,
            UNIQUE (player_id, "Season", "Team")
        );
        CREATE INDEX IF NOT EXISTS idx_rs_player_stats_player_season
            ON rs_player_stats(player_id, "Season");
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Column names of a table, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
        .context("prepare table_info")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("query table_info")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode table_info row")?);
    }
    if out.is_empty() {
        return Err(anyhow!("table {table} does not exist"));
    }
    Ok(out)
}

/// `(Season, Team)` pairs already stored for one player, limited to `seasons`.
pub fn existing_keys(
    conn: &Connection,
    player_id: &str,
    seasons: &[String],
) -> Result<HashSet<SeasonTeam>> {
    if seasons.is_empty() {
        return Ok(HashSet::new());
    }
    let placeholders = (0..seasons.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        r#"SELECT "Season", "Team" FROM {STATS_TABLE}
           WHERE player_id = ?1 AND "Season" IN ({placeholders})"#
    );
    let mut stmt = conn.prepare(&sql).context("prepare existing keys query")?;
    let params = std::iter::once(player_id).chain(seasons.iter().map(String::as_str));
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .context("query existing keys")?;

    let mut out = HashSet::new();
    for row in rows {
        out.insert(row.context("decode existing key row")?);
    }
    Ok(out)
}

/// Which fetched columns can be written to the stats table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub indices: Vec<usize>,
    pub columns: Vec<String>,
    pub skipped: Vec<String>,
}

/// Matches fetched columns to stored ones (case-insensitively, like SQLite).
/// Duplicate fetched names keep their first occurrence.
pub fn plan_insert(store_columns: &[String], fetched: &[String]) -> Result<InsertPlan> {
    let known = store_columns
        .iter()
        .map(|c| c.to_ascii_lowercase())
        .collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    let mut plan = InsertPlan {
        indices: Vec::new(),
        columns: Vec::new(),
        skipped: Vec::new(),
    };
    for (idx, col) in fetched.iter().enumerate() {
        let lower = col.to_ascii_lowercase();
        if !seen.insert(lower.clone()) {
            continue;
        }
        if known.contains(&lower) {
            plan.indices.push(idx);
            plan.columns.push(col.clone());
        } else {
            plan.skipped.push(col.clone());
        }
    }
    for key in [PLAYER_ID_COLUMN, SEASON_COLUMN, TEAM_COLUMN] {
        if !plan.columns.iter().any(|c| c.eq_ignore_ascii_case(key)) {
            return Err(anyhow!("natural key column {key} cannot be written to {STATS_TABLE}"));
        }
    }
    Ok(plan)
}

/// Writes `rows` with a do-nothing conflict policy on the natural key.
/// Returns how many rows were actually written.
pub fn insert_rows(conn: &Connection, plan: &InsertPlan, rows: &[&StatRow]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    let cols_sql = plan
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let values_sql = (1..=plan.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        r#"INSERT INTO {STATS_TABLE} ({cols_sql})
           VALUES ({values_sql})
           ON CONFLICT (player_id, "Season", "Team") DO NOTHING"#
    );
    let mut stmt = conn.prepare(&sql).context("prepare stats insert")?;
    let mut written = 0usize;
    for row in rows {
        let values = plan
            .indices
            .iter()
            .map(|&idx| row.values.get(idx).unwrap_or(&MISSING));
        written += stmt
            .execute(params_from_iter(values))
            .with_context(|| format!("insert {} {} {}", row.player_id, row.season, row.team))?;
    }
    Ok(written)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
