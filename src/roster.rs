use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::model::Player;

/// Every player with both an id and a name, ordered by id.
pub fn load_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT player_id, name
            FROM players
            WHERE player_id IS NOT NULL AND name IS NOT NULL
            ORDER BY player_id ASC
            "#,
        )
        .context("prepare roster query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Player {
                player_id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("query roster")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode roster row")?);
    }
    Ok(out)
}

pub fn queued_message(players: &[Player]) -> String {
    format!("{} players queued", players.len())
}
