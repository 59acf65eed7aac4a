use std::fmt;

use serde::{Serialize, Serializer};

pub const PLAYER_ID_COLUMN: &str = "player_id";
pub const NAME_COLUMN: &str = "Name";
pub const SEASON_COLUMN: &str = "Season";
pub const TEAM_COLUMN: &str = "Team";

/// Columns that keep their scraped text. Everything else is coerced to a number.
pub const TEXT_COLUMNS: &[&str] = &[SEASON_COLUMN, TEAM_COLUMN, "Lg", "Pos", "Awards"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub player_id: String,
    pub name: String,
}

impl Player {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Text(String),
    Number(f64),
    Missing,
}

impl StatValue {
    pub fn text(raw: &str) -> Self {
        StatValue::Text(raw.to_string())
    }

    /// Lenient numeric parse. Placeholders such as "—" or "" become `Missing`.
    pub fn numeric(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return StatValue::Missing;
        }
        // Percentages are published as ".512"; Rust parses those fine.
        match trimmed.replace(',', "").parse::<f64>() {
            Ok(n) if n.is_finite() => StatValue::Number(n),
            _ => StatValue::Missing,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Text(s) => f.write_str(s),
            StatValue::Number(n) => write!(f, "{n}"),
            StatValue::Missing => f.write_str(""),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Text(s) => serializer.serialize_str(s),
            StatValue::Number(n) => serializer.serialize_f64(*n),
            StatValue::Missing => serializer.serialize_none(),
        }
    }
}

impl rusqlite::ToSql for StatValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value};
        Ok(match self {
            StatValue::Text(s) => ToSqlOutput::from(s.as_str()),
            StatValue::Number(n) => ToSqlOutput::Owned(Value::Real(*n)),
            StatValue::Missing => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// `(season, team)` for one player. Together with the player id this is the
/// natural key of `rs_player_stats`.
pub type SeasonTeam = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub player_id: String,
    pub name: String,
    pub season: String,
    pub team: String,
    /// Aligned with `StatTable::columns`, including the leading id and name.
    pub values: Vec<StatValue>,
}

impl StatRow {
    pub fn key(&self) -> SeasonTeam {
        (self.season.clone(), self.team.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    pub columns: Vec<String>,
    pub rows: Vec<StatRow>,
}

impl StatTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&StatValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.values.get(idx)
    }

    /// Distinct seasons in first-seen order, blank ones included.
    pub fn seasons(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for row in &self.rows {
            if out.iter().any(|s| s == &row.season) {
                continue;
            }
            out.push(row.season.clone());
        }
        out
    }

    /// Rows as JSON objects keyed by column name, for the debug binary.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&row.values)
                    .map(|(col, value)| {
                        let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                        (col.clone(), json)
                    })
                    .collect()
            })
            .collect()
    }
}
