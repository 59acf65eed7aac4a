use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://www.basketball-reference.com";
pub const DEFAULT_PROFILE: &str = "PGSTATMUSE";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; rs_player_stats/0.1)";

const DB_VAR: &str = "RS_STATS_DB";
const PROFILE_VAR: &str = "RS_STATS_DB_PROFILE";
const PROFILE_PREFIX: &str = "CONN_";
const BASE_URL_VAR: &str = "RS_STATS_BASE_URL";
const TIMEOUT_VAR: &str = "RS_STATS_TIMEOUT_SECS";
const USER_AGENT_VAR: &str = "RS_STATS_USER_AGENT";

/// Where the store location came from. Logged once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSource {
    Argument,
    Variable,
    Profile(String),
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub db_path: PathBuf,
    pub db_source: DbSource,
    pub base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Command-line overrides; every field falls back to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl IngestConfig {
    /// Resolve from the process environment (after loading `.env`).
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Store location: `--db`, then `RS_STATS_DB`, then the connection profile
    /// `CONN_<profile>` (profile from `RS_STATS_DB_PROFILE`, default `PGSTATMUSE`).
    pub fn resolve(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (db_path, db_source) = if let Some(path) = overrides.db_path {
            (path, DbSource::Argument)
        } else if let Some(uri) = var(DB_VAR) {
            (store_path_from_uri(&uri)?, DbSource::Variable)
        } else {
            let profile = var(PROFILE_VAR).unwrap_or_else(|| DEFAULT_PROFILE.to_string());
            let key = format!("{PROFILE_PREFIX}{}", profile.to_ascii_uppercase());
            let uri = var(&key).ok_or_else(|| {
                anyhow!("no store configured: set --db, {DB_VAR}, or connection profile {key}")
            })?;
            (store_path_from_uri(&uri)?, DbSource::Profile(profile))
        };

        let base_url = overrides
            .base_url
            .or_else(|| var(BASE_URL_VAR))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match var(TIMEOUT_VAR) {
                Some(raw) => parse_timeout_secs(TIMEOUT_VAR, &raw)?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        }
        .max(1);

        let user_agent = var(USER_AGENT_VAR).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            db_path,
            db_source,
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }
}

/// Whole seconds, as given to `--timeout-secs` or `RS_STATS_TIMEOUT_SECS`.
pub fn parse_timeout_secs(source: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| anyhow!("{source} must be a whole number of seconds, got `{raw}`"))
}

/// Accepts a plain path, `:memory:`, or a `sqlite://` / `sqlite:` uri.
pub fn store_path_from_uri(uri: &str) -> Result<PathBuf> {
    let uri = uri.trim();
    let path = if let Some(rest) = uri.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = uri.strip_prefix("sqlite:") {
        rest
    } else if let Some((scheme, _)) = uri.split_once("://") {
        return Err(anyhow!("unsupported store uri scheme `{scheme}`"));
    } else {
        uri
    };
    if path.is_empty() {
        return Err(anyhow!("store uri has an empty path"));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn explicit_variable_wins_over_profile() {
        let cfg = IngestConfig::resolve(
            ConfigOverrides::default(),
            lookup(&[
                ("RS_STATS_DB", "sqlite:///data/stats.sqlite"),
                ("CONN_PGSTATMUSE", "/other.sqlite"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/data/stats.sqlite"));
        assert_eq!(cfg.db_source, DbSource::Variable);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn falls_back_to_named_profile() {
        let cfg = IngestConfig::resolve(
            ConfigOverrides::default(),
            lookup(&[("RS_STATS_DB", "  "), ("CONN_PGSTATMUSE", "stats.sqlite")]),
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("stats.sqlite"));
        assert_eq!(cfg.db_source, DbSource::Profile("PGSTATMUSE".to_string()));

        let cfg = IngestConfig::resolve(
            ConfigOverrides::default(),
            lookup(&[("RS_STATS_DB_PROFILE", "warehouse"), ("CONN_WAREHOUSE", ":memory:")]),
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from(":memory:"));
    }

    #[test]
    fn missing_store_is_an_error() {
        let err = IngestConfig::resolve(ConfigOverrides::default(), lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("CONN_PGSTATMUSE"));
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = IngestConfig::resolve(
            ConfigOverrides {
                db_path: Some(PathBuf::from("cli.sqlite")),
                base_url: Some("http://localhost:8080/".to_string()),
                timeout_secs: Some(0),
            },
            lookup(&[("RS_STATS_DB", "env.sqlite"), ("RS_STATS_TIMEOUT_SECS", "5")]),
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("cli.sqlite"));
        assert_eq!(cfg.db_source, DbSource::Argument);
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        assert_eq!(parse_timeout_secs("--timeout-secs", " 45 ").unwrap(), 45);
        let err = parse_timeout_secs("--timeout-secs", "abc").unwrap_err();
        assert!(err.to_string().contains("--timeout-secs"));

        let err = IngestConfig::resolve(
            ConfigOverrides::default(),
            lookup(&[("RS_STATS_DB", ":memory:"), ("RS_STATS_TIMEOUT_SECS", "soon")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("RS_STATS_TIMEOUT_SECS"));
    }

    #[test]
    fn rejects_foreign_uri_schemes() {
        assert!(store_path_from_uri("postgresql://user@host/db").is_err());
        assert!(store_path_from_uri("sqlite://").is_err());
    }
}
