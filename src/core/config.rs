//! Scheduler configuration loaded from the environment.
//!
//! The binary calls `dotenvy::dotenv()` first, so a local `.env` file works in
//! development while real deployments set the variables directly.

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use std::env;
use std::time::Duration;

/// Default seconds between scheduler cycles (1 hour).
const DEFAULT_PERIOD_SECS: u64 = 3600;

/// Default seconds of forward-looking notification window (1 hour).
const DEFAULT_LOOKAHEAD_SECS: u64 = 3600;

/// Default SQLite database path.
const DEFAULT_DATABASE_PATH: &str = "nosdois.db";

/// Runtime configuration for the notification scheduler.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Time between scheduler cycles.
    pub cycle_period: Duration,
    /// How far ahead of `now` a due instant may be and still trigger a
    /// notification this cycle.
    pub lookahead: ChronoDuration,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `DATABASE_PATH`
    /// - `SCHEDULER_PERIOD_SECS`
    /// - `SCHEDULER_LOOKAHEAD_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Split out from `from_env` so tests
    /// can supply variables without touching process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path =
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let period_secs = parse_secs(&lookup, "SCHEDULER_PERIOD_SECS", DEFAULT_PERIOD_SECS)?;
        let lookahead_secs =
            parse_secs(&lookup, "SCHEDULER_LOOKAHEAD_SECS", DEFAULT_LOOKAHEAD_SECS)?;

        Ok(Config {
            database_path,
            cycle_period: Duration::from_secs(period_secs),
            lookahead: ChronoDuration::seconds(lookahead_secs as i64),
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of seconds, got \"{raw}\"")),
        None => Ok(default),
    }
}
