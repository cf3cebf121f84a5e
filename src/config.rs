//! Application configuration.
//!
//! Read once at startup from environment variables; everything has a
//! sensible default so the binary runs with no setup.

use std::path::PathBuf;

/// Default daily spend ceiling in USD.
pub const DEFAULT_DAILY_LIMIT: f64 = 20.0;

/// Default monthly spend ceiling in USD.
pub const DEFAULT_MONTHLY_LIMIT: f64 = 300.0;

/// Runtime configuration for the routing service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP API listens on. `AUTOMONET_PORT`, default 3000.
    pub port: u16,
    /// Directory for the SQLite database. `AUTOMONET_DATA_DIR`,
    /// default `.automonet`.
    pub data_dir: PathBuf,
    /// Optional JSON file overriding the built-in model catalog.
    /// `AUTOMONET_CATALOG`.
    pub catalog_path: Option<PathBuf>,
    /// Daily budget limit used when the store has no saved config.
    /// `AUTOMONET_DAILY_LIMIT`.
    pub default_daily_limit: f64,
    /// Monthly budget limit used when the store has no saved config.
    /// `AUTOMONET_MONTHLY_LIMIT`.
    pub default_monthly_limit: f64,
}

impl Config {
    /// Build a config from environment variables, falling back to defaults
    /// on missing or unparseable values.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("AUTOMONET_PORT").unwrap_or(3000),
            data_dir: std::env::var("AUTOMONET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".automonet")),
            catalog_path: std::env::var("AUTOMONET_CATALOG").ok().map(PathBuf::from),
            default_daily_limit: env_parsed("AUTOMONET_DAILY_LIMIT")
                .unwrap_or(DEFAULT_DAILY_LIMIT),
            default_monthly_limit: env_parsed("AUTOMONET_MONTHLY_LIMIT")
                .unwrap_or(DEFAULT_MONTHLY_LIMIT),
        }
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("automonet.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: PathBuf::from(".automonet"),
            catalog_path: None,
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            default_monthly_limit: DEFAULT_MONTHLY_LIMIT,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={}", name, raw);
            None
        }
    }
}
