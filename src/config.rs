//! Configuration module for sitewatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the JSON API (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "sitewatch.db")
    pub db_path: String,
    /// Upper bound on a single probe (default: 5s)
    pub probe_timeout: Duration,
    /// How often the 10-minute table and alert feed are printed (default: 10s)
    pub short_report_interval: Duration,
    /// How often the 60-minute table is printed (default: 60s)
    pub long_report_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "sitewatch.db".to_string(),
            probe_timeout: Duration::from_secs(5),
            short_report_interval: Duration::from_secs(10),
            long_report_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SITEWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `SITEWATCH_DB_PATH`: Database file path (default: "sitewatch.db")
    /// - `SITEWATCH_PROBE_TIMEOUT_SECS`: probe timeout (default: 5)
    /// - `SITEWATCH_SHORT_REPORT_SECS`: short report cadence (default: 10)
    /// - `SITEWATCH_LONG_REPORT_SECS`: long report cadence (default: 60)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();

        if let Some(port) = parse_var(&lookup, "SITEWATCH_HTTP_PORT") {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("SITEWATCH_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "SITEWATCH_PROBE_TIMEOUT_SECS").filter(|s| *s > 0) {
            cfg.probe_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "SITEWATCH_SHORT_REPORT_SECS").filter(|s| *s > 0) {
            cfg.short_report_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "SITEWATCH_LONG_REPORT_SECS").filter(|s| *s > 0) {
            cfg.long_report_interval = Duration::from_secs(secs);
        }

        cfg
    }
}

fn parse_var<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value {:?} for {}", raw, key);
            None
        }
    }
}
