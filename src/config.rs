//! Server configuration from environment variables.
//!
//! `PORT` (default 3030), `TICK_INTERVAL_MS` (default 1000), `STATE_FILE` (default
//! `market_state.json`), `SEED_DEMO` (default true; seeds the demo market when no state
//! file exists).

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_STATE_FILE: &str = "market_state.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_interval: Duration,
    pub state_file: PathBuf,
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            seed_demo: true,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Load from env; unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. For tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let tick_interval = lookup("TICK_INTERVAL_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);
        let state_file = lookup("STATE_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.state_file);
        let seed_demo = lookup("SEED_DEMO")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.seed_demo);
        Self {
            port,
            tick_interval,
            state_file,
            seed_demo,
        }
    }
}
