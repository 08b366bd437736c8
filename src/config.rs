//! Application-level configuration loading: game identity, symbol set and timings.

use std::{collections::HashSet, env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MEMORY_MATCH_CONFIG_PATH";

const DEFAULT_GAME_ID: &str = "memory";
const DEFAULT_GUEST_NAME: &str = "Guest";
const DEFAULT_SYMBOLS: [&str; 8] = ["🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼"];
const DEFAULT_MISMATCH_DELAY_MS: u64 = 1_000;
const DEFAULT_COMPLETION_NOTICE_DELAY_MS: u64 = 500;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Identifier under which scores and high scores are stored.
    pub game_id: String,
    /// Distinct card faces; the deck holds two of each.
    pub symbols: Vec<String>,
    /// How long a mismatched pair stays face up.
    pub mismatch_delay: Duration,
    /// Pause between the last match and the completion notice.
    pub completion_notice_delay: Duration,
    /// Period of the session clock.
    pub tick_interval: Duration,
    /// Username written for anonymous players.
    pub guest_name: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        game_id = %app_config.game_id,
                        symbols = app_config.symbols.len(),
                        "loaded game configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game_id: DEFAULT_GAME_ID.to_string(),
            symbols: default_symbols(),
            mismatch_delay: Duration::from_millis(DEFAULT_MISMATCH_DELAY_MS),
            completion_notice_delay: Duration::from_millis(DEFAULT_COMPLETION_NOTICE_DELAY_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            guest_name: DEFAULT_GUEST_NAME.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Every field is optional.
struct RawConfig {
    game_id: Option<String>,
    symbols: Option<Vec<String>>,
    mismatch_delay_ms: Option<u64>,
    completion_notice_delay_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    guest_name: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let symbols = match value.symbols {
            Some(symbols) if valid_symbols(&symbols) => symbols,
            Some(symbols) => {
                warn!(
                    count = symbols.len(),
                    "symbol set is empty or has duplicates; using built-in symbols"
                );
                defaults.symbols
            }
            None => defaults.symbols,
        };

        Self {
            game_id: value
                .game_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.game_id),
            symbols,
            mismatch_delay: value
                .mismatch_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.mismatch_delay),
            completion_notice_delay: value
                .completion_notice_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.completion_notice_delay),
            tick_interval: value
                .tick_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            guest_name: value.guest_name.unwrap_or(defaults.guest_name),
        }
    }
}

fn valid_symbols(symbols: &[String]) -> bool {
    let mut seen = HashSet::new();
    !symbols.is_empty() && symbols.iter().all(|symbol| seen.insert(symbol.as_str()))
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in symbol set shipped with the binary.
fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}
