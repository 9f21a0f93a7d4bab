//! Application-level configuration loading, including the optional song catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::dao::game_store::CatalogSeed;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SONG_GUESS_BACK_CONFIG_PATH";

const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_TOTAL_ROUNDS: u8 = 10;
const DEFAULT_WIN_THRESHOLD_PERCENT: u8 = 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    session_timeout: Duration,
    default_total_rounds: u8,
    win_threshold_percent: u8,
    catalog_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        timeout_secs = config.session_timeout.as_secs(),
                        default_total_rounds = config.default_total_rounds,
                        "loaded configuration"
                    );
                    config
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

    /// Idle time after which an active session is abandoned.
    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Rounds used when a start request does not name a count.
    pub fn default_total_rounds(&self) -> u8 {
        self.default_total_rounds
    }

    /// Minimum score ratio, in percent, for a completed game to count as won.
    pub fn win_threshold_percent(&self) -> u8 {
        self.win_threshold_percent
    }

    pub fn catalog_path(&self) -> Option<&PathBuf> {
        self.catalog_path.as_ref()
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Read the catalog file named by `catalogPath`.
    ///
    /// Returns `None` when no catalog is configured or the file cannot be used;
    /// failures are logged rather than aborting startup.
    pub fn load_catalog(&self) -> Option<CatalogSeed> {
        let path = self.catalog_path.as_ref()?;
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read song catalog");
                return None;
            }
        };
        match serde_json::from_str::<CatalogSeed>(&contents) {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to parse song catalog");
                None
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            default_total_rounds: DEFAULT_TOTAL_ROUNDS,
            win_threshold_percent: DEFAULT_WIN_THRESHOLD_PERCENT,
            catalog_path: None,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    session_timeout_secs: Duration,
    #[serde(default = "default_total_rounds")]
    default_total_rounds: u8,
    #[serde(default = "default_win_threshold")]
    win_threshold_percent: u8,
    #[serde(default)]
    catalog_path: Option<PathBuf>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS)
}

fn default_total_rounds() -> u8 {
    DEFAULT_TOTAL_ROUNDS
}

fn default_win_threshold() -> u8 {
    DEFAULT_WIN_THRESHOLD_PERCENT
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            session_timeout: value.session_timeout_secs,
            default_total_rounds: value.default_total_rounds.clamp(1, 20),
            win_threshold_percent: value.win_threshold_percent.min(100),
            catalog_path: value.catalog_path,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
