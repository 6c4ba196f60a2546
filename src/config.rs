//! Application-level configuration loading for the game-play defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ARENA_CONFIG_PATH";

/// Baked-in steal buzzer window in seconds.
const DEFAULT_STEAL_WINDOW_SECS: u64 = 5;
/// Baked-in bonus for finding the tile-round keyword.
const DEFAULT_KEYWORD_BONUS: i32 = 40;
/// Baked-in SSE channel capacity.
const DEFAULT_SSE_CAPACITY: usize = 16;
/// Baked-in descending award schedule for the speed round.
const DEFAULT_SPEED_AWARDS: [i32; 3] = [30, 20, 10];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    steal_window_secs: u64,
    keyword_bonus: i32,
    sse_capacity: usize,
    speed_awards: Vec<i32>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        steal_window_secs = app_config.steal_window_secs,
                        keyword_bonus = app_config.keyword_bonus,
                        "loaded game-play defaults from config"
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

    /// Duration of the steal-round buzzer window.
    pub fn steal_window(&self) -> Duration {
        Duration::from_secs(self.steal_window_secs)
    }

    /// Bonus awarded for finding the tile-round keyword, used when the
    /// competition payload does not set one.
    pub fn keyword_bonus(&self) -> i32 {
        self.keyword_bonus
    }

    /// Broadcast channel capacity for both SSE hubs.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Descending award schedule for the speed round, used when the
    /// competition payload does not set one.
    pub fn speed_awards(&self) -> &[i32] {
        &self.speed_awards
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            steal_window_secs: DEFAULT_STEAL_WINDOW_SECS,
            keyword_bonus: DEFAULT_KEYWORD_BONUS,
            sse_capacity: DEFAULT_SSE_CAPACITY,
            speed_awards: DEFAULT_SPEED_AWARDS.to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    steal_window_secs: Option<u64>,
    keyword_bonus: Option<i32>,
    sse_capacity: Option<usize>,
    speed_awards: Option<Vec<i32>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            steal_window_secs: value
                .steal_window_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.steal_window_secs),
            keyword_bonus: value
                .keyword_bonus
                .filter(|bonus| *bonus > 0)
                .unwrap_or(defaults.keyword_bonus),
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_capacity),
            speed_awards: value
                .speed_awards
                .filter(|awards| {
                    !awards.is_empty()
                        && awards.iter().all(|award| *award > 0)
                        && awards.windows(2).all(|pair| pair[0] > pair[1])
                })
                .unwrap_or(defaults.speed_awards),
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
