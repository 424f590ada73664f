//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::learning::progress::TODAY_TASK_LIMIT;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the persisted state record.
    pub data_dir: PathBuf,
    /// Port for the HTTP/WebSocket server.
    pub port: u16,
    /// Generation timing.
    pub generation: GenerationConfig,
    /// How many incomplete tasks the dashboard shows for today.
    pub today_task_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            port: 8080,
            generation: GenerationConfig::default(),
            today_task_limit: TODAY_TASK_LIMIT,
        }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_dir = std::env::var("SKILLROUTE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let port = env_or("SKILLROUTE_PORT", defaults.port);

        let latency_ms = env_or(
            "SKILLROUTE_GENERATION_LATENCY_MS",
            defaults.generation.latency.as_millis() as u64,
        );
        let timeout_secs = env_or(
            "SKILLROUTE_GENERATION_TIMEOUT_SECS",
            defaults.generation.timeout.as_secs(),
        );

        let today_task_limit = env_or("SKILLROUTE_TODAY_TASKS", defaults.today_task_limit);

        Self {
            data_dir,
            port,
            generation: GenerationConfig {
                latency: Duration::from_millis(latency_ms),
                timeout: Duration::from_secs(timeout_secs),
            },
            today_task_limit,
        }
    }

    /// Reject values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SKILLROUTE_GENERATION_TIMEOUT_SECS".to_string(),
                message: "must be at least one second".to_string(),
            });
        }
        if self.today_task_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SKILLROUTE_TODAY_TASKS".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Timing for learning path generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    /// Simulated latency of the stub generator.
    pub latency: Duration,
    /// Upper bound on a single generation call.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, fallback = %default, "Ignoring malformed config value");
        default
    })
}
