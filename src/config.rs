//! Runtime configuration, read once from the environment at startup.

use std::env;
use std::time::Duration;

use anyhow::Context;

/// Default backend URL if not specified via environment variable.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default port for the view server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default snapshot cache location.
pub const DEFAULT_DB_PATH: &str = "sqlite:camwatch.db?mode=rwc";

/// Default stream list poll interval in seconds.
pub const DEFAULT_STREAM_POLL_SECS: u64 = 10;

/// Settings for the backend client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST backend, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    /// Applied to every request.
    pub timeout: Duration,
    /// Log method, URL and bodies of every request.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            debug: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ClientConfig,
    /// Base URL of the streaming service (without `/v1/streams`).
    pub stream_api_url: String,
    pub port: u16,
    pub database_url: String,
    /// Storage ceiling reported in the dashboard stats.
    pub storage_total_gb: f64,
    /// Periodic dashboard refresh; `None` disables it.
    pub refresh_interval: Option<Duration>,
    pub stream_poll_interval: Duration,
}

impl Config {
    /// Load configuration from `CAMWATCH_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CAMWATCH_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_ms = parse_or(&lookup, "CAMWATCH_API_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        let debug = lookup("CAMWATCH_DEBUG")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let stream_api_url = lookup("CAMWATCH_STREAM_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                base_url
                    .strip_suffix("/api")
                    .unwrap_or(&base_url)
                    .to_string()
            });

        let port = parse_or(&lookup, "CAMWATCH_PORT", DEFAULT_PORT)?;
        let database_url =
            lookup("CAMWATCH_DATABASE_URL").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let storage_total_gb = parse_or(
            &lookup,
            "CAMWATCH_STORAGE_TOTAL_GB",
            crate::aggregation::DEFAULT_STORAGE_TOTAL_GB,
        )?;
        let refresh_secs: u64 = parse_or(&lookup, "CAMWATCH_REFRESH_SECS", 0)?;
        let poll_secs: u64 =
            parse_or(&lookup, "CAMWATCH_STREAM_POLL_SECS", DEFAULT_STREAM_POLL_SECS)?;

        if timeout_ms == 0 {
            anyhow::bail!("CAMWATCH_API_TIMEOUT_MS must be greater than zero");
        }
        if poll_secs == 0 {
            anyhow::bail!("CAMWATCH_STREAM_POLL_SECS must be greater than zero");
        }

        Ok(Self {
            api: ClientConfig {
                base_url,
                timeout: Duration::from_millis(timeout_ms),
                debug,
            },
            stream_api_url,
            port,
            database_url,
            storage_total_gb,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            stream_poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
