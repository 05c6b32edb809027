//! # Runtime Configuration
//!
//! Settings loaded from environment variables.

use crate::constants::{
    DEFAULT_METRICS_PORT, DEFAULT_POD_NAMESPACE, DEFAULT_RESOLVE_TIMEOUT_SECS,
    DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_SECS,
    MIN_TOKEN_TTL_SECS,
};
use crate::resolver::ResolveContext;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Text => f.write_str("text"),
        }
    }
}

/// Process-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// HTTP port for `/metrics`, `/healthz`, `/readyz` and `/providers`
    pub metrics_port: u16,
    /// Namespace the service runs in
    pub pod_namespace: String,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    /// Used when `RUST_LOG` is not set
    pub log_level: String,
    pub log_format: LogFormat,
    /// Deadline for a single resolver call (seconds)
    pub resolve_timeout_secs: u64,
    /// Lifetime requested for ServiceAccount tokens (seconds)
    /// Raised to the API server minimum if set lower
    pub default_token_ttl_secs: u64,
    pub enable_metrics: bool,
    /// How long to wait for the HTTP server to bind (seconds)
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server (milliseconds)
    pub server_poll_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            pod_namespace: DEFAULT_POD_NAMESPACE.to_string(),
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
            default_token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            enable_metrics: true,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            metrics_port: var_or_default(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
            pod_namespace: var_or_default_str(&lookup, "POD_NAMESPACE", DEFAULT_POD_NAMESPACE),
            log_level: var_or_default_str(&lookup, "LOG_LEVEL", "INFO"),
            log_format: var_or_default(&lookup, "LOG_FORMAT", LogFormat::Json),
            resolve_timeout_secs: var_or_default(
                &lookup,
                "RESOLVE_TIMEOUT_SECS",
                DEFAULT_RESOLVE_TIMEOUT_SECS,
            ),
            default_token_ttl_secs: var_or_default(
                &lookup,
                "DEFAULT_TOKEN_TTL_SECS",
                DEFAULT_TOKEN_TTL_SECS,
            )
            .max(MIN_TOKEN_TTL_SECS),
            enable_metrics: var_or_default_bool(&lookup, "ENABLE_METRICS", true),
            server_startup_timeout_secs: var_or_default(
                &lookup,
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: var_or_default(
                &lookup,
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }

    /// Get resolver deadline; `None` when set to 0
    #[must_use]
    pub fn resolve_timeout(&self) -> Option<Duration> {
        (self.resolve_timeout_secs > 0).then(|| Duration::from_secs(self.resolve_timeout_secs))
    }

    /// Root context for resolver calls, carrying the configured deadline
    #[must_use]
    pub fn resolve_context(&self) -> ResolveContext {
        let ctx = ResolveContext::background();
        match self.resolve_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Get ServiceAccount token lifetime
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.default_token_ttl_secs)
    }

    /// Get server startup timeout duration
    #[must_use]
    pub fn server_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.server_startup_timeout_secs)
    }

    /// Get server poll interval duration
    #[must_use]
    pub fn server_poll_interval(&self) -> Duration {
        Duration::from_millis(self.server_poll_interval_ms)
    }
}

/// Read variable or return default value
fn var_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read variable as boolean or return default
fn var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read variable as string or return default
fn var_or_default_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}
