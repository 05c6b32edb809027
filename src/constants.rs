//! # Constants
//!
//! Shared defaults used throughout the service.
//!
//! These values can be overridden via environment variables where
//! applicable (see [`crate::config::RuntimeConfig`]).

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default deadline for a single resolver call (seconds)
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 30;

/// Default lifetime requested for ServiceAccount tokens (seconds)
/// The API server rejects expirations below 10 minutes
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 600;

/// Minimum ServiceAccount token lifetime accepted by the API server (seconds)
pub const MIN_TOKEN_TTL_SECS: u64 = 600;

/// Namespace used when `POD_NAMESPACE` is not set
pub const DEFAULT_POD_NAMESPACE: &str = "external-secrets";

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "secret_provider_registry=info";
