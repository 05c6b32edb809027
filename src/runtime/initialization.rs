//! # Initialization
//!
//! Start-up sequence including rustls setup, tracing, metrics, built-in
//! provider registration and server startup.

use crate::config::{LogFormat, RuntimeConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::observability::metrics;
use crate::provider::builtin::register_builtin_providers;
use crate::registry::Registry;
use crate::resolver::ResolveContext;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Components built at start-up
pub struct InitializationResult {
    /// Populated provider registry
    pub registry: Arc<Registry>,
    /// Root context handed to provider clients; cancelled on shutdown
    pub resolve_context: ResolveContext,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// Background HTTP server task
    pub server_handle: JoinHandle<()>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("registry", &self.registry)
            .field("resolve_timeout", &self.resolve_context.timeout())
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.log_level`. Calling twice is harmless.
pub fn init_tracing(config: &RuntimeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "secret_provider_registry={}",
                config.log_level.to_lowercase()
            ))
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if let Err(e) = result {
        debug!("Tracing subscriber already initialized: {}", e);
    }
}

/// Initialize the service runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - Built-in provider registration (fails start-up on error)
/// - HTTP server startup
pub async fn initialize(config: &RuntimeConfig) -> Result<InitializationResult> {
    // Must happen before anything opens a TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    init_tracing(config);

    info!("Starting Secret Provider Registry");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    if config.enable_metrics {
        metrics::register_metrics().context("Failed to register metrics")?;
    }

    let registry = Arc::new(Registry::new());
    register_builtin_providers(&registry, config.token_ttl())
        .context("Failed to register built-in providers")?;
    let resolve_context = config.resolve_context();
    info!(
        providers = registry.len(),
        pod_namespace = %config.pod_namespace,
        resolve_timeout = ?resolve_context.timeout(),
        "Provider registry ready"
    );

    let server_state = Arc::new(ServerState::new(Arc::clone(&registry)));

    let port = config.metrics_port;
    let state = Arc::clone(&server_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(&server_state, &server_handle, config).await?;

    Ok(InitializationResult {
        registry,
        resolve_context,
        server_state,
        server_handle,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &JoinHandle<()>,
    config: &RuntimeConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout();
    let poll_interval = config.server_poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
