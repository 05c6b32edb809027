//! # Secret Provider Registry
//!
//! Serves the provider capability table, the admission check for secret
//! stores, Prometheus metrics and health probes.
//!
//! Configuration comes from environment variables; see
//! [`secret_provider_registry::config::RuntimeConfig`].

use anyhow::Result;
use secret_provider_registry::config::RuntimeConfig;
use secret_provider_registry::runtime;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    let init = runtime::initialize(&config).await?;

    info!(
        port = config.metrics_port,
        providers = ?init.registry.names(),
        "Secret Provider Registry started"
    );

    let mut server_handle = init.server_handle;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received");
            init.server_state.set_ready(false);
            init.resolve_context.cancel();
            server_handle.abort();
        }
        result = &mut server_handle => {
            warn!("HTTP server stopped: {:?}", result);
            anyhow::bail!("HTTP server stopped unexpectedly");
        }
    }

    Ok(())
}
