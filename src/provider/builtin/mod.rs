//! # Built-in Providers
//!
//! Providers compiled into the binary and the function that registers them.
//!
//! Registration is explicit: the runtime calls
//! [`register_builtin_providers`] once against its registry and aborts
//! start-up on error.

mod fake;
mod kubernetes;

pub use fake::{FakeConfig, FakeProvider};
pub use kubernetes::{KubernetesAuth, KubernetesConfig, KubernetesProvider, KubernetesServer};

use crate::provider::Provider;
use crate::registry::{Registry, RegistryError};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Registry name of [`FakeProvider`]
pub const FAKE_PROVIDER: &str = "Fake";

/// Registry name of [`KubernetesProvider`]
pub const KUBERNETES_PROVIDER: &str = "Kubernetes";

/// Register every built-in provider with `registry`
///
/// `token_ttl` is the lifetime requested for service account tokens.
pub fn register_builtin_providers(
    registry: &Registry,
    token_ttl: Duration,
) -> Result<(), RegistryError> {
    let providers: [(&str, Arc<dyn Provider>); 2] = [
        (FAKE_PROVIDER, Arc::new(FakeProvider::new())),
        (KUBERNETES_PROVIDER, Arc::new(KubernetesProvider::new(token_ttl))),
    ];

    for (name, provider) in providers {
        let metadata = provider.metadata();
        registry.add(name, provider, metadata)?;
    }

    info!(providers = ?registry.names(), "Registered built-in providers");
    Ok(())
}
