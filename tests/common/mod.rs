//! Shared helpers for integration tests

#![allow(dead_code, reason = "not every test binary uses every helper")]

use async_trait::async_trait;
use secret_provider_registry::crd::{ProviderSpec, StoreSpec};
use secret_provider_registry::provider::{
    CapabilityName, ClientError, Metadata, Provider, SecretsClient, Stability,
};
use secret_provider_registry::resolver::{BackingStore, ResolveContext, SecretValue};
use secret_provider_registry::validation::{StoreValidation, ValidationError};
use std::sync::Arc;

/// Provider with fixed metadata whose clients return a constant value
#[derive(Debug)]
pub struct StaticProvider {
    pub metadata: Metadata,
}

impl StaticProvider {
    pub fn new(stability: Stability, capabilities: &[CapabilityName]) -> Self {
        Self {
            metadata: Metadata::new(stability).with_capabilities(capabilities.iter().copied()),
        }
    }

    pub fn read_only() -> Self {
        Self::new(Stability::Stable, &[CapabilityName::GetSecret])
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    async fn new_client(
        &self,
        _ctx: &ResolveContext,
        _store: &StoreSpec,
        _backing: Arc<dyn BackingStore>,
        _namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ClientError> {
        Ok(Box::new(StaticClient))
    }

    fn validate_store(&self, _store: &StoreSpec) -> Result<StoreValidation, ValidationError> {
        Ok(StoreValidation::ready())
    }
}

struct StaticClient;

#[async_trait]
impl SecretsClient for StaticClient {
    async fn get_secret(&self, _key: &str) -> Result<SecretValue, ClientError> {
        Ok(SecretValue::from("static"))
    }
}

/// Namespaced Kubernetes store with the given provider config
pub fn kubernetes_store(namespace: &str, config: serde_json::Value) -> StoreSpec {
    StoreSpec::namespaced("k8s", namespace, ProviderSpec::new("Kubernetes", config))
}

/// Cluster-scoped Kubernetes store with the given provider config
pub fn cluster_kubernetes_store(config: serde_json::Value) -> StoreSpec {
    StoreSpec::cluster("k8s", ProviderSpec::new("Kubernetes", config))
}
