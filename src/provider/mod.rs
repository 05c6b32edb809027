//! # Provider Contract
//!
//! Every secret backend adapter implements [`Provider`]. The registry stores
//! providers by name; reconcilers look them up and call
//! [`Provider::new_client`] to obtain a [`SecretsClient`] bound to one store
//! and one consumer namespace.
//!
//! Providers never re-implement the namespace rule. Their
//! [`Provider::validate_store`] goes through
//! [`crate::validation::StoreValidator`] and their `new_client` through the
//! resolvers in [`crate::resolver`].

use crate::crd::StoreSpec;
use crate::resolver::{BackingStore, ResolveContext, ResolveError, SecretValue};
use crate::validation::{StoreValidation, ValidationError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub mod builtin;
pub mod metadata;

pub use metadata::{
    ApiCapabilities, Capability, CapabilityClass, CapabilityName, MaintenanceStatus, Metadata,
    Stability,
};

/// Errors returned by provider clients
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("operation {0} is not supported by this provider")]
    Unsupported(CapabilityName),

    #[error("remote key '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("provider backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Client bound to one store and one consumer namespace
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Value of a single remote key
    async fn get_secret(&self, key: &str) -> Result<SecretValue, ClientError>;

    /// All fields of a remote key that holds a map
    async fn get_secret_map(&self, key: &str) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        let _ = key;
        Err(ClientError::Unsupported(CapabilityName::GetSecretMap))
    }

    /// Every remote key whose name starts with `prefix`
    async fn get_all_secrets(
        &self,
        prefix: &str,
    ) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        let _ = prefix;
        Err(ClientError::Unsupported(CapabilityName::GetAllSecrets))
    }

    async fn push_secret(&self, key: &str, value: SecretValue) -> Result<(), ClientError> {
        let _ = (key, value);
        Err(ClientError::Unsupported(CapabilityName::PushSecret))
    }

    async fn delete_secret(&self, key: &str) -> Result<(), ClientError> {
        let _ = key;
        Err(ClientError::Unsupported(CapabilityName::DeleteSecret))
    }

    /// Check the client can reach its backend
    async fn validate(&self) -> Result<(), ClientError> {
        Ok(())
    }

    /// Release resources held by the client
    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// A secret backend adapter
#[async_trait]
pub trait Provider: Send + Sync {
    /// Metadata the provider is registered with
    fn metadata(&self) -> Metadata;

    /// Coarse read/write set
    fn capabilities(&self) -> ApiCapabilities {
        self.metadata().api_capabilities()
    }

    fn maintenance_status(&self) -> MaintenanceStatus {
        self.metadata().maintenance_status()
    }

    /// Build a client for `store`, consumed from `namespace`
    ///
    /// Credential selectors are resolved here, on every call, against the
    /// consumer namespace.
    async fn new_client(
        &self,
        ctx: &ResolveContext,
        store: &StoreSpec,
        backing: Arc<dyn BackingStore>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ClientError>;

    /// Admission-time validation of `store`
    ///
    /// `Ok` carries `Ready` or `Unknown` (deferred referent selectors) plus
    /// warnings.
    ///
    /// Admission trusts this result: the namespace rule is applied only to
    /// what the provider hands to [`crate::validation::StoreValidator`].
    /// Every selector in the config, and every bare namespace the provider
    /// reads from (such as a remote namespace), must go through it. The same
    /// references must be resolved with the [`crate::resolver`] functions in
    /// `new_client` so the rule holds again at sync time.
    fn validate_store(&self, store: &StoreSpec) -> Result<StoreValidation, ValidationError>;
}
