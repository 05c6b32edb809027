//! # Resolvers
//!
//! Turn a selector (name + optional namespace + key) into a concrete value,
//! enforcing namespace isolation.
//!
//! Every resolver follows the same sequence:
//!
//! 1. Compute the effective namespace (selector namespace, else owner namespace)
//! 2. Reject a namespaced store whose selector names a foreign namespace
//! 3. Make exactly one backing-store call
//! 4. Extract the requested key
//!
//! Resolvers never retry and never cache. Retry policy belongs to the calling
//! provider.

pub mod backing;
mod context;
mod namespace;
mod secret;
mod token;

pub use backing::{BackingStore, KubeBackingStore, MemoryBackingStore};
pub use context::ResolveContext;
pub use namespace::{check_namespace_rule, effective_namespace};
pub use secret::{resolve_config_map_key, resolve_secret_key, SecretValue};
pub use token::generate_service_account_token;

use crate::crd::StoreScope;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the resolvers
///
/// Messages identify the referenced object and key but never carry a value.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "cross-namespace reference denied: {scope} store in namespace '{owner_namespace}' \
         cannot reference {kind} '{reference}' in namespace '{requested_namespace}'"
    )]
    CrossNamespaceViolation {
        scope: StoreScope,
        kind: &'static str,
        reference: String,
        owner_namespace: String,
        requested_namespace: String,
    },

    #[error("secret '{namespace}/{name}' not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("key '{key}' not found in secret '{namespace}/{name}'")]
    KeyNotFoundInSecret {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("configmap '{namespace}/{name}' not found")]
    ConfigMapNotFound { namespace: String, name: String },

    #[error("key '{key}' not found in configmap '{namespace}/{name}'")]
    KeyNotFoundInConfigMap {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("token request for service account '{namespace}/{name}' failed: {source}")]
    TokenRequestFailed {
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("backing store error: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("resolution cancelled")]
    Cancelled,

    #[error("resolution exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl ResolveError {
    /// Short label used for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::CrossNamespaceViolation { .. } => "cross_namespace_violation",
            ResolveError::SecretNotFound { .. } => "secret_not_found",
            ResolveError::KeyNotFoundInSecret { .. } => "key_not_found_in_secret",
            ResolveError::ConfigMapNotFound { .. } => "configmap_not_found",
            ResolveError::KeyNotFoundInConfigMap { .. } => "key_not_found_in_configmap",
            ResolveError::TokenRequestFailed { .. } => "token_request_failed",
            ResolveError::Backend(_) => "backend",
            ResolveError::Cancelled => "cancelled",
            ResolveError::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }

    #[must_use]
    pub fn is_cross_namespace_violation(&self) -> bool {
        matches!(self, ResolveError::CrossNamespaceViolation { .. })
    }
}
