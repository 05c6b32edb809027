//! # Admission
//!
//! Turns a store into an allow/deny decision for an admission webhook.
//!
//! The provider's own `validate_store` decides which selectors are checked;
//! see [`crate::provider::Provider::validate_store`] for the contract.

use super::{ValidationError, ValidationState};
use crate::crd::StoreSpec;
use crate::observability::metrics;
use crate::registry::Registry;
use serde::Serialize;
use tracing::{debug, info};

/// Admission decision for one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionVerdict {
    pub allowed: bool,
    pub state: ValidationState,
    pub warnings: Vec<String>,
    /// Rejection reason; `None` when allowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionVerdict {
    fn allow(state: ValidationState, warnings: Vec<String>) -> Self {
        Self {
            allowed: true,
            state,
            warnings,
            message: None,
        }
    }

    fn deny(err: &ValidationError) -> Self {
        Self {
            allowed: false,
            state: ValidationState::Error,
            warnings: Vec::new(),
            message: Some(err.to_string()),
        }
    }
}

/// Validate `store` with the provider its spec names
///
/// `Error` blocks admission; `Unknown` and `Ready` allow it.
pub fn validate_store(registry: &Registry, store: &StoreSpec) -> AdmissionVerdict {
    let verdict = match registry.fetch(&store.provider.kind) {
        None => AdmissionVerdict::deny(&ValidationError::UnknownProvider(
            store.provider.kind.clone(),
        )),
        Some(provider) => match provider.validate_store(store) {
            Ok(validation) => AdmissionVerdict::allow(validation.state, validation.warnings),
            Err(err) => AdmissionVerdict::deny(&err),
        },
    };

    metrics::record_store_validation(verdict.state.as_str());
    if verdict.allowed {
        debug!(
            store = %store.name,
            provider = %store.provider.kind,
            state = %verdict.state,
            "Store admitted"
        );
    } else {
        info!(
            store = %store.name,
            provider = %store.provider.kind,
            reason = verdict.message.as_deref().unwrap_or_default(),
            "Store rejected"
        );
    }
    verdict
}
