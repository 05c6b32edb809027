//! # Validation
//!
//! Admission-time checks for secret stores.
//!
//! Providers validate their store configuration through [`StoreValidator`],
//! which applies the shared namespace rule from [`crate::resolver`] and the
//! RFC 1123 shape checks. [`admission::validate_store`] is the entry point a
//! webhook calls: it looks the provider up in the registry and turns the
//! provider's answer into an [`AdmissionVerdict`].

pub mod admission;
mod kubernetes;
mod selector;
mod store;

pub use admission::{validate_store, AdmissionVerdict};
pub use kubernetes::{validate_data_key, validate_kubernetes_name, validate_kubernetes_namespace};
pub use selector::{
    validate_referent_secret_selector, validate_secret_selector, validate_selector_shape,
    ValidationState,
};
pub use store::{StoreValidation, StoreValidator};

use crate::crd::StoreScope;
use crate::resolver::ResolveError;
use thiserror::Error;

/// Errors returned by store validation
///
/// Messages name the selector and the reason, never a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "{scope} store in namespace '{owner_namespace}' cannot reference {kind} '{reference}' \
         in namespace '{requested_namespace}'"
    )]
    CrossNamespaceViolation {
        scope: StoreScope,
        kind: &'static str,
        reference: String,
        owner_namespace: String,
        requested_namespace: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidSelector { field: String, reason: String },

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid store: {0}")]
    InvalidStore(String),

    #[error("{}", join_errors(.0))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    #[must_use]
    pub fn is_cross_namespace_violation(&self) -> bool {
        match self {
            ValidationError::CrossNamespaceViolation { .. } => true,
            ValidationError::Multiple(errors) => {
                errors.iter().any(ValidationError::is_cross_namespace_violation)
            }
            _ => false,
        }
    }

    /// Collapse a list of errors; `None` when empty
    #[must_use]
    pub fn from_errors(mut errors: Vec<ValidationError>) -> Option<ValidationError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ValidationError::Multiple(errors)),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ResolveError> for ValidationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::CrossNamespaceViolation {
                scope,
                kind,
                reference,
                owner_namespace,
                requested_namespace,
            } => ValidationError::CrossNamespaceViolation {
                scope,
                kind,
                reference,
                owner_namespace,
                requested_namespace,
            },
            other => ValidationError::InvalidStore(other.to_string()),
        }
    }
}
