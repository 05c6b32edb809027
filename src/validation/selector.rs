//! # Selector Validation
//!
//! Admission-time form of the namespace rule.
//!
//! [`validate_secret_selector`] is used when both the store's namespace and the
//! selector's namespace are known. [`validate_referent_secret_selector`] is
//! used when validating a store before any consumer exists, so a
//! cluster-scoped selector without a namespace cannot be decided yet.

use super::kubernetes::{validate_data_key, validate_kubernetes_name, validate_kubernetes_namespace};
use super::ValidationError;
use crate::crd::{ObjectSelector, SecretSelector, StoreScope};
use crate::resolver::check_namespace_rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of validating a selector before its consumer is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationState {
    /// Fully determinable now and valid
    Ready,
    /// Valid to defer; decided against the consumer namespace at sync time
    Unknown,
    /// Invalid; must block admission
    Error,
}

impl ValidationState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Ready => "Ready",
            ValidationState::Unknown => "Unknown",
            ValidationState::Error => "Error",
        }
    }

    /// Whether admission may proceed
    #[must_use]
    pub fn allows_admission(&self) -> bool {
        !matches!(self, ValidationState::Error)
    }

    /// Combine two states; `Error` dominates `Unknown`, which dominates `Ready`
    #[must_use]
    pub fn merge(self, other: ValidationState) -> ValidationState {
        self.max(other)
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check `selector` against a store whose namespace is known
///
/// Works for both scopes: cluster-scoped stores always pass.
pub fn validate_secret_selector(
    scope: StoreScope,
    owner_namespace: &str,
    selector: &SecretSelector,
) -> Result<(), ValidationError> {
    check_namespace_rule(
        scope,
        owner_namespace,
        selector.namespace.as_deref(),
        SecretSelector::KIND,
        &selector.to_string(),
    )
    .map_err(ValidationError::from)
}

/// Decide a secret selector before the consumer namespace is known
///
/// `owner_namespace` is the store's own namespace (`None` for cluster-scoped
/// stores).
#[must_use]
pub fn validate_referent_secret_selector(
    scope: StoreScope,
    owner_namespace: Option<&str>,
    selector: &SecretSelector,
) -> ValidationState {
    referent_state(scope, owner_namespace, selector.namespace.as_deref())
}

pub(crate) fn referent_state(
    scope: StoreScope,
    owner_namespace: Option<&str>,
    selector_namespace: Option<&str>,
) -> ValidationState {
    match (scope, selector_namespace) {
        (StoreScope::ClusterScoped, None) => ValidationState::Unknown,
        (StoreScope::ClusterScoped, Some(_)) | (StoreScope::Namespaced, None) => {
            ValidationState::Ready
        }
        (StoreScope::Namespaced, Some(requested)) => {
            if owner_namespace == Some(requested) {
                ValidationState::Ready
            } else {
                ValidationState::Error
            }
        }
    }
}

/// Check the selector's name, namespace and key are well-formed
///
/// `field` is the path of the selector inside the store spec and prefixes
/// every error.
pub fn validate_selector_shape<S: ObjectSelector>(
    selector: &S,
    field: &str,
) -> Result<(), ValidationError> {
    validate_kubernetes_name(selector.name(), &format!("{field}.name"))?;
    if let Some(namespace) = selector.namespace() {
        validate_kubernetes_namespace(namespace, &format!("{field}.namespace"))?;
    }
    if let Some(key) = selector.key() {
        validate_data_key(key, &format!("{field}.key"))?;
    }
    Ok(())
}
