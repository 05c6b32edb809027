//! # Store Validator
//!
//! Collects the selector checks of one store so provider adapters never
//! re-implement the namespace rule.
//!
//! ```rust,ignore
//! let mut validator = StoreValidator::new(store);
//! validator.secret("auth.token", &config.auth.token);
//! validator.finish()
//! ```

use super::kubernetes::validate_kubernetes_namespace;
use super::selector::{referent_state, validate_selector_shape, ValidationState};
use super::ValidationError;
use crate::crd::{
    ConfigMapSelector, ObjectSelector, SecretSelector, ServiceAccountSelector, StoreScope,
    StoreSpec,
};
use crate::observability::metrics;
use serde::Serialize;
use tracing::warn;

/// Successful validation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreValidation {
    /// `Ready`, or `Unknown` when a referent selector can only be decided at sync time
    pub state: ValidationState,
    pub warnings: Vec<String>,
}

impl StoreValidation {
    #[must_use]
    pub fn ready() -> Self {
        Self {
            state: ValidationState::Ready,
            warnings: Vec::new(),
        }
    }
}

impl Default for StoreValidation {
    fn default() -> Self {
        Self::ready()
    }
}

/// Accumulates selector checks for one store
#[derive(Debug)]
pub struct StoreValidator<'a> {
    store: &'a StoreSpec,
    state: ValidationState,
    warnings: Vec<String>,
    errors: Vec<ValidationError>,
}

impl<'a> StoreValidator<'a> {
    #[must_use]
    pub fn new(store: &'a StoreSpec) -> Self {
        Self {
            store,
            state: ValidationState::Ready,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> StoreScope {
        self.store.scope()
    }

    /// Check a Secret selector found at `field`
    pub fn secret(&mut self, field: &str, selector: &SecretSelector) -> &mut Self {
        self.selector(field, selector)
    }

    /// Check a ConfigMap selector found at `field`
    pub fn config_map(&mut self, field: &str, selector: &ConfigMapSelector) -> &mut Self {
        self.selector(field, selector)
    }

    /// Check a ServiceAccount selector found at `field`
    pub fn service_account(&mut self, field: &str, selector: &ServiceAccountSelector) -> &mut Self {
        self.selector(field, selector)
    }

    fn selector<S>(&mut self, field: &str, selector: &S) -> &mut Self
    where
        S: ObjectSelector + std::fmt::Display,
    {
        if let Err(err) = validate_selector_shape(selector, field) {
            self.errors.push(err);
            return self;
        }

        let reference = selector.to_string();
        self.namespace_rule(field, S::KIND, &reference, selector.namespace())
    }

    /// Check a bare namespace found at `field` that the provider reads `kind`
    /// objects from
    ///
    /// Same rule as a selector namespace: a namespaced store may only name
    /// its own namespace.
    pub fn namespace(&mut self, field: &str, kind: &'static str, namespace: &str) -> &mut Self {
        if let Err(err) = validate_kubernetes_namespace(namespace, field) {
            self.errors.push(err);
            return self;
        }
        let reference = format!("{namespace}/*");
        self.namespace_rule(field, kind, &reference, Some(namespace))
    }

    fn namespace_rule(
        &mut self,
        field: &str,
        kind: &'static str,
        reference: &str,
        requested: Option<&str>,
    ) -> &mut Self {
        let scope = self.store.scope();
        let owner = self.store.namespace.as_deref();
        match referent_state(scope, owner, requested) {
            ValidationState::Error => {
                warn!(
                    store = %self.store.name,
                    field,
                    reference,
                    "Rejected cross-namespace selector"
                );
                metrics::increment_namespace_violations("admission");
                self.errors.push(ValidationError::CrossNamespaceViolation {
                    scope,
                    kind,
                    reference: reference.to_string(),
                    owner_namespace: owner.unwrap_or_default().to_string(),
                    requested_namespace: requested.unwrap_or_default().to_string(),
                });
            }
            state => self.state = self.state.merge(state),
        }
        self
    }

    /// Record a non-blocking warning
    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    /// Record a provider-specific error
    pub fn error(&mut self, err: ValidationError) -> &mut Self {
        self.errors.push(err);
        self
    }

    /// `Err` if any check failed, otherwise the merged state and warnings
    pub fn finish(self) -> Result<StoreValidation, ValidationError> {
        if let Some(err) = ValidationError::from_errors(self.errors) {
            return Err(err);
        }
        Ok(StoreValidation {
            state: self.state,
            warnings: self.warnings,
        })
    }
}
