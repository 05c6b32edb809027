//! # Namespace Rule
//!
//! The single rule every resolver and validator applies: a namespaced store
//! may only reference objects in its own namespace. Cluster-scoped stores may
//! name any namespace, or omit it and defer to the consumer's namespace.

use super::ResolveError;
use crate::crd::StoreScope;

/// Namespace a selector resolves against
#[must_use]
pub fn effective_namespace<'a>(selector_namespace: Option<&'a str>, owner_namespace: &'a str) -> &'a str {
    selector_namespace.unwrap_or(owner_namespace)
}

/// Reject a namespaced store whose selector names a namespace other than its own
///
/// `kind` and `reference` only feed the error message.
pub fn check_namespace_rule(
    scope: StoreScope,
    owner_namespace: &str,
    selector_namespace: Option<&str>,
    kind: &'static str,
    reference: &str,
) -> Result<(), ResolveError> {
    match (scope, selector_namespace) {
        (StoreScope::Namespaced, Some(requested)) if requested != owner_namespace => {
            Err(ResolveError::CrossNamespaceViolation {
                scope,
                kind,
                reference: reference.to_string(),
                owner_namespace: owner_namespace.to_string(),
                requested_namespace: requested.to_string(),
            })
        }
        _ => Ok(()),
    }
}
