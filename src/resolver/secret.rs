//! # Secret and ConfigMap Resolution
//!
//! Resolve a single key from a Secret or ConfigMap referenced by a selector.

use super::backing::BackingStore;
use super::namespace::{check_namespace_rule, effective_namespace};
use super::{ResolveContext, ResolveError};
use crate::crd::{ConfigMapSelector, SecretSelector, StoreScope};
use crate::observability::metrics;
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// A resolved value
///
/// The buffer is wiped on drop and `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Zeroizing<Vec<u8>>);

impl SecretValue {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Value as UTF-8, `None` if it is binary
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(<redacted {} bytes>)", self.0.len())
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        SecretValue::new(value.as_bytes().to_vec())
    }
}

/// Resolve `selector.key` from a Kubernetes Secret
///
/// A namespaced store referencing a Secret outside `owner_namespace` fails
/// with [`ResolveError::CrossNamespaceViolation`] before the backing store is
/// queried.
#[instrument(
    skip(ctx, backing, selector),
    fields(secret = %selector.name, key = %selector.key, namespace = tracing::field::Empty)
)]
pub async fn resolve_secret_key(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &SecretSelector,
) -> Result<SecretValue, ResolveError> {
    let start = Instant::now();
    let result = resolve_secret_key_inner(ctx, backing, scope, owner_namespace, selector).await;
    metrics::record_resolution("secret", outcome(&result), start.elapsed().as_secs_f64());
    result
}

async fn resolve_secret_key_inner(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &SecretSelector,
) -> Result<SecretValue, ResolveError> {
    let namespace = effective_namespace(selector.namespace.as_deref(), owner_namespace);
    tracing::Span::current().record("namespace", namespace);

    deny_cross_namespace(
        scope,
        owner_namespace,
        selector.namespace.as_deref(),
        "secret",
        &selector.to_string(),
    )?;

    let data = ctx
        .run(async {
            backing
                .get_secret(namespace, &selector.name)
                .await
                .map_err(ResolveError::Backend)
        })
        .await?
        .ok_or_else(|| ResolveError::SecretNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        })?;

    let value = data
        .get(&selector.key)
        .ok_or_else(|| ResolveError::KeyNotFoundInSecret {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        })?;

    debug!("Resolved secret key {}/{}#{}", namespace, selector.name, selector.key);
    Ok(SecretValue::new(value.clone()))
}

/// Resolve `selector.key` from a Kubernetes ConfigMap
///
/// Same namespace rule as [`resolve_secret_key`].
#[instrument(
    skip(ctx, backing, selector),
    fields(configmap = %selector.name, key = %selector.key, namespace = tracing::field::Empty)
)]
pub async fn resolve_config_map_key(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &ConfigMapSelector,
) -> Result<SecretValue, ResolveError> {
    let start = Instant::now();
    let result = resolve_config_map_key_inner(ctx, backing, scope, owner_namespace, selector).await;
    metrics::record_resolution("configmap", outcome(&result), start.elapsed().as_secs_f64());
    result
}

async fn resolve_config_map_key_inner(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &ConfigMapSelector,
) -> Result<SecretValue, ResolveError> {
    let namespace = effective_namespace(selector.namespace.as_deref(), owner_namespace);
    tracing::Span::current().record("namespace", namespace);

    deny_cross_namespace(
        scope,
        owner_namespace,
        selector.namespace.as_deref(),
        "configmap",
        &selector.to_string(),
    )?;

    let data = ctx
        .run(async {
            backing
                .get_config_map(namespace, &selector.name)
                .await
                .map_err(ResolveError::Backend)
        })
        .await?
        .ok_or_else(|| ResolveError::ConfigMapNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        })?;

    let value = data
        .get(&selector.key)
        .ok_or_else(|| ResolveError::KeyNotFoundInConfigMap {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        })?;

    debug!("Resolved configmap key {}/{}#{}", namespace, selector.name, selector.key);
    Ok(SecretValue::new(value.clone()))
}

/// Apply the namespace rule, logging and counting denials
pub(super) fn deny_cross_namespace(
    scope: StoreScope,
    owner_namespace: &str,
    selector_namespace: Option<&str>,
    kind: &'static str,
    reference: &str,
) -> Result<(), ResolveError> {
    check_namespace_rule(scope, owner_namespace, selector_namespace, kind, reference).inspect_err(
        |e| {
            warn!("{}", e);
            metrics::increment_namespace_violations("runtime");
        },
    )
}

pub(super) fn outcome<T>(result: &Result<T, ResolveError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}
