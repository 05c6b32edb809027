//! # Service Account Tokens
//!
//! Issue identity tokens for a ServiceAccount referenced by a selector.

use super::backing::BackingStore;
use super::namespace::effective_namespace;
use super::secret::{deny_cross_namespace, outcome};
use super::{ResolveContext, ResolveError};
use crate::crd::{ServiceAccountSelector, StoreScope};
use crate::observability::metrics;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Request a token for the ServiceAccount referenced by `selector`
///
/// `audiences` overrides the selector's own audiences when non-empty. The
/// namespace rule is the same as for secrets.
#[instrument(
    skip(ctx, backing, selector, audiences),
    fields(service_account = %selector.name, namespace = tracing::field::Empty)
)]
pub async fn generate_service_account_token(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &ServiceAccountSelector,
    audiences: &[String],
    ttl: Duration,
) -> Result<String, ResolveError> {
    let start = Instant::now();
    let result =
        generate_token_inner(ctx, backing, scope, owner_namespace, selector, audiences, ttl).await;
    metrics::record_resolution("token", outcome(&result), start.elapsed().as_secs_f64());
    result
}

async fn generate_token_inner(
    ctx: &ResolveContext,
    backing: &dyn BackingStore,
    scope: StoreScope,
    owner_namespace: &str,
    selector: &ServiceAccountSelector,
    audiences: &[String],
    ttl: Duration,
) -> Result<String, ResolveError> {
    let namespace = effective_namespace(selector.namespace.as_deref(), owner_namespace);
    tracing::Span::current().record("namespace", namespace);

    deny_cross_namespace(
        scope,
        owner_namespace,
        selector.namespace.as_deref(),
        "serviceaccount",
        &selector.to_string(),
    )?;

    let audiences = if audiences.is_empty() {
        selector.audiences.as_slice()
    } else {
        audiences
    };

    let token = ctx
        .run(async {
            backing
                .create_token(namespace, &selector.name, audiences, ttl)
                .await
                .map_err(|source| ResolveError::TokenRequestFailed {
                    namespace: namespace.to_string(),
                    name: selector.name.clone(),
                    source,
                })
        })
        .await?;

    if token.is_empty() {
        return Err(ResolveError::TokenRequestFailed {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
            source: anyhow::anyhow!("token request returned an empty token"),
        });
    }

    debug!(
        "Issued token for service account {}/{} (audiences={:?}, ttl={}s)",
        namespace,
        selector.name,
        audiences,
        ttl.as_secs()
    );
    Ok(token)
}
