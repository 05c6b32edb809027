//! # Resolver Tests
//!
//! These tests verify:
//! - Namespaced stores cannot reference other namespaces, and the backing
//!   store is never queried when they try
//! - Cluster-scoped stores may reference any namespace
//! - Not-found and missing-key errors
//! - ConfigMap and ServiceAccount token resolution
//! - Cancellation and deadlines

use secret_provider_registry::crd::{
    ConfigMapSelector, SecretSelector, ServiceAccountSelector, StoreScope,
};
use secret_provider_registry::resolver::{
    generate_service_account_token, resolve_config_map_key, resolve_secret_key, BackingStore,
    MemoryBackingStore, ResolveContext, ResolveError,
};
use std::time::Duration;

const TTL: Duration = Duration::from_secs(600);

fn backing() -> MemoryBackingStore {
    let backing = MemoryBackingStore::new();
    backing.insert_secret("foo", "creds", [("key", "value")]);
    backing.insert_secret("ns2", "creds", [("key", "local")]);
    backing.insert_config_map("ns2", "settings", [("endpoint", "https://vault:8200")]);
    backing.insert_service_account("ns2", "reader");
    backing
}

#[tokio::test]
async fn test_namespaced_store_foreign_secret_denied_without_lookup() {
    let backing = backing();
    let selector = SecretSelector::new("creds", "key").in_namespace("foo");

    let err = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
    )
    .await
    .unwrap_err();

    assert!(err.is_cross_namespace_violation(), "got {err:?}");
    let message = err.to_string();
    assert!(message.contains("foo/creds#key"), "{message}");
    assert!(!message.contains("value"), "error must not carry the value: {message}");
    assert_eq!(backing.calls(), 0, "backing store must not be consulted");
}

#[tokio::test]
async fn test_namespaced_store_same_namespace_allowed() {
    let backing = backing();
    let selector = SecretSelector::new("creds", "key").in_namespace("foo");

    let value = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "foo",
        &selector,
    )
    .await
    .unwrap();

    assert_eq!(value.as_str(), Some("value"));
    assert_eq!(backing.calls(), 1);
}

#[tokio::test]
async fn test_omitted_namespace_uses_owner() {
    let backing = backing();
    let selector = SecretSelector::new("creds", "key");

    let value = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
    )
    .await
    .unwrap();

    assert_eq!(value.as_str(), Some("local"));
}

#[tokio::test]
async fn test_cluster_store_any_namespace_allowed() {
    let backing = backing();
    let selector = SecretSelector::new("creds", "key").in_namespace("foo");

    let value = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::ClusterScoped,
        "ns2",
        &selector,
    )
    .await
    .unwrap();

    assert_eq!(value.as_str(), Some("value"));
}

#[tokio::test]
async fn test_secret_not_found() {
    let backing = backing();
    let selector = SecretSelector::new("missing", "key");

    let err = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, ResolveError::SecretNotFound { ref namespace, ref name } if namespace == "ns2" && name == "missing"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_key_not_found_in_secret() {
    let backing = backing();
    let selector = SecretSelector::new("creds", "other");

    let err = resolve_secret_key(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::KeyNotFoundInSecret { ref key, .. } if key == "other"));
    assert!(err.to_string().contains("ns2/creds"));
}

#[tokio::test]
async fn test_config_map_resolution() {
    let backing = backing();
    let ctx = ResolveContext::background();

    let value = resolve_config_map_key(
        &ctx,
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &ConfigMapSelector::new("settings", "endpoint"),
    )
    .await
    .unwrap();
    assert_eq!(value.as_str(), Some("https://vault:8200"));

    let err = resolve_config_map_key(
        &ctx,
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &ConfigMapSelector::new("settings", "endpoint").in_namespace("foo"),
    )
    .await
    .unwrap_err();
    assert!(err.is_cross_namespace_violation());

    let err = resolve_config_map_key(
        &ctx,
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &ConfigMapSelector::new("settings", "missing"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ResolveError::KeyNotFoundInConfigMap { .. }));
}

#[tokio::test]
async fn test_service_account_token() {
    let backing = backing();
    let mut selector = ServiceAccountSelector::new("reader");
    selector.audiences = vec!["vault".to_string()];

    let token = generate_service_account_token(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
        &[],
        TTL,
    )
    .await
    .unwrap();
    assert!(!token.is_empty());

    let issued = backing.issued_tokens();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].namespace, "ns2");
    assert_eq!(issued[0].audiences, vec!["vault".to_string()]);
    assert_eq!(issued[0].ttl, TTL);
}

#[tokio::test]
async fn test_service_account_token_audience_override() {
    let backing = backing();
    let mut selector = ServiceAccountSelector::new("reader");
    selector.audiences = vec!["vault".to_string()];

    generate_service_account_token(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
        &["sts.amazonaws.com".to_string()],
        TTL,
    )
    .await
    .unwrap();

    assert_eq!(
        backing.issued_tokens()[0].audiences,
        vec!["sts.amazonaws.com".to_string()]
    );
}

#[tokio::test]
async fn test_service_account_cross_namespace_denied() {
    let backing = backing();
    let selector = ServiceAccountSelector::new("reader").in_namespace("foo");

    let err = generate_service_account_token(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &selector,
        &[],
        TTL,
    )
    .await
    .unwrap_err();

    assert!(err.is_cross_namespace_violation());
    assert!(backing.issued_tokens().is_empty());
}

#[tokio::test]
async fn test_unknown_service_account_fails() {
    let backing = backing();
    let err = generate_service_account_token(
        &ResolveContext::background(),
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &ServiceAccountSelector::new("ghost"),
        &[],
        TTL,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::TokenRequestFailed { ref name, .. } if name == "ghost"));
}

#[tokio::test]
async fn test_cancelled_context() {
    let backing = backing();
    let ctx = ResolveContext::background();
    ctx.cancel();

    let err = resolve_secret_key(
        &ctx,
        &backing,
        StoreScope::Namespaced,
        "ns2",
        &SecretSelector::new("creds", "key"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::Cancelled), "got {err:?}");
    assert_eq!(backing.calls(), 0);
}

/// Backing store that never answers
struct HangingBackingStore;

#[async_trait::async_trait]
impl BackingStore for HangingBackingStore {
    async fn get_secret(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> anyhow::Result<Option<secret_provider_registry::resolver::backing::ObjectData>> {
        std::future::pending().await
    }

    async fn get_config_map(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> anyhow::Result<Option<secret_provider_registry::resolver::backing::ObjectData>> {
        std::future::pending().await
    }

    async fn create_token(
        &self,
        _namespace: &str,
        _name: &str,
        _audiences: &[String],
        _ttl: Duration,
    ) -> anyhow::Result<String> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_exceeded() {
    let ctx = ResolveContext::background().with_timeout(Duration::from_secs(1));

    let err = resolve_secret_key(
        &ctx,
        &HangingBackingStore,
        StoreScope::Namespaced,
        "ns2",
        &SecretSelector::new("creds", "key"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::DeadlineExceeded(d) if d == Duration::from_secs(1)));
}

#[tokio::test]
async fn test_cancelled_while_in_flight() {
    let ctx = ResolveContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = resolve_secret_key(
        &ctx,
        &HangingBackingStore,
        StoreScope::ClusterScoped,
        "ns2",
        &SecretSelector::new("creds", "key"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolveError::Cancelled));
}
