//! # Validation Tests
//!
//! These tests verify:
//! - Referent selector states (Ready / Unknown / Error)
//! - Known-namespace selector checks
//! - Admission verdicts through the registry
//! - Rejection messages name the selector and never the value

mod common;

use common::{cluster_kubernetes_store, kubernetes_store, StaticProvider};
use secret_provider_registry::crd::{ProviderSpec, SecretSelector, StoreScope, StoreSpec};
use secret_provider_registry::provider::builtin::register_builtin_providers;
use secret_provider_registry::registry::Registry;
use secret_provider_registry::validation::{
    validate_referent_secret_selector, validate_secret_selector, validate_store,
    ValidationError, ValidationState,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> Registry {
    let registry = Registry::new();
    register_builtin_providers(&registry, Duration::from_secs(600)).unwrap();
    registry
}

#[test]
fn test_referent_selector_states() {
    let referent = SecretSelector::new("creds", "token");
    let explicit = SecretSelector::new("creds", "token").in_namespace("foo");

    let cases = [
        (StoreScope::ClusterScoped, None, &referent, ValidationState::Unknown),
        (StoreScope::ClusterScoped, None, &explicit, ValidationState::Ready),
        (StoreScope::Namespaced, Some("foo"), &explicit, ValidationState::Ready),
        (StoreScope::Namespaced, Some("bar"), &explicit, ValidationState::Error),
        (StoreScope::Namespaced, Some("bar"), &referent, ValidationState::Ready),
    ];

    for (scope, owner, selector, expected) in cases {
        assert_eq!(
            validate_referent_secret_selector(scope, owner, selector),
            expected,
            "scope={scope} owner={owner:?} selector={selector}"
        );
    }
}

#[test]
fn test_validate_secret_selector() {
    let foreign = SecretSelector::new("creds", "token").in_namespace("foo");

    let err = validate_secret_selector(StoreScope::Namespaced, "ns2", &foreign).unwrap_err();
    assert!(err.is_cross_namespace_violation());
    assert!(err.to_string().contains("foo/creds#token"));

    assert!(validate_secret_selector(StoreScope::Namespaced, "foo", &foreign).is_ok());
    assert!(validate_secret_selector(StoreScope::ClusterScoped, "ns2", &foreign).is_ok());
}

#[test]
fn test_admission_unknown_provider() {
    let registry = registry();
    let store = StoreSpec::namespaced("vault", "team-a", ProviderSpec::new("Vault", json!({})));

    let verdict = validate_store(&registry, &store);
    assert!(!verdict.allowed);
    assert_eq!(verdict.state, ValidationState::Error);
    assert_eq!(
        verdict.message.as_deref(),
        Some(ValidationError::UnknownProvider("Vault".to_string()).to_string().as_str())
    );
}

#[test]
fn test_admission_blocks_cross_namespace_reference() {
    let registry = registry();
    let store = kubernetes_store(
        "ns2",
        json!({"auth": {"token": {"name": "creds", "namespace": "foo", "key": "token"}}}),
    );

    let verdict = validate_store(&registry, &store);
    assert!(!verdict.allowed);
    assert_eq!(verdict.state, ValidationState::Error);
    let message = verdict.message.unwrap();
    assert!(message.contains("foo/creds#token"), "{message}");
    assert!(message.contains("ns2"), "{message}");
}

#[test]
fn test_admission_allows_unknown_referent() {
    let registry = registry();
    let store = cluster_kubernetes_store(json!({"auth": {"token": {"name": "creds", "key": "token"}}}));

    let verdict = validate_store(&registry, &store);
    assert!(verdict.allowed, "Unknown must not block admission: {verdict:?}");
    assert_eq!(verdict.state, ValidationState::Unknown);
    assert!(verdict.message.is_none());
}

#[test]
fn test_admission_ready() {
    let registry = registry();
    let store = kubernetes_store(
        "team-a",
        json!({"auth": {"token": {"name": "creds", "namespace": "team-a", "key": "token"}}}),
    );

    let verdict = validate_store(&registry, &store);
    assert!(verdict.allowed);
    assert_eq!(verdict.state, ValidationState::Ready);
}

#[test]
fn test_admission_message_never_contains_value() {
    let registry = registry();
    let store = StoreSpec::namespaced(
        "fake",
        "team-a",
        ProviderSpec::new("Fake", json!({"data": {"password": "hunter2", "broken": 42}})),
    );

    let verdict = validate_store(&registry, &store);
    assert!(!verdict.allowed);
    let message = verdict.message.unwrap();
    assert!(message.contains("provider.config.data.broken"), "{message}");
    assert!(!message.contains("hunter2"), "{message}");
}

#[test]
fn test_admission_uses_registered_provider() {
    let registry = Registry::new();
    let provider = Arc::new(StaticProvider::read_only());
    let metadata = provider.metadata.clone();
    registry.add("Static", provider, metadata).unwrap();

    let store = StoreSpec::cluster("static", ProviderSpec::new("Static", json!(null)));
    let verdict = validate_store(&registry, &store);
    assert!(verdict.allowed);
    assert_eq!(verdict.state, ValidationState::Ready);
}

#[test]
fn test_verdict_serializes_camel_case() {
    let registry = registry();
    let store = StoreSpec::namespaced("vault", "team-a", ProviderSpec::new("Vault", json!({})));
    let verdict = serde_json::to_value(validate_store(&registry, &store)).unwrap();
    assert_eq!(verdict["allowed"], json!(false));
    assert_eq!(verdict["state"], json!("Error"));
    assert!(verdict["message"].is_string());
}
