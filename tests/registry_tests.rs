//! # Registry Tests
//!
//! These tests verify:
//! - Registration and lookup identity
//! - Duplicate and metadata-less registration are rejected
//! - Replace overwrites
//! - Snapshots are independent of later registrations
//! - Concurrent readers and writers

mod common;

use common::StaticProvider;
use secret_provider_registry::provider::{
    ApiCapabilities, CapabilityName, MaintenanceStatus, Metadata, Provider, Stability,
};
use secret_provider_registry::registry::{Registry, RegistryError};
use std::sync::Arc;
use std::thread;

fn provider() -> Arc<dyn Provider> {
    Arc::new(StaticProvider::read_only())
}

#[test]
fn test_fetch_returns_registered_handle() {
    let registry = Registry::new();
    let p = provider();
    let metadata = p.metadata();
    registry.add("Vault", Arc::clone(&p), metadata.clone()).unwrap();

    let fetched = registry.fetch("Vault").unwrap();
    assert!(Arc::ptr_eq(&fetched, &p), "fetch should return the registered handle");
    assert_eq!(registry.fetch_metadata("Vault"), Some(metadata));
}

#[test]
fn test_fetch_unknown_is_none() {
    let registry = Registry::new();
    assert!(registry.fetch("Nope").is_none());
    assert!(registry.fetch_metadata("Nope").is_none());
    assert_eq!(
        registry.get_provider("Nope").err(),
        Some(RegistryError::UnknownProvider("Nope".to_string()))
    );
}

#[test]
fn test_duplicate_registration_rejected() {
    let registry = Registry::new();
    let first = provider();
    registry
        .add("Vault", Arc::clone(&first), Metadata::new(Stability::Stable))
        .unwrap();

    let err = registry
        .add("Vault", provider(), Metadata::new(Stability::Alpha))
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateRegistration("Vault".to_string()));

    // Original entry untouched
    assert!(Arc::ptr_eq(&registry.fetch("Vault").unwrap(), &first));
    assert_eq!(
        registry.fetch_metadata("Vault").unwrap().stability,
        Stability::Stable
    );
}

#[test]
fn test_missing_metadata_rejected() {
    let registry = Registry::new();
    let err = registry.add("Vault", provider(), None::<Metadata>).unwrap_err();
    assert_eq!(err, RegistryError::MissingMetadata("Vault".to_string()));
    assert!(registry.is_empty());
}

#[test]
fn test_replace_overwrites() {
    let registry = Registry::new();
    registry
        .add("Vault", provider(), Metadata::new(Stability::Beta))
        .unwrap();

    let replacement = provider();
    registry
        .replace("Vault", Arc::clone(&replacement), Metadata::new(Stability::Deprecated))
        .unwrap();

    assert!(Arc::ptr_eq(&registry.fetch("Vault").unwrap(), &replacement));
    assert_eq!(
        registry.fetch_metadata("Vault").unwrap().maintenance_status(),
        MaintenanceStatus::Deprecated
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_list_is_a_snapshot() {
    let registry = Registry::new();
    registry
        .add("A", provider(), Metadata::new(Stability::Stable))
        .unwrap();

    let mut snapshot = registry.list();
    registry
        .add("B", provider(), Metadata::new(Stability::Stable))
        .unwrap();
    assert_eq!(snapshot.len(), 1, "snapshot must not see later registrations");

    snapshot.remove("A");
    assert!(registry.fetch("A").is_some(), "mutating a snapshot must not affect the registry");
}

#[test]
fn test_summaries_derive_capabilities() {
    let registry = Registry::new();
    let p: Arc<dyn Provider> = Arc::new(StaticProvider::new(
        Stability::Unmaintained,
        &[CapabilityName::GetSecret, CapabilityName::PushSecret],
    ));
    let metadata = p.metadata();
    registry.add("Legacy", p, metadata).unwrap();

    let summaries = registry.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].api_capabilities, ApiCapabilities::ReadWrite);
    assert_eq!(summaries[0].maintenance_status, MaintenanceStatus::NotMaintained);
}

#[test]
fn test_concurrent_registration_and_lookup() {
    let registry = Arc::new(Registry::new());

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .add(&format!("provider-{i}"), provider(), Metadata::new(Stability::Stable))
                    .unwrap();
            })
        })
        .collect();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    let _ = registry.list();
                    let _ = registry.fetch("provider-0");
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 8);
    assert_eq!(registry.names().first().map(String::as_str), Some("provider-0"));
}

#[test]
fn test_concurrent_duplicate_registration_single_winner() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.add("Vault", provider(), Metadata::new(Stability::Stable)))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(registry.len(), 1);
}
