//! # Provider Registry
//!
//! Thread-safe map from provider name to provider handle and metadata.
//!
//! One registry is built per process and populated once at start-up by
//! [`crate::provider::builtin::register_builtin_providers`]. Tests construct
//! their own isolated instances.
//!
//! Reads (`fetch`, `fetch_metadata`, `list`) take a shared lock and never
//! block each other. Writes (`add`, `replace`) take the exclusive lock for a
//! single insert.

use crate::observability::metrics;
use crate::provider::{ApiCapabilities, Capability, MaintenanceStatus, Metadata, Provider, Stability};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

mod table;

pub use table::{describe, markdown_table};

/// Errors returned by the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("provider '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("provider '{0}' was registered without metadata")]
    MissingMetadata(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}

/// Provider handle and the metadata it was registered with
#[derive(Clone)]
pub struct RegistryEntry {
    pub provider: Arc<dyn Provider>,
    pub metadata: Metadata,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Documentation row for one registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub name: String,
    pub stability: Stability,
    pub maintenance_status: MaintenanceStatus,
    pub api_capabilities: ApiCapabilities,
    pub capabilities: Vec<Capability>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl ProviderSummary {
    fn from_entry(name: &str, entry: &RegistryEntry) -> Self {
        Self {
            name: name.to_string(),
            stability: entry.metadata.stability,
            maintenance_status: entry.metadata.maintenance_status(),
            api_capabilities: entry.metadata.api_capabilities(),
            capabilities: entry.metadata.capabilities.clone(),
            comment: entry.metadata.comment.clone(),
        }
    }
}

/// Name to provider registry
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.names())
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name`
    ///
    /// Fails with `DuplicateRegistration` if `name` is taken and with
    /// `MissingMetadata` if no metadata is given.
    pub fn add(
        &self,
        name: &str,
        provider: Arc<dyn Provider>,
        metadata: impl Into<Option<Metadata>>,
    ) -> Result<(), RegistryError> {
        self.insert(name, provider, metadata.into(), false)
    }

    /// Register a provider under `name`, overwriting any existing entry
    ///
    /// For tests and hot-reload only; start-up registration uses [`Registry::add`].
    pub fn replace(
        &self,
        name: &str,
        provider: Arc<dyn Provider>,
        metadata: impl Into<Option<Metadata>>,
    ) -> Result<(), RegistryError> {
        self.insert(name, provider, metadata.into(), true)
    }

    fn insert(
        &self,
        name: &str,
        provider: Arc<dyn Provider>,
        metadata: Option<Metadata>,
        overwrite: bool,
    ) -> Result<(), RegistryError> {
        let metadata = metadata.ok_or_else(|| RegistryError::MissingMetadata(name.to_string()))?;

        let count = {
            let mut entries = self.write();
            if !overwrite && entries.contains_key(name) {
                return Err(RegistryError::DuplicateRegistration(name.to_string()));
            }
            entries.insert(name.to_string(), RegistryEntry { provider, metadata });
            entries.len()
        };

        debug!(provider = name, replaced = overwrite, "Registered provider");
        metrics::record_registration(name);
        metrics::set_registered_providers(count);
        Ok(())
    }

    /// Provider registered under `name`
    ///
    /// The returned handle is the same `Arc` that was registered.
    #[must_use]
    pub fn fetch(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.read()
            .get(name)
            .map(|entry| Arc::clone(&entry.provider))
    }

    /// Metadata registered under `name`
    #[must_use]
    pub fn fetch_metadata(&self, name: &str) -> Option<Metadata> {
        self.read().get(name).map(|entry| entry.metadata.clone())
    }

    /// Provider registered under `name`, or `UnknownProvider`
    pub fn get_provider(&self, name: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        self.fetch(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))
    }

    /// Independent snapshot of every entry, sorted by name
    #[must_use]
    pub fn list(&self) -> BTreeMap<String, RegistryEntry> {
        self.read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    /// Capability table of every provider, sorted by name
    #[must_use]
    pub fn summaries(&self) -> Vec<ProviderSummary> {
        self.list()
            .iter()
            .map(|(name, entry)| ProviderSummary::from_entry(name, entry))
            .collect()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegistryEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegistryEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
