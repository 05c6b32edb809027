//! # Backing Store
//!
//! The two operation shapes the resolvers need from the cluster:
//!
//! - read an object's data map by namespace and name (Secret, ConfigMap)
//! - issue a scoped identity token for a ServiceAccount
//!
//! [`KubeBackingStore`] talks to the Kubernetes API. [`MemoryBackingStore`]
//! keeps objects in process and counts calls, for tests and the fake provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use k8s_openapi::api::core::v1::{ConfigMap, Secret, ServiceAccount};
use kube::api::{Api, PostParams};
use kube::Client;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Object data keyed by field name
pub type ObjectData = BTreeMap<String, Vec<u8>>;

/// Cluster operations the resolvers depend on
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Data of the Secret `namespace/name`, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>>;

    /// Data of the ConfigMap `namespace/name` (`data` merged over `binaryData`)
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>>;

    /// Issue a token for the ServiceAccount `namespace/name`
    async fn create_token(
        &self,
        namespace: &str,
        name: &str,
        audiences: &[String],
        ttl: Duration,
    ) -> Result<String>;
}

/// Backing store over the Kubernetes API
#[derive(Clone)]
pub struct KubeBackingStore {
    client: Client,
}

impl std::fmt::Debug for KubeBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBackingStore").finish_non_exhaustive()
    }
}

impl KubeBackingStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackingStore for KubeBackingStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get secret {namespace}/{name}"))?;

        Ok(secret.map(|s| {
            s.data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect()
        }))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = config_maps
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get configmap {namespace}/{name}"))?;

        Ok(config_map.map(|cm| {
            let mut data: ObjectData = cm
                .binary_data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect();
            // `data` wins when a key appears in both maps
            for (k, v) in cm.data.unwrap_or_default() {
                data.insert(k, v.into_bytes());
            }
            data
        }))
    }

    async fn create_token(
        &self,
        namespace: &str,
        name: &str,
        audiences: &[String],
        ttl: Duration,
    ) -> Result<String> {
        let service_accounts: Api<ServiceAccount> =
            Api::namespaced(self.client.clone(), namespace);

        let expiration_seconds = i64::try_from(ttl.as_secs())
            .context("Token TTL does not fit in expirationSeconds")?;
        let request = TokenRequest {
            spec: TokenRequestSpec {
                audiences: audiences.to_vec(),
                expiration_seconds: Some(expiration_seconds),
                bound_object_ref: None,
            },
            ..TokenRequest::default()
        };

        let response = service_accounts
            .create_token_request(name, &PostParams::default(), &request)
            .await
            .with_context(|| format!("Failed to create token for service account {namespace}/{name}"))?;

        response
            .status
            .map(|status| status.token)
            .context("Token request returned no status")
    }
}

/// Issued token recorded by [`MemoryBackingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub namespace: String,
    pub name: String,
    pub audiences: Vec<String>,
    pub ttl: Duration,
}

/// In-process backing store
///
/// Objects are keyed by `(namespace, name)`. Every call increments a counter
/// so callers can assert whether the store was consulted at all.
#[derive(Debug, Default)]
pub struct MemoryBackingStore {
    secrets: Mutex<HashMap<(String, String), ObjectData>>,
    config_maps: Mutex<HashMap<(String, String), ObjectData>>,
    service_accounts: Mutex<HashSet<(String, String)>>,
    issued: Mutex<Vec<IssuedToken>>,
    calls: AtomicUsize,
}

impl MemoryBackingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a Secret
    pub fn insert_secret<K, V>(
        &self,
        namespace: &str,
        name: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()), data);
    }

    /// Insert or replace a ConfigMap
    pub fn insert_config_map<K, V>(
        &self,
        namespace: &str,
        name: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.config_maps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()), data);
    }

    pub fn insert_service_account(&self, namespace: &str, name: &str) {
        self.service_accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()));
    }

    /// Number of backing-store calls made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tokens issued so far, oldest first
    #[must_use]
    pub fn issued_tokens(&self) -> Vec<IssuedToken> {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(
        map: &Mutex<HashMap<(String, String), ObjectData>>,
        namespace: &str,
        name: &str,
    ) -> Option<ObjectData> {
        map.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::lookup(&self.secrets, namespace, name))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ObjectData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::lookup(&self.config_maps, namespace, name))
    }

    async fn create_token(
        &self,
        namespace: &str,
        name: &str,
        audiences: &[String],
        ttl: Duration,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let exists = self
            .service_accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(namespace.to_string(), name.to_string()));
        if !exists {
            anyhow::bail!("serviceaccounts \"{name}\" not found in namespace \"{namespace}\"");
        }

        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        issued.push(IssuedToken {
            namespace: namespace.to_string(),
            name: name.to_string(),
            audiences: audiences.to_vec(),
            ttl,
        });
        Ok(format!("token-{namespace}-{name}-{}", issued.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_counts_calls() {
        let store = MemoryBackingStore::new();
        store.insert_secret("foo", "creds", [("key", "value")]);

        assert_eq!(store.calls(), 0);
        let data = store.get_secret("foo", "creds").await.unwrap().unwrap();
        assert_eq!(data.get("key").map(Vec::as_slice), Some(b"value".as_slice()));
        assert!(store.get_secret("bar", "creds").await.unwrap().is_none());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_token_requires_service_account() {
        let store = MemoryBackingStore::new();
        let audiences = vec!["vault".to_string()];
        assert!(store
            .create_token("foo", "missing", &audiences, Duration::from_secs(600))
            .await
            .is_err());

        store.insert_service_account("foo", "eso");
        let token = store
            .create_token("foo", "eso", &audiences, Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(token, "token-foo-eso-1");
        assert_eq!(store.issued_tokens()[0].audiences, audiences);
    }
}
