//! # Fake Provider
//!
//! In-memory provider seeded from the store's `config.data`. Used for
//! end-to-end tests of consumers and for demos.
//!
//! ```yaml
//! provider:
//!   kind: Fake
//!   config:
//!     data:
//!       db-password: hunter2
//!       db:
//!         user: app
//!         password: hunter2
//! ```
//!
//! String values are single secrets. Object values are secret maps; reading
//! one with `get_secret` returns it JSON-encoded.

use crate::crd::StoreSpec;
use crate::provider::{CapabilityName, ClientError, Metadata, Provider, SecretsClient, Stability};
use crate::resolver::{BackingStore, ResolveContext, ResolveError, SecretValue};
use crate::validation::{StoreValidation, StoreValidator, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// `config` section of a Fake store
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FakeConfig {
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl FakeConfig {
    pub fn from_store(store: &StoreSpec) -> Result<Self, ValidationError> {
        if store.provider.config.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(store.provider.config.clone())
            .map_err(|e| ValidationError::InvalidStore(format!("provider.config: {e}")))
    }
}

#[derive(Clone)]
enum Entry {
    Value(SecretValue),
    Map(BTreeMap<String, SecretValue>),
}

impl Entry {
    fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::String(s) => Ok(Entry::Value(SecretValue::from(s.as_str()))),
            serde_json::Value::Object(fields) => fields
                .iter()
                .map(|(field, value)| match value {
                    serde_json::Value::String(s) => Ok((field.clone(), SecretValue::from(s.as_str()))),
                    _ => Err(ValidationError::InvalidSelector {
                        field: format!("provider.config.data.{key}.{field}"),
                        reason: "map values must be strings".to_string(),
                    }),
                })
                .collect::<Result<_, _>>()
                .map(Entry::Map),
            _ => Err(ValidationError::InvalidSelector {
                field: format!("provider.config.data.{key}"),
                reason: "must be a string or a map of strings".to_string(),
            }),
        }
    }

    fn to_value(&self) -> SecretValue {
        match self {
            Entry::Value(value) => value.clone(),
            Entry::Map(fields) => {
                let object: serde_json::Map<String, serde_json::Value> = fields
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.clone(),
                            serde_json::Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()),
                        )
                    })
                    .collect();
                SecretValue::new(serde_json::Value::Object(object).to_string().into_bytes())
            }
        }
    }
}

fn parse_entries(config: &FakeConfig) -> Result<BTreeMap<String, Entry>, ValidationError> {
    let mut entries = BTreeMap::new();
    let mut errors = Vec::new();
    for (key, value) in &config.data {
        match Entry::from_json(key, value) {
            Ok(entry) => {
                entries.insert(key.clone(), entry);
            }
            Err(err) => errors.push(err),
        }
    }
    match ValidationError::from_errors(errors) {
        Some(err) => Err(err),
        None => Ok(entries),
    }
}

/// In-memory provider
#[derive(Debug, Default)]
pub struct FakeProvider;

impl FakeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn metadata(&self) -> Metadata {
        Metadata::new(Stability::Stable)
            .with_capabilities([
                CapabilityName::GetSecret,
                CapabilityName::GetSecretMap,
                CapabilityName::GetAllSecrets,
                CapabilityName::PushSecret,
                CapabilityName::DeleteSecret,
                CapabilityName::ValidateStore,
            ])
            .with_comment("In-memory store seeded from the store configuration")
    }

    async fn new_client(
        &self,
        ctx: &ResolveContext,
        store: &StoreSpec,
        _backing: Arc<dyn BackingStore>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ClientError> {
        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled.into());
        }
        let config =
            FakeConfig::from_store(store).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        let entries =
            parse_entries(&config).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        debug!(store = %store.name, namespace, keys = entries.len(), "Created fake client");
        Ok(Box::new(FakeClient {
            entries: Mutex::new(entries),
        }))
    }

    fn validate_store(&self, store: &StoreSpec) -> Result<StoreValidation, ValidationError> {
        let config = FakeConfig::from_store(store)?;
        let mut validator = StoreValidator::new(store);
        if let Err(err) = parse_entries(&config) {
            validator.error(err);
        }
        if config.data.is_empty() {
            validator.warn("provider.config.data is empty");
        }
        validator.finish()
    }
}

struct FakeClient {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl FakeClient {
    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SecretsClient for FakeClient {
    async fn get_secret(&self, key: &str) -> Result<SecretValue, ClientError> {
        self.entries()
            .get(key)
            .map(Entry::to_value)
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }

    async fn get_secret_map(&self, key: &str) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        match self.entries().get(key) {
            Some(Entry::Map(fields)) => Ok(fields.clone()),
            Some(Entry::Value(value)) => {
                let parsed: BTreeMap<String, String> = serde_json::from_slice(value.as_bytes())
                    .map_err(|e| {
                        // Display would echo the value
                        ClientError::InvalidConfig(format!(
                            "remote key '{key}' is not a map ({:?} at column {})",
                            e.classify(),
                            e.column()
                        ))
                    })?;
                Ok(parsed
                    .into_iter()
                    .map(|(k, v)| (k, SecretValue::from(v.as_str())))
                    .collect())
            }
            None => Err(ClientError::NotFound(key.to_string())),
        }
    }

    async fn get_all_secrets(
        &self,
        prefix: &str,
    ) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        Ok(self
            .entries()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.to_value()))
            .collect())
    }

    async fn push_secret(&self, key: &str, value: SecretValue) -> Result<(), ClientError> {
        self.entries().insert(key.to_string(), Entry::Value(value));
        Ok(())
    }

    async fn delete_secret(&self, key: &str) -> Result<(), ClientError> {
        self.entries()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ProviderSpec;
    use crate::resolver::MemoryBackingStore;
    use crate::validation::ValidationState;
    use serde_json::json;

    fn store(config: serde_json::Value) -> StoreSpec {
        StoreSpec::namespaced("fake", "team-a", ProviderSpec::new("Fake", config))
    }

    async fn client(config: serde_json::Value) -> Box<dyn SecretsClient> {
        FakeProvider::new()
            .new_client(
                &ResolveContext::background(),
                &store(config),
                Arc::new(MemoryBackingStore::new()),
                "team-a",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_secret_and_map() {
        let client = client(json!({"data": {"token": "abc", "db": {"user": "app"}}})).await;
        assert_eq!(client.get_secret("token").await.unwrap().as_str(), Some("abc"));
        assert_eq!(
            client.get_secret("db").await.unwrap().as_str(),
            Some(r#"{"user":"app"}"#)
        );
        let map = client.get_secret_map("db").await.unwrap();
        assert_eq!(map["user"].as_str(), Some("app"));
        assert!(matches!(client.get_secret("missing").await, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_push_delete_and_list() {
        let client = client(json!({"data": {"app-a": "1"}})).await;
        client.push_secret("app-b", SecretValue::from("2")).await.unwrap();
        client.push_secret("other", SecretValue::from("3")).await.unwrap();

        let all = client.get_all_secrets("app-").await.unwrap();
        assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["app-a", "app-b"]);

        client.delete_secret("app-a").await.unwrap();
        assert!(matches!(client.delete_secret("app-a").await, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_secret_map_of_scalar_hides_value() {
        let client = client(json!({"data": {}})).await;
        client
            .push_secret("token", SecretValue::from(r#""hunter2""#))
            .await
            .unwrap();

        let err = client.get_secret_map("token").await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
        assert!(message.contains("'token' is not a map"), "{message}");
        assert!(!message.contains("hunter2"), "{message}");
    }

    #[test]
    fn test_validate_store() {
        let provider = FakeProvider::new();

        let ok = provider.validate_store(&store(json!({"data": {"a": "b"}}))).unwrap();
        assert_eq!(ok.state, ValidationState::Ready);
        assert!(ok.warnings.is_empty());

        let empty = provider.validate_store(&store(json!({}))).unwrap();
        assert_eq!(empty.warnings.len(), 1);

        assert!(provider.validate_store(&store(json!({"data": {"a": 1}}))).is_err());
        assert!(provider.validate_store(&store(json!({"unknown": true}))).is_err());
    }

    #[test]
    fn test_metadata_read_write() {
        use crate::provider::ApiCapabilities;
        assert_eq!(FakeProvider::new().capabilities(), ApiCapabilities::ReadWrite);
    }
}
