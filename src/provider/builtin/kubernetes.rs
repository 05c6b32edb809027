//! # Kubernetes Provider
//!
//! Reads secrets from a namespace of a Kubernetes cluster.
//!
//! ```yaml
//! provider:
//!   kind: Kubernetes
//!   config:
//!     remoteNamespace: shared
//!     server:
//!       url: https://kubernetes.default.svc
//!       caBundle:
//!         name: kube-root-ca.crt
//!         key: ca.crt
//!     auth:
//!       token:
//!         name: reader-token
//!         key: token
//! ```
//!
//! Authentication takes either a bearer token stored in a Secret
//! (`auth.token`) or a ServiceAccount to mint a token for
//! (`auth.serviceAccount`). Both are referent selectors: on a cluster-scoped
//! store an omitted namespace means the namespace of the consumer.
//!
//! `remoteNamespace` follows the same namespace rule as a selector: a
//! namespaced store may only read its own namespace, and an omitted
//! `remoteNamespace` means the owner namespace (the store's own, or the
//! consumer's for a cluster-scoped store).
//!
//! Remote keys are `name` (whole Secret, JSON-encoded) or `name/property`
//! (one field of the Secret).

use crate::crd::{ConfigMapSelector, SecretSelector, ServiceAccountSelector, StoreSpec};
use crate::observability::metrics;
use crate::provider::{CapabilityName, ClientError, Metadata, Provider, SecretsClient, Stability};
use crate::resolver::{
    check_namespace_rule, effective_namespace, generate_service_account_token,
    resolve_config_map_key, resolve_secret_key, BackingStore, ResolveContext, ResolveError,
    SecretValue,
};
use crate::validation::{StoreValidation, StoreValidator, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// `config` section of a Kubernetes store
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// Namespace the secrets are read from, defaults to the owner namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<KubernetesServer>,
    pub auth: KubernetesAuth,
}

impl KubernetesConfig {
    pub fn from_store(store: &StoreSpec) -> Result<Self, ValidationError> {
        serde_json::from_value(store.provider.config.clone())
            .map_err(|e| ValidationError::InvalidStore(format!("provider.config: {e}")))
    }

    /// Namespace secrets are read from for a store owned by `owner_namespace`
    #[must_use]
    pub fn remote_namespace<'a>(&'a self, owner_namespace: &'a str) -> &'a str {
        effective_namespace(self.remote_namespace.as_deref(), owner_namespace)
    }
}

/// API server coordinates
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// CA bundle used to verify the API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<ConfigMapSelector>,
}

/// Exactly one of `token` or `service_account` must be set
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<ServiceAccountSelector>,
}

/// Provider reading Secrets from a Kubernetes namespace
#[derive(Debug)]
pub struct KubernetesProvider {
    token_ttl: Duration,
}

impl KubernetesProvider {
    /// `token_ttl` is the lifetime requested for ServiceAccount tokens
    #[must_use]
    pub fn new(token_ttl: Duration) -> Self {
        Self { token_ttl }
    }

    async fn credential(
        &self,
        ctx: &ResolveContext,
        store: &StoreSpec,
        backing: &dyn BackingStore,
        owner_namespace: &str,
        auth: &KubernetesAuth,
    ) -> Result<SecretValue, ClientError> {
        let scope = store.scope();
        match (&auth.token, &auth.service_account) {
            (Some(token), None) => {
                Ok(resolve_secret_key(ctx, backing, scope, owner_namespace, token).await?)
            }
            (None, Some(service_account)) => {
                let token = generate_service_account_token(
                    ctx,
                    backing,
                    scope,
                    owner_namespace,
                    service_account,
                    &[],
                    self.token_ttl,
                )
                .await?;
                Ok(SecretValue::new(token.into_bytes()))
            }
            _ => Err(ClientError::InvalidConfig(
                "exactly one of auth.token or auth.serviceAccount must be set".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Provider for KubernetesProvider {
    fn metadata(&self) -> Metadata {
        Metadata::new(Stability::Beta)
            .with_capabilities([
                CapabilityName::GetSecret,
                CapabilityName::GetSecretMap,
                CapabilityName::ReferentAuthentication,
                CapabilityName::ValidateStore,
            ])
            .with_comment("Reads Secrets from a Kubernetes namespace")
    }

    #[instrument(skip(self, ctx, store, backing), fields(store = %store.name))]
    async fn new_client(
        &self,
        ctx: &ResolveContext,
        store: &StoreSpec,
        backing: Arc<dyn BackingStore>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>, ClientError> {
        let config = KubernetesConfig::from_store(store)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        // A namespaced store resolves against its own namespace; a
        // cluster-scoped store against the consumer's.
        let owner_namespace = store.namespace.as_deref().unwrap_or(namespace);

        let remote_namespace = config.remote_namespace(owner_namespace);
        check_namespace_rule(
            store.scope(),
            owner_namespace,
            config.remote_namespace.as_deref(),
            "secret",
            &format!("{remote_namespace}/*"),
        )
        .inspect_err(|e| {
            warn!("{}", e);
            metrics::increment_namespace_violations("runtime");
        })?;

        let credential = self
            .credential(ctx, store, backing.as_ref(), owner_namespace, &config.auth)
            .await?;

        let ca_bundle = match config.server.as_ref().and_then(|s| s.ca_bundle.as_ref()) {
            Some(selector) => Some(
                resolve_config_map_key(ctx, backing.as_ref(), store.scope(), owner_namespace, selector)
                    .await?,
            ),
            None => None,
        };

        debug!(
            remote_namespace,
            ca_bundle = ca_bundle.is_some(),
            "Created kubernetes client"
        );

        Ok(Box::new(KubernetesClient {
            ctx: ctx.child(),
            backing,
            remote_namespace: remote_namespace.to_string(),
            credential,
            ca_bundle,
        }))
    }

    fn validate_store(&self, store: &StoreSpec) -> Result<StoreValidation, ValidationError> {
        let config = KubernetesConfig::from_store(store)?;
        let mut validator = StoreValidator::new(store);

        if let Some(remote_namespace) = &config.remote_namespace {
            validator.namespace("provider.config.remoteNamespace", "secret", remote_namespace);
        }

        match (&config.auth.token, &config.auth.service_account) {
            (Some(token), None) => {
                validator.secret("provider.config.auth.token", token);
            }
            (None, Some(service_account)) => {
                validator.service_account("provider.config.auth.serviceAccount", service_account);
            }
            _ => {
                validator.error(ValidationError::InvalidStore(
                    "exactly one of auth.token or auth.serviceAccount must be set".to_string(),
                ));
            }
        }

        if let Some(server) = &config.server {
            if let Some(ca_bundle) = &server.ca_bundle {
                validator.config_map("provider.config.server.caBundle", ca_bundle);
            }
            if server.url.is_none() {
                validator.warn("provider.config.server.url not set, using in-cluster API server");
            }
        }

        validator.finish()
    }
}

struct KubernetesClient {
    ctx: ResolveContext,
    backing: Arc<dyn BackingStore>,
    remote_namespace: String,
    credential: SecretValue,
    ca_bundle: Option<SecretValue>,
}

impl KubernetesClient {
    async fn remote_secret(&self, name: &str) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        let data = self
            .ctx
            .run(async {
                self.backing
                    .get_secret(&self.remote_namespace, name)
                    .await
                    .map_err(ResolveError::Backend)
            })
            .await?
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;

        Ok(data
            .into_iter()
            .map(|(k, v)| (k, SecretValue::new(v)))
            .collect())
    }
}

#[async_trait]
impl SecretsClient for KubernetesClient {
    async fn get_secret(&self, key: &str) -> Result<SecretValue, ClientError> {
        match key.split_once('/') {
            Some((name, property)) => self
                .remote_secret(name)
                .await?
                .remove(property)
                .ok_or_else(|| ClientError::NotFound(key.to_string())),
            None => {
                let fields = self.remote_secret(key).await?;
                let object: serde_json::Map<String, serde_json::Value> = fields
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.clone(),
                            serde_json::Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()),
                        )
                    })
                    .collect();
                Ok(SecretValue::new(
                    serde_json::Value::Object(object).to_string().into_bytes(),
                ))
            }
        }
    }

    async fn get_secret_map(&self, key: &str) -> Result<BTreeMap<String, SecretValue>, ClientError> {
        self.remote_secret(key).await
    }

    async fn validate(&self) -> Result<(), ClientError> {
        if self.credential.is_empty() {
            return Err(ClientError::InvalidConfig("empty credential".to_string()));
        }
        if self.ca_bundle.as_ref().is_some_and(SecretValue::is_empty) {
            return Err(ClientError::InvalidConfig("empty CA bundle".to_string()));
        }
        Ok(())
    }
}
