//! # Reference Types
//!
//! Serializable types embedded in store configuration objects: secret,
//! config map and service account selectors, the store scope, and the store
//! spec handed to providers.
//!
//! Field names follow Kubernetes conventions (camelCase) so these types can be
//! embedded directly in custom resource specs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the object owning a selector lives in one namespace or is cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum StoreScope {
    /// A `SecretStore`: confined to its own namespace
    Namespaced,
    /// A `ClusterSecretStore`: valid cluster-wide
    ClusterScoped,
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreScope::Namespaced => f.write_str("Namespaced"),
            StoreScope::ClusterScoped => f.write_str("ClusterScoped"),
        }
    }
}

/// Common view over the selector types
pub trait ObjectSelector {
    /// Kind of the referenced object, lowercase (`secret`, `configmap`, `serviceaccount`)
    const KIND: &'static str;

    fn name(&self) -> &str;
    fn namespace(&self) -> Option<&str>;
    /// Key inside the object, if the selector addresses one
    fn key(&self) -> Option<&str>;
}

/// Reference to one key inside one Kubernetes Secret
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretSelector {
    /// Name of the Secret
    pub name: String,
    /// Namespace of the Secret
    /// Omitted means the namespace of the object consuming the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Key inside the Secret's data
    pub key: String,
}

impl SecretSelector {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for SecretSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_reference(f, self.namespace.as_deref(), &self.name)?;
        write!(f, "#{}", self.key)
    }
}

/// Reference to one key inside one Kubernetes ConfigMap
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapSelector {
    /// Name of the ConfigMap
    pub name: String,
    /// Namespace of the ConfigMap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Key inside `data` or `binaryData`
    pub key: String,
}

impl ConfigMapSelector {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for ConfigMapSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_reference(f, self.namespace.as_deref(), &self.name)?;
        write!(f, "#{}", self.key)
    }
}

/// Reference to a ServiceAccount used to mint identity tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountSelector {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Audiences requested for the token
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
}

impl ServiceAccountSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            audiences: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for ServiceAccountSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_reference(f, self.namespace.as_deref(), &self.name)
    }
}

impl ObjectSelector for SecretSelector {
    const KIND: &'static str = "secret";

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }
}

impl ObjectSelector for ConfigMapSelector {
    const KIND: &'static str = "configmap";

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }
}

impl ObjectSelector for ServiceAccountSelector {
    const KIND: &'static str = "serviceaccount";

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn key(&self) -> Option<&str> {
        None
    }
}

fn fmt_reference(f: &mut fmt::Formatter<'_>, namespace: Option<&str>, name: &str) -> fmt::Result {
    match namespace {
        Some(ns) => write!(f, "{ns}/{name}"),
        None => write!(f, "<referent>/{name}"),
    }
}

/// Provider section of a store spec
///
/// `kind` selects the registered provider; `config` is passed through to it
/// untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    pub kind: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// A secret store as seen by providers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreSpec {
    pub name: String,
    /// Namespace of the store object; absent for cluster-scoped stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub provider: ProviderSpec,
}

impl StoreSpec {
    /// Namespaced store (`SecretStore`)
    pub fn namespaced(
        name: impl Into<String>,
        namespace: impl Into<String>,
        provider: ProviderSpec,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            provider,
        }
    }

    /// Cluster-wide store (`ClusterSecretStore`)
    pub fn cluster(name: impl Into<String>, provider: ProviderSpec) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            provider,
        }
    }

    #[must_use]
    pub fn scope(&self) -> StoreScope {
        if self.namespace.is_some() {
            StoreScope::Namespaced
        } else {
            StoreScope::ClusterScoped
        }
    }
}

impl ProviderSpec {
    pub fn new(kind: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_selector_deserialize_without_namespace() {
        let selector: SecretSelector =
            serde_json::from_str(r#"{"name":"creds","key":"token"}"#).unwrap();
        assert_eq!(selector, SecretSelector::new("creds", "token"));
        assert!(selector.namespace.is_none());
    }

    #[test]
    fn test_secret_selector_display() {
        let referent = SecretSelector::new("creds", "token");
        assert_eq!(referent.to_string(), "<referent>/creds#token");
        assert_eq!(
            referent.in_namespace("team-a").to_string(),
            "team-a/creds#token"
        );
    }

    #[test]
    fn test_store_scope_from_namespace() {
        let provider = ProviderSpec::new("Fake", serde_json::json!({}));
        assert_eq!(
            StoreSpec::namespaced("store", "team-a", provider.clone()).scope(),
            StoreScope::Namespaced
        );
        assert_eq!(
            StoreSpec::cluster("store", provider).scope(),
            StoreScope::ClusterScoped
        );
    }

    #[test]
    fn test_service_account_selector_yaml() {
        let yaml = "name: eso-auth\nnamespace: vault\naudiences:\n  - vault\n";
        let selector: ServiceAccountSelector = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(selector.namespace.as_deref(), Some("vault"));
        assert_eq!(selector.audiences, vec!["vault".to_string()]);
    }
}
