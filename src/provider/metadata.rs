//! # Provider Metadata
//!
//! Capability and stability declarations for provider adapters.
//!
//! A provider declares which operations it supports ([`Capability`]) and how
//! mature it is ([`Stability`]). From that declaration two user-facing values
//! are derived:
//!
//! - [`ApiCapabilities`] - the coarse read/write set (`ReadOnly`, `WriteOnly`, `ReadWrite`)
//! - [`MaintenanceStatus`] - whether the provider is still maintained
//!
//! Both derivations are pure functions of the metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named operation a provider backend supports
///
/// This is a closed set. Adding a variant forces [`CapabilityName::class`] to be
/// updated, so the coarse read/write derivation can never silently miss a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityName {
    GetSecret,
    GetSecretMap,
    GetAllSecrets,
    PushSecret,
    DeleteSecret,
    SecretExists,
    FindByName,
    FindByTag,
    ReferentAuthentication,
    MetadataPolicyFetch,
    ValidateStore,
}

/// Coarse class a capability contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityClass {
    Read,
    Write,
    Neutral,
}

impl CapabilityName {
    /// Every capability kind, in declaration order
    pub const ALL: [CapabilityName; 11] = [
        CapabilityName::GetSecret,
        CapabilityName::GetSecretMap,
        CapabilityName::GetAllSecrets,
        CapabilityName::PushSecret,
        CapabilityName::DeleteSecret,
        CapabilityName::SecretExists,
        CapabilityName::FindByName,
        CapabilityName::FindByTag,
        CapabilityName::ReferentAuthentication,
        CapabilityName::MetadataPolicyFetch,
        CapabilityName::ValidateStore,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityName::GetSecret => "GetSecret",
            CapabilityName::GetSecretMap => "GetSecretMap",
            CapabilityName::GetAllSecrets => "GetAllSecrets",
            CapabilityName::PushSecret => "PushSecret",
            CapabilityName::DeleteSecret => "DeleteSecret",
            CapabilityName::SecretExists => "SecretExists",
            CapabilityName::FindByName => "FindByName",
            CapabilityName::FindByTag => "FindByTag",
            CapabilityName::ReferentAuthentication => "ReferentAuthentication",
            CapabilityName::MetadataPolicyFetch => "MetadataPolicyFetch",
            CapabilityName::ValidateStore => "ValidateStore",
        }
    }

    /// Coarse class used by [`Metadata::api_capabilities`]
    #[must_use]
    pub fn class(&self) -> CapabilityClass {
        match self {
            CapabilityName::GetSecret
            | CapabilityName::GetSecretMap
            | CapabilityName::GetAllSecrets => CapabilityClass::Read,
            CapabilityName::PushSecret | CapabilityName::DeleteSecret => CapabilityClass::Write,
            CapabilityName::SecretExists
            | CapabilityName::FindByName
            | CapabilityName::FindByTag
            | CapabilityName::ReferentAuthentication
            | CapabilityName::MetadataPolicyFetch
            | CapabilityName::ValidateStore => CapabilityClass::Neutral,
        }
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown capability name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for CapabilityName {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CapabilityName::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// One operation a backend supports, with free-form notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub name: CapabilityName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Capability {
    #[must_use]
    pub fn new(name: CapabilityName) -> Self {
        Self {
            name,
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn with_notes(name: CapabilityName, notes: impl Into<String>) -> Self {
        Self {
            name,
            notes: notes.into(),
        }
    }
}

impl From<CapabilityName> for Capability {
    fn from(name: CapabilityName) -> Self {
        Capability::new(name)
    }
}

/// Declared support tier of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    Alpha,
    Beta,
    Stable,
    Unmaintained,
    Deprecated,
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stability::Alpha => "alpha",
            Stability::Beta => "beta",
            Stability::Stable => "stable",
            Stability::Unmaintained => "unmaintained",
            Stability::Deprecated => "deprecated",
        };
        f.write_str(s)
    }
}

/// Coarse read/write capability set derived from the declared capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiCapabilities {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl fmt::Display for ApiCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApiCapabilities::ReadOnly => "ReadOnly",
            ApiCapabilities::WriteOnly => "WriteOnly",
            ApiCapabilities::ReadWrite => "ReadWrite",
        };
        f.write_str(s)
    }
}

/// User-facing maintenance status derived from [`Stability`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Maintained,
    NotMaintained,
    Deprecated,
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaintenanceStatus::Maintained => "Maintained",
            MaintenanceStatus::NotMaintained => "NotMaintained",
            MaintenanceStatus::Deprecated => "Deprecated",
        };
        f.write_str(s)
    }
}

impl From<Stability> for MaintenanceStatus {
    fn from(stability: Stability) -> Self {
        match stability {
            Stability::Deprecated => MaintenanceStatus::Deprecated,
            Stability::Unmaintained => MaintenanceStatus::NotMaintained,
            Stability::Alpha | Stability::Beta | Stability::Stable => MaintenanceStatus::Maintained,
        }
    }
}

/// Metadata a provider registers with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub stability: Stability,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Metadata {
    #[must_use]
    pub fn new(stability: Stability) -> Self {
        Self {
            stability,
            capabilities: Vec::new(),
            comment: String::new(),
        }
    }

    /// Append a capability
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Append several capabilities without notes
    #[must_use]
    pub fn with_capabilities(mut self, names: impl IntoIterator<Item = CapabilityName>) -> Self {
        self.capabilities
            .extend(names.into_iter().map(Capability::new));
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Whether the named capability is declared
    #[must_use]
    pub fn supports(&self, name: CapabilityName) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    /// Derive the coarse read/write set
    ///
    /// Any read-class capability grants read, any write-class capability grants
    /// write. A provider that declares neither is reported as `ReadOnly`.
    #[must_use]
    pub fn api_capabilities(&self) -> ApiCapabilities {
        let mut can_read = false;
        let mut can_write = false;
        for capability in &self.capabilities {
            match capability.name.class() {
                CapabilityClass::Read => can_read = true,
                CapabilityClass::Write => can_write = true,
                CapabilityClass::Neutral => {}
            }
        }

        match (can_read, can_write) {
            (true, true) => ApiCapabilities::ReadWrite,
            (false, true) => ApiCapabilities::WriteOnly,
            _ => ApiCapabilities::ReadOnly,
        }
    }

    #[must_use]
    pub fn maintenance_status(&self) -> MaintenanceStatus {
        MaintenanceStatus::from(self.stability)
    }
}
