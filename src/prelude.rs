//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use secret_provider_registry::prelude::*;
//! ```

// Selector and store types
pub use crate::crd::*;

// Provider contract and metadata
pub use crate::provider::{
    ApiCapabilities, Capability, CapabilityName, ClientError, MaintenanceStatus, Metadata,
    Provider, SecretsClient, Stability,
};

pub use crate::registry::{Registry, RegistryError};

pub use crate::resolver::{
    generate_service_account_token, resolve_config_map_key, resolve_secret_key, BackingStore,
    ResolveContext, ResolveError, SecretValue,
};

pub use crate::validation::{
    validate_referent_secret_selector, validate_secret_selector, AdmissionVerdict,
    StoreValidation, StoreValidator, ValidationError, ValidationState,
};

pub use crate::config::RuntimeConfig;
