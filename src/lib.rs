//! Secret Provider Registry Library
//!
//! Provider capability registry and namespace-safe resolution of secret
//! references for Kubernetes secret synchronization.
//!
//! - [`registry`] maps provider names to provider handles and metadata
//! - [`provider`] defines the provider contract and the built-in providers
//! - [`resolver`] resolves Secret, ConfigMap and ServiceAccount selectors
//!   while enforcing namespace isolation
//! - [`validation`] applies the same rule at admission time
//!
//! ## Quick Start
//!
//! ```rust
//! use secret_provider_registry::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod server;
pub mod validation;
