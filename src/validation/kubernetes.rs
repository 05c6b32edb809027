//! # Kubernetes Validation
//!
//! Validates Kubernetes object names, namespaces and data keys per RFC 1123.

use super::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

// RFC 1123 subdomain: [a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("Failed to compile NAME_REGEX - this should never happen")
});

// RFC 1123 label: [a-z0-9]([-a-z0-9]*[a-z0-9])?
static NAMESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .expect("Failed to compile NAMESPACE_REGEX - this should never happen")
});

// Secret and ConfigMap data keys
static DATA_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-._a-zA-Z0-9]+$")
        .expect("Failed to compile DATA_KEY_REGEX - this should never happen")
});

fn invalid(field: &str, reason: String) -> ValidationError {
    ValidationError::InvalidSelector {
        field: field.to_string(),
        reason,
    }
}

/// Validate Kubernetes resource name (RFC 1123 subdomain)
/// Format: lowercase alphanumeric, hyphens, dots
/// Length: 1-253 characters
/// Cannot start or end with hyphen or dot
pub fn validate_kubernetes_name(name: &str, field: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(invalid(field, "cannot be empty".to_string()));
    }

    if name.len() > 253 {
        return Err(invalid(
            field,
            format!(
                "'{name}' exceeds maximum length of 253 characters (got {})",
                name.len()
            ),
        ));
    }

    if !NAME_REGEX.is_match(name) {
        return Err(invalid(
            field,
            format!("'{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"),
        ));
    }

    Ok(())
}

/// Validate Kubernetes namespace (RFC 1123 label)
/// Format: lowercase alphanumeric, hyphens
/// Length: 1-63 characters
pub fn validate_kubernetes_namespace(namespace: &str, field: &str) -> Result<(), ValidationError> {
    if namespace.is_empty() {
        return Err(invalid(field, "cannot be empty".to_string()));
    }

    if namespace.len() > 63 {
        return Err(invalid(
            field,
            format!(
                "'{namespace}' exceeds maximum length of 63 characters (got {})",
                namespace.len()
            ),
        ));
    }

    if !NAMESPACE_REGEX.is_match(namespace) {
        return Err(invalid(
            field,
            format!("'{namespace}' must be a valid Kubernetes namespace (lowercase alphanumeric, hyphens; cannot start/end with hyphen)"),
        ));
    }

    Ok(())
}

/// Validate a Secret or ConfigMap data key
/// Format: alphanumeric, hyphens, underscores, dots
/// Length: 1-253 characters
pub fn validate_data_key(key: &str, field: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(invalid(field, "cannot be empty".to_string()));
    }

    if key.len() > 253 {
        return Err(invalid(
            field,
            format!(
                "'{key}' exceeds maximum length of 253 characters (got {})",
                key.len()
            ),
        ));
    }

    if !DATA_KEY_REGEX.is_match(key) {
        return Err(invalid(
            field,
            format!("'{key}' must contain only alphanumeric characters, '-', '_' or '.'"),
        ));
    }

    Ok(())
}
