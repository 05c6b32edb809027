//! # Metrics
//!
//! Prometheus metrics for the provider registry and the resolvers.
//!
//! ## Metrics Exposed
//!
//! - `provider_registry_registrations_total` - Provider registrations by provider name
//! - `provider_registry_registered_providers` - Current number of registered providers
//! - `provider_registry_resolutions_total` - Resolver calls by kind and outcome
//! - `provider_registry_resolution_duration_seconds` - Resolver call duration by kind
//! - `provider_registry_namespace_violations_total` - Cross-namespace denials by phase
//! - `provider_registry_store_validations_total` - Admission verdicts by state

use anyhow::Result;
use prometheus::{HistogramVec, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static REGISTRATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_registry_registrations_total",
            "Total number of provider registrations by provider name",
        ),
        &["provider"],
    )
    .expect("Failed to create REGISTRATIONS_TOTAL metric - this should never happen")
});

static REGISTERED_PROVIDERS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "provider_registry_registered_providers",
        "Current number of registered providers",
    )
    .expect("Failed to create REGISTERED_PROVIDERS metric - this should never happen")
});

static RESOLUTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_registry_resolutions_total",
            "Total number of selector resolutions by kind and outcome",
        ),
        &["kind", "outcome"],
    )
    .expect("Failed to create RESOLUTIONS_TOTAL metric - this should never happen")
});

static RESOLUTION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "provider_registry_resolution_duration_seconds",
            "Duration of selector resolutions in seconds by kind",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["kind"],
    )
    .expect("Failed to create RESOLUTION_DURATION metric - this should never happen")
});

static NAMESPACE_VIOLATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_registry_namespace_violations_total",
            "Total number of cross-namespace references denied, by phase (admission, runtime)",
        ),
        &["phase"],
    )
    .expect("Failed to create NAMESPACE_VIOLATIONS_TOTAL metric - this should never happen")
});

static STORE_VALIDATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "provider_registry_store_validations_total",
            "Total number of store validations by resulting state",
        ),
        &["state"],
    )
    .expect("Failed to create STORE_VALIDATIONS_TOTAL metric - this should never happen")
});

/// Register all metrics with the crate registry
///
/// Calling this more than once is harmless.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REGISTRATIONS_TOTAL.clone()),
        Box::new(REGISTERED_PROVIDERS.clone()),
        Box::new(RESOLUTIONS_TOTAL.clone()),
        Box::new(RESOLUTION_DURATION.clone()),
        Box::new(NAMESPACE_VIOLATIONS_TOTAL.clone()),
        Box::new(STORE_VALIDATIONS_TOTAL.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Encode the crate registry in Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn gather_text() -> Result<Vec<u8>> {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

pub fn record_registration(provider: &str) {
    REGISTRATIONS_TOTAL.with_label_values(&[provider]).inc();
}

pub fn set_registered_providers(count: usize) {
    REGISTERED_PROVIDERS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn record_resolution(kind: &str, outcome: &str, duration: f64) {
    RESOLUTIONS_TOTAL.with_label_values(&[kind, outcome]).inc();
    RESOLUTION_DURATION.with_label_values(&[kind]).observe(duration);
}

pub fn increment_namespace_violations(phase: &str) {
    NAMESPACE_VIOLATIONS_TOTAL.with_label_values(&[phase]).inc();
}

pub fn record_store_validation(state: &str) {
    STORE_VALIDATIONS_TOTAL.with_label_values(&[state]).inc();
}
