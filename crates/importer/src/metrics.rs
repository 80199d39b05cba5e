//! Metrics registry for the import process.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Registry holding every core metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Register the core metrics with [`REGISTRY`].
pub fn register_metrics() -> Result<()> {
    for metric in cardvault_core::metrics::all_metrics() {
        REGISTRY
            .register(metric)
            .context("Failed to register metric")?;
    }
    Ok(())
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}
