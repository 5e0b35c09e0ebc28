//! Prometheus metrics for assistant-service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so library
//! users and tests never need a registry.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ASSISTANT_REPLIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static TRIAGE_RESULTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; only the first call
/// registers anything.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "assistant_provider_latency_seconds",
            "Text-generation provider latency per attempt in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["provider", "model"],
    )?;

    let provider_errors = IntCounterVec::new(
        Opts::new(
            "assistant_provider_errors_total",
            "Total provider errors by error type",
        ),
        &["provider", "error_type"],
    )?;

    // outcome: reply, or the failure kind that replaced it
    let assistant_replies = IntCounterVec::new(
        Opts::new(
            "assistant_replies_total",
            "Conversational replies by outcome",
        ),
        &["outcome"],
    )?;

    // outcome: parsed, fallback
    let triage_results = IntCounterVec::new(
        Opts::new("assistant_triage_results_total", "Symptom analyses by outcome"),
        &["outcome"],
    )?;

    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(provider_errors.clone()))?;
    registry.register(Box::new(assistant_replies.clone()))?;
    registry.register(Box::new(triage_results.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = ASSISTANT_REPLIES_TOTAL.set(assistant_replies);
    let _ = TRIAGE_RESULTS_TOTAL.set(triage_results);

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record provider latency for one attempt.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

pub fn record_assistant_reply(outcome: &str) {
    if let Some(counter) = ASSISTANT_REPLIES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_triage_result(outcome: &str) {
    if let Some(counter) = TRIAGE_RESULTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}
