//! Prometheus metrics for the prediction pipeline.
//!
//! Call [`init_metrics`] once at process startup. The helper functions
//! are no-ops if `init_metrics` was never called, so the pipeline is
//! always safe to run — observability simply degrades gracefully.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `stress_predictor_requests_total` | Counter | `outcome` |
//! | `stress_predictor_cache_hits_total` | Counter | — |
//! | `stress_predictor_fallbacks_total` | Counter | `reason` |
//! | `stress_predictor_predict_duration_seconds` | Histogram | — |

use crate::PredictorError;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

// ── Internal metrics bundle ────────────────────────────────────────────────

/// All Prometheus metrics for the service, bundled so they can be stored
/// in a single [`OnceLock`] and initialised atomically.
pub struct Metrics {
    /// Prometheus registry that owns all metric descriptors.
    pub registry: Registry,
    /// Predictions by outcome (`success` / `fallback` / `invalid`).
    pub requests_total: CounterVec,
    /// Predictions served from the response cache.
    pub cache_hits: Counter,
    /// Fallback responses by failure reason.
    pub fallbacks_total: CounterVec,
    /// End-to-end predict latency.
    pub predict_duration: Histogram,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

// ── Initialisation ─────────────────────────────────────────────────────────

/// Initialise all Prometheus metrics and register them with a private
/// registry.
///
/// Calling it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`PredictorError::Other`] if metric construction or registry
/// registration fails (e.g., duplicate descriptor names).
pub fn init_metrics() -> Result<(), PredictorError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = CounterVec::new(
        Opts::new(
            "stress_predictor_requests_total",
            "Predictions by outcome",
        ),
        &["outcome"],
    )
    .map_err(|e| PredictorError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(requests_total.clone()))
        .map_err(|e| PredictorError::Other(format!("metrics registration failed: {e}")))?;

    let cache_hits = Counter::new(
        "stress_predictor_cache_hits_total",
        "Predictions served from the response cache",
    )
    .map_err(|e| PredictorError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(cache_hits.clone()))
        .map_err(|e| PredictorError::Other(format!("metrics registration failed: {e}")))?;

    let fallbacks_total = CounterVec::new(
        Opts::new(
            "stress_predictor_fallbacks_total",
            "Fallback responses by failure reason",
        ),
        &["reason"],
    )
    .map_err(|e| PredictorError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(fallbacks_total.clone()))
        .map_err(|e| PredictorError::Other(format!("metrics registration failed: {e}")))?;

    let predict_duration = Histogram::with_opts(HistogramOpts::new(
        "stress_predictor_predict_duration_seconds",
        "End-to-end predict latency",
    ))
    .map_err(|e| PredictorError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(predict_duration.clone()))
        .map_err(|e| PredictorError::Other(format!("metrics registration failed: {e}")))?;

    // If another thread raced us, the first one wins — both initializations
    // produce identical metric descriptors, so neither outcome is incorrect.
    let _ = METRICS.set(Metrics {
        registry,
        requests_total,
        cache_hits,
        fallbacks_total,
        predict_duration,
    });

    Ok(())
}

/// Return the initialised [`Metrics`], or `None` if [`init_metrics`] has
/// not been called yet.
fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

// ── Public helper functions ────────────────────────────────────────────────

/// Increment the prediction counter for an outcome label.
///
/// No-op if metrics have not been initialised.
pub fn inc_request(outcome: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.requests_total.get_metric_with_label_values(&[outcome]) {
            c.inc();
        }
    }
}

/// Increment the cache-hit counter.
///
/// No-op if metrics have not been initialised.
pub fn inc_cache_hit() {
    if let Some(m) = metrics() {
        m.cache_hits.inc();
    }
}

/// Increment the fallback counter for a failure reason.
///
/// No-op if metrics have not been initialised.
pub fn inc_fallback(reason: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.fallbacks_total.get_metric_with_label_values(&[reason]) {
            c.inc();
        }
    }
}

/// Record end-to-end predict latency.
///
/// No-op if metrics have not been initialised.
pub fn record_predict_latency(d: Duration) {
    if let Some(m) = metrics() {
        m.predict_duration.observe(d.as_secs_f64());
    }
}

/// Gather and encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails. Observability degrades gracefully rather than
/// panicking.
pub fn gather_metrics() -> String {
    let Some(m) = metrics() else {
        return String::new();
    };
    let families = m.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics().expect("first init succeeds");
        init_metrics().expect("second init is a no-op");
    }

    #[test]
    fn test_helpers_record_after_init() {
        init_metrics().expect("init succeeds");
        inc_request("success");
        inc_cache_hit();
        inc_fallback("inference");
        record_predict_latency(Duration::from_millis(3));
        let text = gather_metrics();
        assert!(text.contains("stress_predictor_requests_total"));
        assert!(text.contains("stress_predictor_cache_hits_total"));
    }
}
