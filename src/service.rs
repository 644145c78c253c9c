//! Service facade: lifecycle, orchestration, and the always-answer policy.
//!
//! [`StressService`] owns the loaded artifact, the response cache, and the
//! lifecycle state. Its [`predict`](StressService::predict) runs the whole
//! pipeline and absorbs every server-side failure into a fixed fallback
//! response; only client-correctable validation failures surface.

use crate::artifact::ModelArtifact;
use crate::cache::{cache_key, ResponseCache};
use crate::config::ServiceConfig;
use crate::encode::encode_features;
use crate::generator::format_response;
use crate::infer::run_inference;
use crate::metrics;
use crate::request::{PredictionRequest, StressLevel};
use crate::response::{FormattedResponse, TaskKind, WellnessPlan, WellnessTask};
use crate::validate::{validate, FieldViolation};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lifecycle state of the facade.
///
/// `Degraded` is terminal: once startup fails to produce an artifact the
/// service answers every prediction with the fallback response until the
/// process is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed but not yet asked to load.
    Uninitialized,
    /// Artifact candidates are being probed.
    Loading,
    /// An artifact is loaded and serving real predictions.
    Ready,
    /// No artifact could be loaded; serving fallback responses only.
    Degraded,
}

/// Outcome of one prediction.
///
/// Success and Fallback both carry a complete response — the caller maps
/// either to HTTP 200. Invalid carries the full violation list for a 422.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    /// A real prediction, fresh or cached.
    Success(FormattedResponse),
    /// The fixed fallback response after a server-side failure.
    Fallback(FormattedResponse),
    /// Client input failed validation.
    Invalid(Vec<FieldViolation>),
}

/// Introspection snapshot for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Whether an artifact is loaded.
    pub loaded: bool,
    /// Model display name, when loaded.
    pub model_name: Option<String>,
    /// Model evaluation score, when loaded.
    pub model_score: Option<f64>,
    /// Number of declared features, 0 when degraded.
    pub feature_count: usize,
}

/// The prediction service facade.
pub struct StressService {
    artifact: Option<ModelArtifact>,
    cache: ResponseCache,
    state: ServiceState,
    loaded_from: Option<PathBuf>,
    inference_count: AtomicU64,
}

impl StressService {
    /// Build the service from configuration, probing artifact candidates
    /// in preference order. Never fails: if no candidate loads, the
    /// service comes up degraded.
    pub fn initialize(config: &ServiceConfig) -> Self {
        let mut service = Self {
            artifact: None,
            cache: ResponseCache::new(config.cache.ttl()),
            state: ServiceState::Loading,
            loaded_from: None,
            inference_count: AtomicU64::new(0),
        };

        match ModelArtifact::load_first_available(&config.artifact.candidate_paths()) {
            Ok((artifact, path)) => {
                info!(
                    model = %artifact.model_name,
                    path = %path.display(),
                    "service ready"
                );
                service.artifact = Some(artifact);
                service.loaded_from = Some(path);
                service.state = ServiceState::Ready;
            }
            Err(err) => {
                error!(error = %err, "no artifact loaded, serving fallback responses");
                service.state = ServiceState::Degraded;
            }
        }
        service
    }

    /// Build a ready service around an already-loaded artifact.
    pub fn from_artifact(artifact: ModelArtifact, cache_ttl: Duration) -> Self {
        Self {
            artifact: Some(artifact),
            cache: ResponseCache::new(cache_ttl),
            state: ServiceState::Ready,
            loaded_from: None,
            inference_count: AtomicU64::new(0),
        }
    }

    /// Build a degraded service with no artifact.
    pub fn degraded(cache_ttl: Duration) -> Self {
        Self {
            artifact: None,
            cache: ResponseCache::new(cache_ttl),
            state: ServiceState::Degraded,
            loaded_from: None,
            inference_count: AtomicU64::new(0),
        }
    }

    /// Whether the service holds a loaded artifact.
    pub fn is_ready(&self) -> bool {
        self.state == ServiceState::Ready
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Path the artifact was loaded from, when it came from disk.
    pub fn loaded_from(&self) -> Option<&PathBuf> {
        self.loaded_from.as_ref()
    }

    /// Number of predictions that actually ran the classifier (cache hits
    /// and fallbacks excluded).
    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    /// Current response-cache entry count.
    pub fn cache_entries(&self) -> usize {
        self.cache.len()
    }

    /// Introspection snapshot for health reporting.
    pub fn describe(&self) -> ModelInfo {
        match &self.artifact {
            Some(artifact) => ModelInfo {
                loaded: true,
                model_name: Some(artifact.model_name.clone()),
                model_score: Some(artifact.model_score),
                feature_count: artifact.feature_names.len(),
            },
            None => ModelInfo {
                loaded: false,
                model_name: None,
                model_score: None,
                feature_count: 0,
            },
        }
    }

    /// Run one prediction end to end.
    ///
    /// Validation runs first in every state, so a malformed request gets
    /// its violation list even from a degraded service. After that, any
    /// server-side failure degrades to the fallback response; this method
    /// never errors.
    pub fn predict(&self, raw: &Value) -> PredictOutcome {
        let started = Instant::now();

        let request = match validate(raw) {
            Ok(request) => request,
            Err(violations) => {
                warn!(violations = violations.len(), "request rejected");
                metrics::inc_request("invalid");
                return PredictOutcome::Invalid(violations);
            }
        };

        if self.state != ServiceState::Ready {
            metrics::inc_request("fallback");
            metrics::inc_fallback("degraded");
            return PredictOutcome::Fallback(fallback_response());
        }

        log_stress_indicators(&request);

        let key = cache_key(&request);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "cache hit");
            metrics::inc_cache_hit();
            metrics::inc_request("success");
            metrics::record_predict_latency(started.elapsed());
            return PredictOutcome::Success(cached);
        }

        let Some(artifact) = self.artifact.as_ref() else {
            // Ready without an artifact cannot happen through the public
            // constructors; treat it as degraded anyway.
            metrics::inc_request("fallback");
            metrics::inc_fallback("no_artifact");
            return PredictOutcome::Fallback(fallback_response());
        };

        let features = match encode_features(&request.model_fields(), &artifact.feature_names) {
            Ok(features) => features,
            Err(err) => {
                error!(error = %err, "feature encoding failed");
                metrics::inc_request("fallback");
                metrics::inc_fallback("encoding");
                return PredictOutcome::Fallback(fallback_response());
            }
        };

        let prediction = match run_inference(artifact, &features) {
            Ok(prediction) => prediction,
            Err(err) => {
                error!(error = %err, "inference failed");
                metrics::inc_request("fallback");
                metrics::inc_fallback("inference");
                return PredictOutcome::Fallback(fallback_response());
            }
        };
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        let response = format_response(
            &request,
            &prediction,
            &artifact.model_name,
            artifact.model_score,
        );
        self.cache.put(key, response.clone());

        info!(
            level = %prediction.label,
            confidence = prediction.confidence,
            "prediction served"
        );
        metrics::inc_request("success");
        metrics::record_predict_latency(started.elapsed());
        PredictOutcome::Success(response)
    }
}

/// Debug-level hints about the lifestyle factors most likely to drive the
/// prediction; useful when eyeballing logs against model output.
fn log_stress_indicators(request: &PredictionRequest) {
    debug!(
        low_sleep = request.sleep_duration < 6.0,
        long_work_hours = request.work_hours > 10.0,
        low_activity = request.physical_activity < 2,
        "stress indicators"
    );
}

/// The fixed response served when the pipeline cannot produce a real
/// prediction. Content is conservative mid-range guidance.
pub fn fallback_response() -> FormattedResponse {
    FormattedResponse {
        level: StressLevel::Medium,
        score: 50,
        confidence: 0.5,
        insights: vec![
            "We're experiencing technical difficulties with our analysis".to_string(),
            "Please try again in a few minutes for a personalized assessment".to_string(),
        ],
        recommendations: vec![
            "Focus on basic wellness practices".to_string(),
            "Maintain regular sleep and exercise routines".to_string(),
            "Practice stress-reduction techniques".to_string(),
        ],
        wellness_plan: WellnessPlan {
            title: "Basic Wellness Plan".to_string(),
            summary: "General wellness recommendations while we resolve technical issues"
                .to_string(),
            tasks: vec![
                WellnessTask {
                    id: "fallback-1".to_string(),
                    title: "Practice Deep Breathing".to_string(),
                    kind: TaskKind::Tool,
                    link: "/tools/breathing".to_string(),
                    reward: 10,
                },
                WellnessTask {
                    id: "fallback-2".to_string(),
                    title: "Take a Short Walk".to_string(),
                    kind: TaskKind::Lifestyle,
                    link: "/wellness/walking".to_string(),
                    reward: 10,
                },
                WellnessTask {
                    id: "fallback-3".to_string(),
                    title: "Stay Hydrated".to_string(),
                    kind: TaskKind::Lifestyle,
                    link: "/wellness/hydration".to_string(),
                    reward: 5,
                },
            ],
        },
        model_name: Some("Fallback Response".to_string()),
        model_score: None,
        feature_importance: None,
    }
}
