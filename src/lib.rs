//! # stress-predictor
//!
//! A prediction-serving backend for stress-level assessment.
//!
//! ## Architecture
//!
//! Single prediction pipeline orchestrated by a service facade:
//! ```text
//! raw JSON → Validate → Cache? → Encode → Infer → Generate → Cache → FormattedResponse
//! ```
//!
//! The classifier artifact is loaded once at startup; if no candidate
//! artifact is loadable the facade runs degraded and every prediction
//! returns a fixed fallback response.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod artifact;
pub mod cache;
pub mod config;
pub mod encode;
pub mod generator;
pub mod infer;
pub mod metrics;
pub mod request;
pub mod response;
pub mod service;
pub mod validate;

#[cfg(feature = "web-api")]
pub mod web_api;

// Re-exports for convenience
pub use artifact::{Classifier, ModelArtifact};
pub use request::{ExerciseType, Gender, PredictionRequest, StressLevel, YesNo};
pub use response::{FormattedResponse, WellnessPlan, WellnessTask};
pub use service::{PredictOutcome, StressService};
pub use validate::FieldViolation;

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"` — structured JSON output for production log aggregators
/// - anything else (including unset) — human-readable pretty output
///   for local development
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`PredictorError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
pub fn init_tracing() -> Result<(), PredictorError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| PredictorError::Other(format!("tracing init failed: {e}")))
}

/// Top-level predictor errors.
///
/// Validation failures are deliberately *not* an error variant: they are
/// client-correctable data carried by [`service::PredictOutcome::Invalid`],
/// while everything here is a server-side failure that the facade absorbs
/// into the fallback response.
#[derive(Error, Debug)]
pub enum PredictorError {
    /// No candidate model artifact could be loaded at startup.
    #[error("artifact load failed: {0}")]
    ArtifactLoad(#[from] artifact::ArtifactLoadError),

    /// A declared model feature could not be encoded from the request.
    ///
    /// This indicates an artifact/request-schema mismatch, not bad client
    /// input — validation has already constrained every field.
    #[error("feature encoding failed: {0}")]
    Encoding(#[from] encode::EncodingError),

    /// The classifier failed during predict or predict_proba.
    #[error("inference failed: {0}")]
    Inference(#[from] infer::InferenceError),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}
