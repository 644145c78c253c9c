//! Inference engine: one encoded feature row through the classifier.

use crate::artifact::ModelArtifact;
use crate::request::StressLevel;
use std::collections::BTreeMap;
use thiserror::Error;

/// Confidence reported when a model has no probability interface.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Failure during classifier inference.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The classifier itself failed to score the row.
    #[error("classifier error: {0}")]
    Classifier(String),

    /// The predicted class does not map to a stress level.
    #[error("classifier produced unknown label {0:?}")]
    UnknownLabel(String),

    /// The classifier returned no prediction for the row.
    #[error("classifier returned an empty prediction")]
    EmptyPrediction,
}

/// Outcome of scoring one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Decoded stress level.
    pub label: StressLevel,
    /// Max class probability, or [`DEFAULT_CONFIDENCE`] when the model
    /// has no probability interface.
    pub confidence: f64,
    /// Importance weights keyed by feature name, when the model exposes
    /// them and the weight vector aligns with the declared features.
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

/// Fixed numeric midpoint for a stress level, for gauge-style display.
pub fn numeric_score(level: StressLevel) -> u8 {
    match level {
        StressLevel::Low => 25,
        StressLevel::Medium => 50,
        StressLevel::High => 75,
    }
}

/// Score one encoded feature row.
///
/// Runs the classifier as a single-row batch, decodes the class index
/// through the artifact's label decoder, and extracts confidence and
/// feature importances where the model offers them.
///
/// # Errors
///
/// [`InferenceError`] if the classifier fails or its output cannot be
/// decoded. The facade absorbs these into the fallback response.
pub fn run_inference(
    artifact: &ModelArtifact,
    features: &[f64],
) -> Result<PredictionResult, InferenceError> {
    let batch = [features.to_vec()];
    let classes = artifact.classifier.predict(&batch)?;
    let class = *classes.first().ok_or(InferenceError::EmptyPrediction)?;
    let label = artifact.labels.decode(class)?;

    let confidence = match artifact.classifier.predict_proba(&batch)? {
        Some(proba) => {
            let row = proba.first().ok_or(InferenceError::EmptyPrediction)?;
            row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        }
        None => DEFAULT_CONFIDENCE,
    };
    if !confidence.is_finite() {
        return Err(InferenceError::EmptyPrediction);
    }

    let feature_importance = artifact.classifier.feature_importances().and_then(|weights| {
        if weights.len() != artifact.feature_names.len() {
            return None;
        }
        Some(
            artifact
                .feature_names
                .iter()
                .cloned()
                .zip(weights.iter().copied())
                .collect::<BTreeMap<String, f64>>(),
        )
    });

    Ok(PredictionResult {
        label,
        confidence,
        feature_importance,
    })
}
