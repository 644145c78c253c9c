//! Feature encoding: validated request fields into the numeric vector the
//! classifier consumes.
//!
//! The artifact declares its feature order; the encoder walks that order
//! and looks each name up in the request's model-format projection.
//! Categorical labels are replaced by fixed integer codes matching the
//! training-time encoding. The tables are code, not data: they changed
//! exactly once (at training time) and must never drift from the model.

use crate::request::FieldValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure to encode a declared model feature.
///
/// These are server-side artifact/request-schema mismatches. Client input
/// cannot trigger them: validation has already constrained every field to
/// the canonical vocabulary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// A categorical value has no code in the mapping table.
    #[error("no encoding for category {value:?} of feature {feature:?}")]
    UnmappedCategory {
        /// The feature being encoded.
        feature: String,
        /// The label with no code.
        value: String,
    },
    /// The artifact declares a feature the request schema does not carry.
    #[error("model declares unknown feature {feature:?}")]
    UnknownFeature {
        /// The declared feature name.
        feature: String,
    },
}

/// Integer code for a categorical label, per the training-time encoding.
fn category_code(feature: &str, value: &str) -> Option<f64> {
    let code = match (feature, value) {
        ("Gender", "Male") => 0,
        ("Gender", "Female") => 1,
        ("Smoking_Habit", "No") => 0,
        ("Smoking_Habit", "Yes") => 1,
        ("Meditation_Practice", "No") => 0,
        ("Meditation_Practice", "Yes") => 1,
        ("Exercise_Type", "Cardio") => 0,
        ("Exercise_Type", "Yoga") => 1,
        ("Exercise_Type", "Strength Training") => 2,
        ("Exercise_Type", "Aerobics") => 3,
        ("Exercise_Type", "Walking") => 4,
        ("Exercise_Type", "Pilates") => 5,
        _ => return None,
    };
    Some(f64::from(code))
}

/// Build the feature vector in the artifact's declared order.
///
/// # Errors
///
/// [`EncodingError::UnknownFeature`] if the artifact declares a feature
/// the request does not carry; [`EncodingError::UnmappedCategory`] if a
/// categorical label has no integer code.
pub fn encode_features(
    fields: &BTreeMap<String, FieldValue>,
    feature_names: &[String],
) -> Result<Vec<f64>, EncodingError> {
    let mut row = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        let value = fields
            .get(name)
            .ok_or_else(|| EncodingError::UnknownFeature {
                feature: name.clone(),
            })?;
        match value {
            FieldValue::Number(n) => row.push(*n),
            FieldValue::Category(label) => {
                let code =
                    category_code(name, label).ok_or_else(|| EncodingError::UnmappedCategory {
                        feature: name.clone(),
                        value: label.clone(),
                    })?;
                row.push(code);
            }
        }
    }
    Ok(row)
}
