//! Model artifact loading and the classifier seam.
//!
//! An artifact is a JSON bundle: the serialized classifier, its declared
//! feature order, a display name, an evaluation score, and optionally the
//! class-label vocabulary. Loading probes a preference-ordered candidate
//! list and takes the first bundle that parses and passes sanity checks.
//!
//! [`Classifier`] is the inference seam: the rest of the pipeline only
//! ever sees `Box<dyn Classifier>` plus a [`LabelDecoder`] chosen once at
//! load time, so swapping model families never touches the serving code.

use crate::infer::InferenceError;
use crate::request::StressLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Failure to load a model artifact from disk.
#[derive(Error, Debug)]
pub enum ArtifactLoadError {
    /// No file at the candidate path.
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but is empty.
    #[error("artifact file is empty: {0}")]
    Empty(PathBuf),

    /// The file could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid artifact bundle.
    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The bundle parsed but fails a sanity check.
    #[error("invalid artifact {path}: {reason}")]
    Invalid {
        /// Path that failed.
        path: PathBuf,
        /// What the check found.
        reason: String,
    },

    /// Every candidate path failed.
    #[error("no usable artifact among {0} candidate path(s)")]
    NoUsableArtifact(usize),
}

/// A trained stress classifier.
///
/// `predict` is required; probability estimates and feature importances
/// are capabilities a model may or may not have, so their defaults report
/// absence rather than failure.
pub trait Classifier: Send + Sync {
    /// Predict a class index for each feature row.
    ///
    /// # Errors
    ///
    /// [`InferenceError`] if a row cannot be scored (e.g. a feature index
    /// out of bounds for the tree).
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, InferenceError>;

    /// Per-class probability estimates, if the model supports them.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Classifier::predict`].
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        Ok(None)
    }

    /// Per-feature importance weights, if the model exposes them.
    ///
    /// Indices align with the artifact's declared feature order.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

/// A node in a serialized decision tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal split: `x[feature] <= threshold` goes left, else right.
    Split {
        /// Feature index into the row.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Subtree for `x[feature] <= threshold`.
        left: Box<TreeNode>,
        /// Subtree for `x[feature] > threshold`.
        right: Box<TreeNode>,
    },
    /// Leaf: per-class sample counts (or weights) from training.
    Leaf {
        /// Class distribution; argmax is the predicted class.
        distribution: Vec<f64>,
    },
}

impl TreeNode {
    /// Walk to the leaf for `row` and return its class distribution.
    fn leaf_distribution<'a>(&'a self, row: &[f64]) -> Result<&'a [f64], InferenceError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return Ok(distribution),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().ok_or_else(|| {
                        InferenceError::Classifier(format!(
                            "tree split on feature index {feature} but row has {} features",
                            row.len()
                        ))
                    })?;
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Index of the largest entry in a class distribution.
fn argmax(distribution: &[f64]) -> Result<usize, InferenceError> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &w) in distribution.iter().enumerate() {
        match best {
            Some((_, bw)) if w <= bw => {}
            _ => best = Some((i, w)),
        }
    }
    best.map(|(i, _)| i).ok_or(InferenceError::EmptyPrediction)
}

/// Normalize a distribution to sum to 1; uniform if all-zero.
fn normalize(distribution: &[f64]) -> Vec<f64> {
    let sum: f64 = distribution.iter().sum();
    if sum > 0.0 {
        distribution.iter().map(|w| w / sum).collect()
    } else {
        let n = distribution.len().max(1);
        vec![1.0 / n as f64; distribution.len()]
    }
}

/// Serialized classifier, tagged by model family.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// A single decision tree.
    DecisionTree {
        /// Root node.
        root: TreeNode,
        /// Optional importance weights aligned with the feature order.
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
    },
    /// An ensemble of trees; probabilities are averaged across members.
    RandomForest {
        /// Ensemble members.
        trees: Vec<TreeNode>,
        /// Optional importance weights aligned with the feature order.
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
    },
    /// A constant-prediction baseline: always the majority class from
    /// training. No probability estimates, no importances.
    Prior {
        /// The class index it always predicts.
        class: usize,
    },
}

impl ClassifierSpec {
    /// Instantiate the runtime classifier for this spec.
    fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierSpec::DecisionTree {
                root,
                feature_importances,
            } => Box::new(DecisionTreeModel {
                root,
                feature_importances,
            }),
            ClassifierSpec::RandomForest {
                trees,
                feature_importances,
            } => Box::new(RandomForestModel {
                trees,
                feature_importances,
            }),
            ClassifierSpec::Prior { class } => Box::new(PriorModel { class }),
        }
    }
}

struct DecisionTreeModel {
    root: TreeNode,
    feature_importances: Option<Vec<f64>>,
}

impl Classifier for DecisionTreeModel {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, InferenceError> {
        rows.iter()
            .map(|row| argmax(self.root.leaf_distribution(row)?))
            .collect()
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(normalize(self.root.leaf_distribution(row)?));
        }
        Ok(Some(out))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}

struct RandomForestModel {
    trees: Vec<TreeNode>,
    feature_importances: Option<Vec<f64>>,
}

impl RandomForestModel {
    /// Mean of the member trees' normalized leaf distributions.
    fn mean_distribution(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::Classifier(
                "random forest has no trees".to_string(),
            ));
        }
        let mut acc: Vec<f64> = Vec::new();
        for tree in &self.trees {
            let dist = normalize(tree.leaf_distribution(row)?);
            if acc.is_empty() {
                acc = dist;
            } else {
                if dist.len() != acc.len() {
                    return Err(InferenceError::Classifier(
                        "forest members disagree on class count".to_string(),
                    ));
                }
                for (a, d) in acc.iter_mut().zip(dist) {
                    *a += d;
                }
            }
        }
        let n = self.trees.len() as f64;
        for a in &mut acc {
            *a /= n;
        }
        Ok(acc)
    }
}

impl Classifier for RandomForestModel {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, InferenceError> {
        rows.iter()
            .map(|row| argmax(&self.mean_distribution(row)?))
            .collect()
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.mean_distribution(row)?);
        }
        Ok(Some(out))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}

struct PriorModel {
    class: usize,
}

impl Classifier for PriorModel {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, InferenceError> {
        Ok(vec![self.class; rows.len()])
    }
}

/// Class-index to stress-level mapping, fixed at artifact load.
///
/// Bundles that carry a `classes` array get a [`LabelDecoder::Names`]
/// decoder matching labels case-insensitively; bundles without one use
/// the training convention `{0: Low, 1: Medium, 2: High}`.
#[derive(Debug, Clone)]
pub enum LabelDecoder {
    /// Fixed integer-code convention.
    Codes,
    /// Explicit class vocabulary from the bundle, indexed by class.
    Names(Vec<String>),
}

impl LabelDecoder {
    /// Decode a class index to a stress level.
    ///
    /// # Errors
    ///
    /// [`InferenceError::UnknownLabel`] if the index is outside the
    /// vocabulary or the name is not a stress level.
    pub fn decode(&self, class: usize) -> Result<StressLevel, InferenceError> {
        match self {
            LabelDecoder::Codes => match class {
                0 => Ok(StressLevel::Low),
                1 => Ok(StressLevel::Medium),
                2 => Ok(StressLevel::High),
                _ => Err(InferenceError::UnknownLabel(class.to_string())),
            },
            LabelDecoder::Names(names) => {
                let name = names
                    .get(class)
                    .ok_or_else(|| InferenceError::UnknownLabel(class.to_string()))?;
                match name.to_ascii_lowercase().as_str() {
                    "low" => Ok(StressLevel::Low),
                    "medium" => Ok(StressLevel::Medium),
                    "high" => Ok(StressLevel::High),
                    _ => Err(InferenceError::UnknownLabel(name.clone())),
                }
            }
        }
    }
}

/// On-disk bundle layout.
#[derive(Debug, Deserialize)]
struct ArtifactBundle {
    model: ClassifierSpec,
    feature_names: Vec<String>,
    model_name: String,
    model_score: f64,
    #[serde(default)]
    classes: Option<Vec<String>>,
}

/// A loaded, validated model artifact.
pub struct ModelArtifact {
    /// The classifier behind the inference seam.
    pub classifier: Box<dyn Classifier>,
    /// Feature order the classifier was trained on.
    pub feature_names: Vec<String>,
    /// Display name for responses and health reporting.
    pub model_name: String,
    /// Held-out evaluation score in `[0, 1]`.
    pub model_score: f64,
    /// Class-index decoder chosen from the bundle.
    pub labels: LabelDecoder,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("model_name", &self.model_name)
            .field("model_score", &self.model_score)
            .field("feature_names", &self.feature_names.len())
            .finish()
    }
}

impl ModelArtifact {
    /// Load and validate one artifact bundle.
    ///
    /// # Errors
    ///
    /// [`ArtifactLoadError`] for a missing, empty, unreadable, unparsable,
    /// or sanity-check-failing bundle.
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        if !path.exists() {
            return Err(ArtifactLoadError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Err(ArtifactLoadError::Empty(path.to_path_buf()));
        }
        let bundle: ArtifactBundle =
            serde_json::from_str(&raw).map_err(|source| ArtifactLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if bundle.feature_names.is_empty() {
            return Err(ArtifactLoadError::Invalid {
                path: path.to_path_buf(),
                reason: "feature_names is empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&bundle.model_score) {
            return Err(ArtifactLoadError::Invalid {
                path: path.to_path_buf(),
                reason: format!("model_score {} outside [0, 1]", bundle.model_score),
            });
        }

        let labels = match bundle.classes {
            Some(names) if !names.is_empty() => LabelDecoder::Names(names),
            _ => LabelDecoder::Codes,
        };

        Ok(Self {
            classifier: bundle.model.into_classifier(),
            feature_names: bundle.feature_names,
            model_name: bundle.model_name,
            model_score: bundle.model_score,
            labels,
        })
    }

    /// Try candidate paths in preference order; first success wins.
    ///
    /// # Errors
    ///
    /// [`ArtifactLoadError::NoUsableArtifact`] when every candidate fails.
    pub fn load_first_available(
        candidates: &[PathBuf],
    ) -> Result<(Self, PathBuf), ArtifactLoadError> {
        for path in candidates {
            match Self::load(path) {
                Ok(artifact) => {
                    info!(
                        path = %path.display(),
                        model = %artifact.model_name,
                        score = artifact.model_score,
                        "loaded model artifact"
                    );
                    return Ok((artifact, path.clone()));
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "artifact candidate rejected");
                }
            }
        }
        Err(ArtifactLoadError::NoUsableArtifact(candidates.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// A one-split tree over a 2-feature row: x[0] <= 5.0 → class 0,
    /// else class 2.
    fn tree_bundle_json() -> String {
        serde_json::json!({
            "model": {
                "type": "decision_tree",
                "root": {
                    "kind": "split",
                    "feature": 0,
                    "threshold": 5.0,
                    "left": {"kind": "leaf", "distribution": [8.0, 1.0, 1.0]},
                    "right": {"kind": "leaf", "distribution": [0.0, 2.0, 8.0]}
                },
                "feature_importances": [0.9, 0.1]
            },
            "feature_names": ["Work_Hours", "Screen_Time"],
            "model_name": "decision_tree",
            "model_score": 0.87
        })
        .to_string()
    }

    fn write_artifact(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write artifact");
        file
    }

    #[test]
    fn test_load_valid_tree_bundle() {
        let file = write_artifact(&tree_bundle_json());
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        assert_eq!(artifact.model_name, "decision_tree");
        assert_eq!(artifact.feature_names.len(), 2);
        assert!(matches!(artifact.labels, LabelDecoder::Codes));
    }

    #[test]
    fn test_tree_predict_follows_split() {
        let file = write_artifact(&tree_bundle_json());
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        let classes = artifact
            .classifier
            .predict(&[vec![4.0, 0.0], vec![6.0, 0.0]])
            .expect("predict succeeds");
        assert_eq!(classes, vec![0, 2]);
    }

    #[test]
    fn test_tree_proba_normalizes_leaf_distribution() {
        let file = write_artifact(&tree_bundle_json());
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        let proba = artifact
            .classifier
            .predict_proba(&[vec![4.0, 0.0]])
            .expect("proba succeeds")
            .expect("trees expose probabilities");
        assert_eq!(proba[0], vec![0.8, 0.1, 0.1]);
    }

    #[test]
    fn test_tree_exposes_importances() {
        let file = write_artifact(&tree_bundle_json());
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        assert_eq!(artifact.classifier.feature_importances(), Some(&[0.9, 0.1][..]));
    }

    #[test]
    fn test_prior_model_has_no_proba_or_importances() {
        let json = serde_json::json!({
            "model": {"type": "prior", "class": 1},
            "feature_names": ["Age"],
            "model_name": "prior",
            "model_score": 0.5
        })
        .to_string();
        let file = write_artifact(&json);
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        assert_eq!(
            artifact.classifier.predict(&[vec![30.0]]).expect("predict"),
            vec![1]
        );
        assert_eq!(
            artifact
                .classifier
                .predict_proba(&[vec![30.0]])
                .expect("proba call succeeds"),
            None
        );
        assert!(artifact.classifier.feature_importances().is_none());
    }

    #[test]
    fn test_forest_averages_member_distributions() {
        let json = serde_json::json!({
            "model": {
                "type": "random_forest",
                "trees": [
                    {"kind": "leaf", "distribution": [1.0, 0.0, 0.0]},
                    {"kind": "leaf", "distribution": [0.0, 0.0, 1.0]},
                    {"kind": "leaf", "distribution": [0.0, 0.0, 1.0]}
                ]
            },
            "feature_names": ["Age"],
            "model_name": "random_forest",
            "model_score": 0.9
        })
        .to_string();
        let file = write_artifact(&json);
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        let proba = artifact
            .classifier
            .predict_proba(&[vec![30.0]])
            .expect("proba succeeds")
            .expect("forests expose probabilities");
        let expected = 2.0 / 3.0;
        assert!((proba[0][2] - expected).abs() < 1e-12);
        assert_eq!(
            artifact.classifier.predict(&[vec![30.0]]).expect("predict"),
            vec![2]
        );
    }

    #[test]
    fn test_classes_array_selects_name_decoder() {
        let json = serde_json::json!({
            "model": {"type": "prior", "class": 0},
            "feature_names": ["Age"],
            "model_name": "prior",
            "model_score": 0.5,
            "classes": ["HIGH", "low", "Medium"]
        })
        .to_string();
        let file = write_artifact(&json);
        let artifact = ModelArtifact::load(file.path()).expect("bundle loads");
        // Names decoder matches case-insensitively, indexed by class.
        assert_eq!(artifact.labels.decode(0).expect("decode"), StressLevel::High);
        assert_eq!(artifact.labels.decode(1).expect("decode"), StressLevel::Low);
        assert_eq!(artifact.labels.decode(2).expect("decode"), StressLevel::Medium);
    }

    #[test]
    fn test_code_decoder_rejects_out_of_range() {
        let decoder = LabelDecoder::Codes;
        assert_eq!(decoder.decode(1).expect("decode"), StressLevel::Medium);
        assert!(decoder.decode(3).is_err());
    }

    #[test]
    fn test_name_decoder_rejects_unknown_label() {
        let decoder = LabelDecoder::Names(vec!["Low".to_string(), "Severe".to_string()]);
        assert!(decoder.decode(1).is_err());
        assert!(decoder.decode(5).is_err());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ArtifactLoadError::NotFound(_)));
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = write_artifact("  \n");
        let err = ModelArtifact::load(file.path()).expect_err("empty file must fail");
        assert!(matches!(err, ArtifactLoadError::Empty(_)));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let json = serde_json::json!({
            "model": {"type": "prior", "class": 0},
            "feature_names": ["Age"],
            "model_name": "prior",
            "model_score": 1.5
        })
        .to_string();
        let file = write_artifact(&json);
        let err = ModelArtifact::load(file.path()).expect_err("score 1.5 must fail");
        assert!(matches!(err, ArtifactLoadError::Invalid { .. }));
    }

    #[test]
    fn test_first_available_skips_bad_candidates() {
        let good = write_artifact(&tree_bundle_json());
        let candidates = vec![
            PathBuf::from("/nonexistent/test_model.json"),
            good.path().to_path_buf(),
        ];
        let (artifact, path) =
            ModelArtifact::load_first_available(&candidates).expect("second candidate loads");
        assert_eq!(artifact.model_name, "decision_tree");
        assert_eq!(path, good.path());
    }

    #[test]
    fn test_no_usable_artifact_when_all_fail() {
        let candidates = vec![PathBuf::from("/nonexistent/a.json")];
        let err = ModelArtifact::load_first_available(&candidates)
            .expect_err("all candidates failing must error");
        assert!(matches!(err, ArtifactLoadError::NoUsableArtifact(1)));
    }
}
