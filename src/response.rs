//! Wire types for the formatted prediction response.
//!
//! Field naming follows the frontend contract: the wellness plan is
//! serialized as `wellnessPlan` and task kinds as `type`. Everything else
//! stays snake_case.

use crate::request::StressLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete response returned for a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResponse {
    /// Predicted stress level.
    pub level: StressLevel,
    /// Fixed numeric midpoint for the level (25 / 50 / 75).
    pub score: u8,
    /// Prediction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable observations about the submission, at most five.
    pub insights: Vec<String>,
    /// Actionable suggestions, deduplicated, at most six.
    pub recommendations: Vec<String>,
    /// Structured task plan for the predicted level.
    #[serde(rename = "wellnessPlan")]
    pub wellness_plan: WellnessPlan,
    /// Name of the model that produced the prediction, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Held-out evaluation score of that model, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_score: Option<f64>,
    /// Per-feature importance weights, when the model exposes them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

/// A titled set of wellness tasks tailored to a stress level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessPlan {
    /// Plan title.
    pub title: String,
    /// One-sentence description, possibly extended by a personalization
    /// suffix.
    pub summary: String,
    /// The tasks, at most six.
    pub tasks: Vec<WellnessTask>,
}

/// A single actionable task inside a wellness plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessTask {
    /// Stable-per-response task id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Task category.
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// In-app navigation target.
    pub link: String,
    /// Gamification reward points.
    pub reward: u32,
}

/// Category of a wellness task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// An interactive in-app tool.
    Tool,
    /// A lifestyle change or habit.
    Lifestyle,
    /// A reading resource.
    Article,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> FormattedResponse {
        FormattedResponse {
            level: StressLevel::Medium,
            score: 50,
            confidence: 0.91,
            insights: vec!["Your current stress level is medium".to_string()],
            recommendations: vec!["Focus on improving sleep quality and duration".to_string()],
            wellness_plan: WellnessPlan {
                title: "Stress Reduction Plan".to_string(),
                summary: "A focused plan to help reduce your stress levels through targeted \
                          interventions"
                    .to_string(),
                tasks: vec![WellnessTask {
                    id: "task-1-deadbeef".to_string(),
                    title: "Deep Breathing Exercises".to_string(),
                    kind: TaskKind::Tool,
                    link: "/tools/breathing-exercises".to_string(),
                    reward: 20,
                }],
            },
            model_name: Some("decision_tree".to_string()),
            model_score: Some(0.87),
            feature_importance: None,
        }
    }

    #[test]
    fn test_wellness_plan_serializes_camel_case() {
        let value = serde_json::to_value(sample_response()).expect("response serializes");
        assert!(value.get("wellnessPlan").is_some());
        assert!(value.get("wellness_plan").is_none());
    }

    #[test]
    fn test_task_kind_serializes_lowercase_under_type_key() {
        let value = serde_json::to_value(sample_response()).expect("response serializes");
        let task = &value["wellnessPlan"]["tasks"][0];
        assert_eq!(task["type"], json!("tool"));
        assert_eq!(
            serde_json::to_value(TaskKind::Lifestyle).expect("kind serializes"),
            json!("lifestyle")
        );
    }

    #[test]
    fn test_absent_feature_importance_omitted() {
        let value = serde_json::to_value(sample_response()).expect("response serializes");
        assert!(value.get("feature_importance").is_none());
        assert_eq!(value["model_name"], json!("decision_tree"));
    }

    #[test]
    fn test_response_json_roundtrip() {
        let resp = sample_response();
        let json = serde_json::to_string(&resp).expect("response serializes");
        let back: FormattedResponse = serde_json::from_str(&json).expect("response deserializes");
        assert_eq!(resp, back);
    }
}
