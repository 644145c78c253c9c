//! End-to-end pipeline tests through the service facade.
//!
//! Each test builds an on-disk artifact fixture, initializes the service
//! from configuration, and drives it with raw JSON bodies the way the
//! HTTP layer would.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use stress_predictor::config::ServiceConfig;
use stress_predictor::service::ServiceState;
use stress_predictor::{ModelArtifact, PredictOutcome, StressLevel, StressService};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

const FEATURES: [&str; 13] = [
    "Age",
    "Gender",
    "Sleep_Duration",
    "Sleep_Quality",
    "Physical_Activity",
    "Screen_Time",
    "Caffeine_Intake",
    "Smoking_Habit",
    "Work_Hours",
    "Travel_Time",
    "Social_Interactions",
    "Meditation_Practice",
    "Exercise_Type",
];

/// A tree splitting on Work_Hours (feature index 8): up to 10 hours is
/// Medium, beyond is High.
fn work_hours_tree() -> Value {
    json!({
        "model": {
            "type": "decision_tree",
            "root": {
                "kind": "split",
                "feature": 8,
                "threshold": 10.0,
                "left": {"kind": "leaf", "distribution": [0.0, 9.0, 1.0]},
                "right": {"kind": "leaf", "distribution": [0.0, 1.0, 9.0]}
            }
        },
        "feature_names": FEATURES,
        "model_name": "work_hours_tree",
        "model_score": 0.87
    })
}

/// A constant-class baseline with no probability interface.
fn prior_bundle(class: usize) -> Value {
    json!({
        "model": {"type": "prior", "class": class},
        "feature_names": FEATURES,
        "model_name": "prior",
        "model_score": 0.5
    })
}

/// A single-leaf forest exposing probabilities and importances.
fn forest_bundle() -> Value {
    let importances: Vec<f64> = FEATURES
        .iter()
        .map(|&f| if f == "Work_Hours" { 0.76 } else { 0.02 })
        .collect();
    json!({
        "model": {
            "type": "random_forest",
            "trees": [
                {"kind": "leaf", "distribution": [0.0, 1.0, 3.0]},
                {"kind": "leaf", "distribution": [0.0, 0.0, 1.0]}
            ],
            "feature_importances": importances
        },
        "feature_names": FEATURES,
        "model_name": "random_forest",
        "model_score": 0.92
    })
}

/// Write `bundle` into `dir` and return a config whose test path points
/// at it (production path left nonexistent).
fn config_with_artifact(dir: &TempDir, bundle: &Value) -> ServiceConfig {
    let path = dir.path().join("model.json");
    std::fs::write(&path, bundle.to_string()).expect("fixture artifact writes");
    let mut config = ServiceConfig::default();
    config.artifact.test_path = path;
    config.artifact.production_path = dir.path().join("missing.json");
    config
}

fn body() -> Value {
    json!({
        "age": 30,
        "gender": "Male",
        "sleep_duration": 7.5,
        "sleep_quality": 4,
        "physical_activity": 3,
        "screen_time": 8.0,
        "caffeine_intake": 2,
        "smoking_habit": "No",
        "work_hours": 8.0,
        "travel_time": 1.0,
        "social_interactions": 3,
        "meditation_practice": "Yes",
        "exercise_type": "Cardio"
    })
}

fn expect_success(outcome: PredictOutcome) -> stress_predictor::FormattedResponse {
    match outcome {
        PredictOutcome::Success(response) => response,
        other => panic!("expected success, got {other:?}"),
    }
}

// ============================================================================
// Pipeline behavior
// ============================================================================

#[test]
fn test_tree_prediction_follows_work_hours_split() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &work_hours_tree()));
    assert_eq!(service.state(), ServiceState::Ready);

    let medium = expect_success(service.predict(&body()));
    assert_eq!(medium.level, StressLevel::Medium);
    assert_eq!(medium.score, 50);
    assert!((medium.confidence - 0.9).abs() < 1e-12);

    let mut overworked = body();
    overworked["work_hours"] = json!(12.0);
    let high = expect_success(service.predict(&overworked));
    assert_eq!(high.level, StressLevel::High);
    assert_eq!(high.score, 75);
    assert_eq!(high.model_name.as_deref(), Some("work_hours_tree"));
    assert_eq!(high.model_score, Some(0.87));
}

#[test]
fn test_repeat_request_is_served_from_cache() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &work_hours_tree()));

    let first = expect_success(service.predict(&body()));
    let second = expect_success(service.predict(&body()));
    assert_eq!(first, second, "cached response is byte-for-byte identical");
    assert_eq!(service.inference_count(), 1, "classifier ran exactly once");

    // A different submission is its own cache entry.
    let mut other = body();
    other["age"] = json!(31);
    expect_success(service.predict(&other));
    assert_eq!(service.inference_count(), 2);
    assert_eq!(service.cache_entries(), 2);
}

#[test]
fn test_expired_cache_entry_forces_fresh_inference() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("model.json");
    std::fs::write(&path, work_hours_tree().to_string()).expect("fixture artifact writes");
    let artifact = ModelArtifact::load(&path).expect("fixture artifact loads");
    let service = StressService::from_artifact(artifact, Duration::from_millis(30));

    expect_success(service.predict(&body()));
    std::thread::sleep(Duration::from_millis(60));
    let refreshed = expect_success(service.predict(&body()));
    assert_eq!(refreshed.level, StressLevel::Medium);
    assert_eq!(service.inference_count(), 2, "stale entry must be recomputed");
}

#[test]
fn test_model_without_probabilities_reports_default_confidence() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &prior_bundle(1)));

    let response = expect_success(service.predict(&body()));
    assert_eq!(response.level, StressLevel::Medium);
    assert_eq!(response.confidence, 0.8);
    assert!(response.feature_importance.is_none());
}

#[test]
fn test_forest_reports_probability_confidence_and_importances() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &forest_bundle()));

    let response = expect_success(service.predict(&body()));
    assert_eq!(response.level, StressLevel::High);
    // Mean of [0, 0.25, 0.75] and [0, 0, 1].
    assert!((response.confidence - 0.875).abs() < 1e-12);

    let importance = response
        .feature_importance
        .expect("forest exposes importances");
    assert_eq!(importance.get("Work_Hours"), Some(&0.76));

    // Dominant Work_Hours importance with 8h (≥ threshold) reads "high".
    assert!(response.insights.contains(
        &"Long work hours appear to be a major contributor to your stress levels".to_string()
    ));
}

#[test]
fn test_degraded_service_always_answers_with_fallback() {
    let mut config = ServiceConfig::default();
    config.artifact.test_path = PathBuf::from("/nonexistent/test.json");
    config.artifact.production_path = PathBuf::from("/nonexistent/prod.json");
    let service = StressService::initialize(&config);
    assert_eq!(service.state(), ServiceState::Degraded);

    match service.predict(&body()) {
        PredictOutcome::Fallback(response) => {
            assert_eq!(response.level, StressLevel::Medium);
            assert_eq!(response.confidence, 0.5);
            assert_eq!(response.model_name.as_deref(), Some("Fallback Response"));
            assert_eq!(response.model_score, None);
            assert_eq!(response.wellness_plan.title, "Basic Wellness Plan");
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(service.inference_count(), 0);
}

#[test]
fn test_degraded_service_still_rejects_invalid_input() {
    let mut config = ServiceConfig::default();
    config.artifact.test_path = PathBuf::from("/nonexistent/test.json");
    config.artifact.production_path = PathBuf::from("/nonexistent/prod.json");
    let service = StressService::initialize(&config);

    let mut invalid = body();
    invalid["age"] = json!(99);
    match service.predict(&invalid) {
        PredictOutcome::Invalid(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "age");
        }
        other => panic!("expected invalid, got {other:?}"),
    }
}

#[test]
fn test_day_over_24_hours_rejected_but_20_accepted() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &work_hours_tree()));

    let mut impossible = body();
    impossible["work_hours"] = json!(16.0);
    impossible["sleep_duration"] = json!(8.0);
    impossible["travel_time"] = json!(4.0); // 28 hours
    match service.predict(&impossible) {
        PredictOutcome::Invalid(violations) => {
            assert_eq!(violations[0].field, "request");
            assert!(violations[0].message.contains("exceeds 24 hours"));
        }
        other => panic!("expected invalid, got {other:?}"),
    }

    let mut full_day = body();
    full_day["work_hours"] = json!(8.0);
    full_day["sleep_duration"] = json!(8.0);
    full_day["travel_time"] = json!(4.0); // 20 hours
    expect_success(service.predict(&full_day));
}

#[test]
fn test_artifact_feature_mismatch_degrades_to_fallback() {
    let dir = TempDir::new().expect("temp dir");
    // Artifact declares a feature the request schema does not carry, so
    // encoding fails server-side after validation passes.
    let bundle = json!({
        "model": {"type": "prior", "class": 0},
        "feature_names": ["Age", "Heart_Rate"],
        "model_name": "mismatched",
        "model_score": 0.5
    });
    let service = StressService::initialize(&config_with_artifact(&dir, &bundle));
    assert_eq!(service.state(), ServiceState::Ready);

    match service.predict(&body()) {
        PredictOutcome::Fallback(response) => {
            assert_eq!(response.wellness_plan.title, "Basic Wellness Plan");
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(service.cache_entries(), 0, "fallbacks are never cached");
}

#[test]
fn test_named_classes_decode_into_levels() {
    let dir = TempDir::new().expect("temp dir");
    let bundle = json!({
        "model": {"type": "prior", "class": 0},
        "feature_names": FEATURES,
        "model_name": "named_prior",
        "model_score": 0.5,
        "classes": ["high", "low", "medium"]
    });
    let service = StressService::initialize(&config_with_artifact(&dir, &bundle));
    let response = expect_success(service.predict(&body()));
    assert_eq!(response.level, StressLevel::High);
}

#[test]
fn test_high_stress_profile_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &work_hours_tree()));

    // 4h sleep + 14h work + 3h travel = 21h, inside the daily budget.
    let stressed = json!({
        "age": 45,
        "gender": "Male",
        "sleep_duration": 4.0,
        "sleep_quality": 2,
        "physical_activity": 0,
        "screen_time": 12.0,
        "caffeine_intake": 6,
        "smoking_habit": "Yes",
        "work_hours": 14.0,
        "travel_time": 3.0,
        "social_interactions": 1,
        "meditation_practice": "No",
        "exercise_type": "Walking"
    });
    let response = expect_success(service.predict(&stressed));

    assert_eq!(response.level, StressLevel::High);
    assert_eq!(response.score, 75);
    assert!(response
        .insights
        .contains(&"Your sleep duration is below the recommended 7-9 hours".to_string()));
    assert!(response
        .insights
        .contains(&"Long work hours may be a significant stress factor".to_string()));
    assert_eq!(response.insights.len(), 5, "insight cap holds");

    assert!(response
        .recommendations
        .contains(&"Consider speaking with a healthcare professional".to_string()));
    assert_eq!(response.recommendations.len(), 6, "recommendation cap holds");

    assert_eq!(
        response.wellness_plan.title,
        "Intensive Stress Management Plan"
    );
    assert!(response
        .wellness_plan
        .summary
        .ends_with("with a focus on improving sleep quality"));
    assert_eq!(response.wellness_plan.tasks.len(), 6, "task cap holds");
    for (i, task) in response.wellness_plan.tasks.iter().enumerate() {
        assert!(
            task.id.starts_with(&format!("task-{}-", i + 1)),
            "task id {:?} carries its position",
            task.id
        );
    }
}

#[test]
fn test_unknown_extra_field_rejected_through_facade() {
    let dir = TempDir::new().expect("temp dir");
    let service = StressService::initialize(&config_with_artifact(&dir, &work_hours_tree()));

    let mut extra = body();
    extra["heart_rate"] = json!(70);
    match service.predict(&extra) {
        PredictOutcome::Invalid(violations) => {
            assert_eq!(violations[0].field, "heart_rate");
            assert_eq!(violations[0].message, "unknown field");
        }
        other => panic!("expected invalid, got {other:?}"),
    }
}
