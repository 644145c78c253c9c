//! Input validation and normalization.
//!
//! Turns a raw JSON body into a [`PredictionRequest`] or a *complete* list
//! of per-field violations. Every check runs even after earlier failures,
//! so a client fixing a form sees all problems in one round trip.
//!
//! Check order per field: presence (unknown extras rejected), type
//! coercion, numeric/enum range. The 24-hour cross-field invariant runs
//! last, only when all three participating fields parsed.

use crate::request::{ExerciseType, Gender, PredictionRequest, YesNo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field name that failed validation (`request` for cross-field checks).
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// The offending value as submitted, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            value: value.cloned(),
        }
    }
}

/// The accepted request fields, in wire (snake_case) naming.
const KNOWN_FIELDS: [&str; 13] = [
    "age",
    "gender",
    "sleep_duration",
    "sleep_quality",
    "physical_activity",
    "screen_time",
    "caffeine_intake",
    "smoking_habit",
    "work_hours",
    "travel_time",
    "social_interactions",
    "meditation_practice",
    "exercise_type",
];

/// Round to one decimal place, the normalization applied to hour-valued
/// floats before they reach the model or the cache key.
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Extract a required integer field within `[min, max]`.
///
/// Accepts JSON numbers with a zero fractional part (`4` and `4.0` both
/// parse); anything else is a type violation.
fn int_field(
    obj: &serde_json::Map<String, Value>,
    name: &str,
    min: i64,
    max: i64,
    errs: &mut Vec<FieldViolation>,
) -> Option<u32> {
    let Some(raw) = obj.get(name) else {
        errs.push(FieldViolation::new(name, "field is required", None));
        return None;
    };
    let Some(v) = raw.as_f64().filter(|v| v.is_finite() && v.fract() == 0.0) else {
        errs.push(FieldViolation::new(name, "must be an integer", Some(raw)));
        return None;
    };
    let v = v as i64;
    if v < min || v > max {
        errs.push(FieldViolation::new(
            name,
            format!("must be between {min} and {max}"),
            Some(raw),
        ));
        return None;
    }
    Some(v as u32)
}

/// Extract a required float field within `[min, max]`, rounded to 1 decimal.
///
/// The range check runs on the raw value; rounding is normalization, not
/// leniency at the boundaries.
fn float_field(
    obj: &serde_json::Map<String, Value>,
    name: &str,
    min: f64,
    max: f64,
    errs: &mut Vec<FieldViolation>,
) -> Option<f64> {
    let Some(raw) = obj.get(name) else {
        errs.push(FieldViolation::new(name, "field is required", None));
        return None;
    };
    let Some(v) = raw.as_f64().filter(|v| v.is_finite()) else {
        errs.push(FieldViolation::new(name, "must be a number", Some(raw)));
        return None;
    };
    if v < min || v > max {
        errs.push(FieldViolation::new(
            name,
            format!("must be between {min} and {max}"),
            Some(raw),
        ));
        return None;
    }
    Some(round1(v))
}

/// Extract a required enum field, matching the canonical labels exactly.
fn enum_field<'a>(
    obj: &'a serde_json::Map<String, Value>,
    name: &str,
    allowed: &[&str],
    errs: &mut Vec<FieldViolation>,
) -> Option<&'a str> {
    let Some(raw) = obj.get(name) else {
        errs.push(FieldViolation::new(name, "field is required", None));
        return None;
    };
    let Some(s) = raw.as_str() else {
        errs.push(FieldViolation::new(name, "must be a string", Some(raw)));
        return None;
    };
    if !allowed.contains(&s) {
        errs.push(FieldViolation::new(
            name,
            format!("must be one of: {}", allowed.join(", ")),
            Some(raw),
        ));
        return None;
    }
    Some(s)
}

fn parse_yes_no(s: &str) -> YesNo {
    if s == "Yes" {
        YesNo::Yes
    } else {
        YesNo::No
    }
}

fn parse_exercise(s: &str) -> ExerciseType {
    match s {
        "Cardio" => ExerciseType::Cardio,
        "Yoga" => ExerciseType::Yoga,
        "Strength Training" => ExerciseType::StrengthTraining,
        "Aerobics" => ExerciseType::Aerobics,
        "Walking" => ExerciseType::Walking,
        _ => ExerciseType::Pilates,
    }
}

/// Validate a raw request body.
///
/// Returns the normalized [`PredictionRequest`] or every violation found.
/// No side effects; safe to call concurrently.
///
/// # Errors
///
/// The `Err` list is never empty and covers *all* failed checks, not just
/// the first.
pub fn validate(raw: &Value) -> Result<PredictionRequest, Vec<FieldViolation>> {
    let Some(obj) = raw.as_object() else {
        return Err(vec![FieldViolation::new(
            "request",
            "request body must be a JSON object",
            None,
        )]);
    };

    let mut errs = Vec::new();

    // Unknown fields are rejected, not ignored — a typoed field silently
    // falling back to a default would corrupt the prediction.
    for key in obj.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            errs.push(FieldViolation::new(key, "unknown field", obj.get(key)));
        }
    }

    let age = int_field(obj, "age", 18, 65, &mut errs);
    let gender = enum_field(obj, "gender", &["Male", "Female"], &mut errs);
    let sleep_duration = float_field(obj, "sleep_duration", 4.0, 12.0, &mut errs);
    let sleep_quality = int_field(obj, "sleep_quality", 1, 5, &mut errs);
    let physical_activity = int_field(obj, "physical_activity", 0, 5, &mut errs);
    let screen_time = float_field(obj, "screen_time", 1.0, 14.0, &mut errs);
    let caffeine_intake = int_field(obj, "caffeine_intake", 0, 8, &mut errs);
    let smoking_habit = enum_field(obj, "smoking_habit", &["Yes", "No"], &mut errs);
    let work_hours = float_field(obj, "work_hours", 4.0, 16.0, &mut errs);
    let travel_time = float_field(obj, "travel_time", 0.0, 4.0, &mut errs);
    let social_interactions = int_field(obj, "social_interactions", 1, 5, &mut errs);
    let meditation_practice = enum_field(obj, "meditation_practice", &["Yes", "No"], &mut errs);
    let exercise_type = enum_field(
        obj,
        "exercise_type",
        &[
            "Cardio",
            "Yoga",
            "Strength Training",
            "Aerobics",
            "Walking",
            "Pilates",
        ],
        &mut errs,
    );

    // Cross-field invariant: a day only has 24 hours. Strictly greater
    // than 24 is rejected; exactly 24 is accepted.
    if let (Some(w), Some(s), Some(t)) = (work_hours, sleep_duration, travel_time) {
        if w + s + t > 24.0 {
            errs.push(FieldViolation::new(
                "request",
                format!(
                    "total time allocation (work: {w}h, sleep: {s}h, travel: {t}h) \
                     exceeds 24 hours per day"
                ),
                None,
            ));
        }
    }

    if !errs.is_empty() {
        return Err(errs);
    }

    // All extractors returned Some when errs is empty.
    match (
        age,
        gender,
        sleep_duration,
        sleep_quality,
        physical_activity,
        screen_time,
        caffeine_intake,
        smoking_habit,
        work_hours,
        travel_time,
        social_interactions,
        meditation_practice,
        exercise_type,
    ) {
        (
            Some(age),
            Some(gender),
            Some(sleep_duration),
            Some(sleep_quality),
            Some(physical_activity),
            Some(screen_time),
            Some(caffeine_intake),
            Some(smoking_habit),
            Some(work_hours),
            Some(travel_time),
            Some(social_interactions),
            Some(meditation_practice),
            Some(exercise_type),
        ) => Ok(PredictionRequest {
            age,
            gender: if gender == "Male" {
                Gender::Male
            } else {
                Gender::Female
            },
            sleep_duration,
            sleep_quality,
            physical_activity,
            screen_time,
            caffeine_intake,
            smoking_habit: parse_yes_no(smoking_habit),
            work_hours,
            travel_time,
            social_interactions,
            meditation_practice: parse_yes_no(meditation_practice),
            exercise_type: parse_exercise(exercise_type),
        }),
        _ => Err(vec![FieldViolation::new(
            "request",
            "internal validation inconsistency",
            None,
        )]),
    }
}
