//! Request value object and its categorical vocabularies.
//!
//! [`PredictionRequest`] is the immutable, already-normalized form of a
//! questionnaire submission. It is only ever constructed by the validator,
//! so every accessor can assume the §range invariants hold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gender of the respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// Canonical label as it appears in the training data.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Yes/no answer, used for smoking habit and meditation practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    /// Affirmative.
    Yes,
    /// Negative.
    No,
}

impl YesNo {
    /// Canonical label as it appears in the training data.
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

/// Primary exercise type, matching the classifier's category vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseType {
    /// Cardio workouts.
    Cardio,
    /// Yoga.
    Yoga,
    /// Strength training.
    #[serde(rename = "Strength Training")]
    StrengthTraining,
    /// Aerobics.
    Aerobics,
    /// Walking.
    Walking,
    /// Pilates.
    Pilates,
}

impl ExerciseType {
    /// Canonical label as it appears in the training data.
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::Cardio => "Cardio",
            ExerciseType::Yoga => "Yoga",
            ExerciseType::StrengthTraining => "Strength Training",
            ExerciseType::Aerobics => "Aerobics",
            ExerciseType::Walking => "Walking",
            ExerciseType::Pilates => "Pilates",
        }
    }
}

/// Categorical stress prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    /// Low stress.
    Low,
    /// Medium stress.
    Medium,
    /// High stress.
    High,
}

impl StressLevel {
    /// Canonical label.
    pub fn as_str(self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single model-format field value: either numeric or categorical.
///
/// The encoder consumes these; categorical values carry the canonical
/// label string so the mapping tables match the training data exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Numeric feature, passed through to the feature vector as-is.
    Number(f64),
    /// Categorical feature, replaced by its integer code during encoding.
    Category(String),
}

/// Canonical model-format feature names, in dataset column order.
pub const MODEL_FEATURES: [&str; 13] = [
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

/// A validated, normalized questionnaire submission.
///
/// All numeric ranges and the 24-hour cross-field invariant have been
/// enforced by [`crate::validate::validate`]; hour-valued floats are
/// rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Age in years (18–65).
    pub age: u32,
    /// Gender.
    pub gender: Gender,
    /// Sleep duration in hours (4.0–12.0, 1 decimal).
    pub sleep_duration: f64,
    /// Sleep quality rating (1–5).
    pub sleep_quality: u32,
    /// Physical activity level (0–5).
    pub physical_activity: u32,
    /// Daily screen time in hours (1.0–14.0, 1 decimal).
    pub screen_time: f64,
    /// Daily caffeine intake in cups (0–8).
    pub caffeine_intake: u32,
    /// Smoking habit.
    pub smoking_habit: YesNo,
    /// Daily work hours (4.0–16.0, 1 decimal).
    pub work_hours: f64,
    /// Daily travel time in hours (0.0–4.0, 1 decimal).
    pub travel_time: f64,
    /// Social interactions level (1–5).
    pub social_interactions: u32,
    /// Meditation practice.
    pub meditation_practice: YesNo,
    /// Primary exercise type.
    pub exercise_type: ExerciseType,
}

impl PredictionRequest {
    /// Project the request into the model's field naming.
    ///
    /// Keys are the canonical dataset column names ([`MODEL_FEATURES`]);
    /// the encoder walks the artifact's declared feature order and looks
    /// each name up here.
    pub fn model_fields(&self) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();
        fields.insert("Age".to_string(), FieldValue::Number(f64::from(self.age)));
        fields.insert(
            "Gender".to_string(),
            FieldValue::Category(self.gender.as_str().to_string()),
        );
        fields.insert(
            "Sleep_Duration".to_string(),
            FieldValue::Number(self.sleep_duration),
        );
        fields.insert(
            "Sleep_Quality".to_string(),
            FieldValue::Number(f64::from(self.sleep_quality)),
        );
        fields.insert(
            "Physical_Activity".to_string(),
            FieldValue::Number(f64::from(self.physical_activity)),
        );
        fields.insert(
            "Screen_Time".to_string(),
            FieldValue::Number(self.screen_time),
        );
        fields.insert(
            "Caffeine_Intake".to_string(),
            FieldValue::Number(f64::from(self.caffeine_intake)),
        );
        fields.insert(
            "Smoking_Habit".to_string(),
            FieldValue::Category(self.smoking_habit.as_str().to_string()),
        );
        fields.insert(
            "Work_Hours".to_string(),
            FieldValue::Number(self.work_hours),
        );
        fields.insert(
            "Travel_Time".to_string(),
            FieldValue::Number(self.travel_time),
        );
        fields.insert(
            "Social_Interactions".to_string(),
            FieldValue::Number(f64::from(self.social_interactions)),
        );
        fields.insert(
            "Meditation_Practice".to_string(),
            FieldValue::Category(self.meditation_practice.as_str().to_string()),
        );
        fields.insert(
            "Exercise_Type".to_string(),
            FieldValue::Category(self.exercise_type.as_str().to_string()),
        );
        fields
    }

    /// Numeric value of a model-format field, if it has one.
    ///
    /// Used by the feature-importance insight rules, which only ever
    /// inspect numeric features.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        match name {
            "Age" => Some(f64::from(self.age)),
            "Sleep_Duration" => Some(self.sleep_duration),
            "Sleep_Quality" => Some(f64::from(self.sleep_quality)),
            "Physical_Activity" => Some(f64::from(self.physical_activity)),
            "Screen_Time" => Some(self.screen_time),
            "Caffeine_Intake" => Some(f64::from(self.caffeine_intake)),
            "Work_Hours" => Some(self.work_hours),
            "Travel_Time" => Some(self.travel_time),
            "Social_Interactions" => Some(f64::from(self.social_interactions)),
            _ => None,
        }
    }
}

/// A mid-range request used by unit tests across the crate.
#[cfg(test)]
pub(crate) fn sample_request() -> PredictionRequest {
    PredictionRequest {
        age: 30,
        gender: Gender::Male,
        sleep_duration: 7.5,
        sleep_quality: 4,
        physical_activity: 3,
        screen_time: 8.0,
        caffeine_intake: 2,
        smoking_habit: YesNo::No,
        work_hours: 8.0,
        travel_time: 1.0,
        social_interactions: 3,
        meditation_practice: YesNo::Yes,
        exercise_type: ExerciseType::Cardio,
    }
}
