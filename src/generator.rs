//! Insight, recommendation, and wellness-plan generation.
//!
//! Everything here is a pure function of the validated request, the
//! predicted level, and optional feature importances. The template text
//! is part of the product contract with the frontend; edit deliberately.

use crate::infer::{numeric_score, PredictionResult};
use crate::request::{PredictionRequest, StressLevel, YesNo};
use crate::response::{FormattedResponse, TaskKind, WellnessPlan, WellnessTask};
use std::collections::BTreeMap;

/// Max insights per response.
const MAX_INSIGHTS: usize = 5;
/// Max recommendations per response.
const MAX_RECOMMENDATIONS: usize = 6;
/// Max wellness-plan tasks per response.
const MAX_TASKS: usize = 6;
/// Minimum importance weight for the top feature to produce an insight.
const IMPORTANCE_FLOOR: f64 = 0.1;

/// Assemble the full response for one prediction.
pub fn format_response(
    request: &PredictionRequest,
    prediction: &PredictionResult,
    model_name: &str,
    model_score: f64,
) -> FormattedResponse {
    FormattedResponse {
        level: prediction.label,
        score: numeric_score(prediction.label),
        confidence: prediction.confidence,
        insights: generate_insights(
            request,
            prediction.label,
            prediction.feature_importance.as_ref(),
        ),
        recommendations: generate_recommendations(request, prediction.label),
        wellness_plan: build_wellness_plan(request, prediction.label),
        model_name: Some(model_name.to_string()),
        model_score: Some(model_score),
        feature_importance: prediction.feature_importance.clone(),
    }
}

// ── Insights ──────────────────────────────────────────────────────────────

/// Observations about the submission, in fixed priority order, capped at
/// five. Falls back to a level statement when no rule fires.
pub fn generate_insights(
    request: &PredictionRequest,
    level: StressLevel,
    importance: Option<&BTreeMap<String, f64>>,
) -> Vec<String> {
    let mut insights = Vec::new();

    if request.sleep_duration < 6.0 {
        insights.push("Your sleep duration is below the recommended 7-9 hours".to_string());
    }
    if request.work_hours > 10.0 {
        insights.push("Long work hours may be a significant stress factor".to_string());
    }
    if request.physical_activity < 1 {
        insights.push("Increasing physical activity could help reduce stress".to_string());
    }
    if request.screen_time > 8.0 {
        insights.push("High screen time may be contributing to your stress levels".to_string());
    }
    if request.caffeine_intake > 3 {
        insights.push("High caffeine intake might be affecting your stress levels".to_string());
    }
    if request.social_interactions < 2 && level == StressLevel::High {
        insights
            .push("Limited social interactions may be affecting your stress levels".to_string());
    }
    if request.meditation_practice == YesNo::Yes {
        insights
            .push("Your meditation practice is a valuable tool for stress management".to_string());
    }

    if let Some(sentence) = importance.and_then(|weights| importance_insight(request, weights)) {
        insights.push(sentence);
    }

    if insights.is_empty() {
        insights.push(format!(
            "Your current stress level is {}",
            level.as_str().to_lowercase()
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Sentence for the single most important feature, when its weight clears
/// the floor and a rule exists for it.
fn importance_insight(
    request: &PredictionRequest,
    weights: &BTreeMap<String, f64>,
) -> Option<String> {
    let (feature, weight) = weights
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(name, w)| (name.as_str(), *w))?;
    if weight <= IMPORTANCE_FLOOR {
        return None;
    }

    let value = request.numeric_field(feature)?;
    // Each rule pairs a "value is low" and "value is high" reading, split
    // at the threshold the original templates were written around.
    let (low, high, threshold) = match feature {
        "Sleep_Duration" => (
            "Your sleep duration appears to be a key factor affecting your stress levels",
            "Your adequate sleep duration is helping maintain lower stress levels",
            3.0,
        ),
        "Work_Hours" => (
            "Your work hours are a significant factor in your stress assessment",
            "Long work hours appear to be a major contributor to your stress levels",
            8.0,
        ),
        "Physical_Activity" => (
            "Your physical activity level is significantly impacting your stress levels",
            "Your active lifestyle is positively influencing your stress management",
            3.0,
        ),
        "Screen_Time" => (
            "Screen time usage appears to be affecting your stress levels",
            "High screen time may be contributing to your elevated stress levels",
            8.0,
        ),
        "Sleep_Quality" => (
            "Sleep quality is a key factor in your stress level assessment",
            "Good sleep quality is helping you manage stress effectively",
            3.0,
        ),
        _ => return None,
    };

    let sentence = if value >= threshold { high } else { low };
    Some(sentence.to_string())
}

// ── Recommendations ───────────────────────────────────────────────────────

/// Level-based suggestions plus personalized ones, deduplicated in order
/// of first occurrence, capped at six.
pub fn generate_recommendations(request: &PredictionRequest, level: StressLevel) -> Vec<String> {
    let base: &[&str] = match level {
        StressLevel::Low => &[
            "Maintain your current healthy lifestyle habits",
            "Continue regular physical activity and good sleep schedule",
            "Keep practicing stress-prevention techniques",
        ],
        StressLevel::Medium => &[
            "Focus on improving sleep quality and duration",
            "Incorporate regular physical exercise into your routine",
            "Practice stress-reduction techniques like deep breathing",
            "Consider time management strategies to reduce daily pressure",
        ],
        StressLevel::High => &[
            "Prioritize getting adequate sleep (7-9 hours per night)",
            "Engage in regular physical activity to reduce stress hormones",
            "Practice meditation or mindfulness exercises daily",
            "Consider speaking with a healthcare professional",
            "Implement immediate stress-relief techniques",
            "Review and adjust your daily schedule to reduce pressure",
        ],
    };

    let mut recommendations: Vec<String> = base.iter().map(|s| s.to_string()).collect();

    if request.sleep_duration < 7.0 {
        recommendations.push("Aim for 7-9 hours of sleep per night".to_string());
    }
    if request.sleep_quality < 3 {
        recommendations
            .push("Focus on improving sleep quality through better sleep hygiene".to_string());
    }
    if request.physical_activity < 2 {
        recommendations.push("Start with 30 minutes of daily physical activity".to_string());
    }
    if request.work_hours > 10.0 {
        recommendations.push("Try to establish better work-life boundaries".to_string());
    }
    if request.screen_time > 8.0 {
        recommendations.push("Consider reducing screen time, especially before bed".to_string());
    }
    if request.meditation_practice == YesNo::No {
        recommendations
            .push("Try incorporating 10 minutes of daily meditation or mindfulness".to_string());
    }

    let mut seen = Vec::new();
    for rec in recommendations {
        if !seen.contains(&rec) {
            seen.push(rec);
        }
    }
    seen.truncate(MAX_RECOMMENDATIONS);
    seen
}

// ── Wellness plan ─────────────────────────────────────────────────────────

struct TaskTemplate {
    title: &'static str,
    kind: TaskKind,
    link: &'static str,
    reward: u32,
}

/// Level-appropriate task plan with personalization, capped at six tasks.
pub fn build_wellness_plan(request: &PredictionRequest, level: StressLevel) -> WellnessPlan {
    let (title, summary) = match level {
        StressLevel::Low => (
            "Stress Maintenance Plan",
            "A maintenance plan to help you continue managing stress effectively",
        ),
        StressLevel::Medium => (
            "Stress Reduction Plan",
            "A focused plan to help reduce your stress levels through targeted interventions",
        ),
        StressLevel::High => (
            "Intensive Stress Management Plan",
            "An intensive plan designed to significantly reduce your stress levels",
        ),
    };

    let mut summary = summary.to_string();
    if request.sleep_duration < 6.0 {
        summary.push_str(" with a focus on improving sleep quality");
    } else if request.physical_activity < 2 {
        summary.push_str(" emphasizing increased physical activity");
    }

    let base: &[TaskTemplate] = match level {
        StressLevel::Low => &[
            TaskTemplate {
                title: "Maintain Current Healthy Habits",
                kind: TaskKind::Lifestyle,
                link: "/wellness/habit-maintenance",
                reward: 10,
            },
            TaskTemplate {
                title: "Weekly Stress Check-in",
                kind: TaskKind::Tool,
                link: "/tools/stress-tracker",
                reward: 15,
            },
        ],
        StressLevel::Medium => &[
            TaskTemplate {
                title: "Deep Breathing Exercises",
                kind: TaskKind::Tool,
                link: "/tools/breathing-exercises",
                reward: 20,
            },
            TaskTemplate {
                title: "Improve Sleep Hygiene",
                kind: TaskKind::Article,
                link: "/articles/sleep-hygiene",
                reward: 25,
            },
            TaskTemplate {
                title: "Regular Exercise Routine",
                kind: TaskKind::Lifestyle,
                link: "/wellness/exercise-plan",
                reward: 30,
            },
        ],
        StressLevel::High => &[
            TaskTemplate {
                title: "Immediate Stress Relief Techniques",
                kind: TaskKind::Tool,
                link: "/tools/emergency-calm",
                reward: 35,
            },
            TaskTemplate {
                title: "Professional Support Resources",
                kind: TaskKind::Article,
                link: "/articles/professional-help",
                reward: 40,
            },
            TaskTemplate {
                title: "Comprehensive Lifestyle Changes",
                kind: TaskKind::Lifestyle,
                link: "/wellness/lifestyle-overhaul",
                reward: 45,
            },
            TaskTemplate {
                title: "Daily Meditation Practice",
                kind: TaskKind::Tool,
                link: "/tools/meditation-program",
                reward: 30,
            },
        ],
    };

    let mut templates: Vec<&TaskTemplate> = base.iter().collect();

    const SLEEP_SCHEDULE: TaskTemplate = TaskTemplate {
        title: "Establish Better Sleep Schedule",
        kind: TaskKind::Lifestyle,
        link: "/wellness/sleep-schedule",
        reward: 25,
    };
    const WALKING: TaskTemplate = TaskTemplate {
        title: "Start Daily Walking Routine",
        kind: TaskKind::Tool,
        link: "/tools/walking-tracker",
        reward: 20,
    };
    const MINDFULNESS: TaskTemplate = TaskTemplate {
        title: "Begin Mindfulness Practice",
        kind: TaskKind::Tool,
        link: "/tools/meditation-guide",
        reward: 15,
    };
    const DIGITAL_DETOX: TaskTemplate = TaskTemplate {
        title: "Digital Detox Challenge",
        kind: TaskKind::Lifestyle,
        link: "/wellness/digital-detox",
        reward: 30,
    };

    if request.sleep_duration < 7.0 {
        templates.push(&SLEEP_SCHEDULE);
    }
    if request.physical_activity < 2 {
        templates.push(&WALKING);
    }
    if request.meditation_practice == YesNo::No {
        templates.push(&MINDFULNESS);
    }
    if request.screen_time > 8.0 {
        templates.push(&DIGITAL_DETOX);
    }

    templates.truncate(MAX_TASKS);

    let tasks = templates
        .iter()
        .enumerate()
        .map(|(i, t)| WellnessTask {
            id: task_id(i + 1),
            title: t.title.to_string(),
            kind: t.kind,
            link: t.link.to_string(),
            reward: t.reward,
        })
        .collect();

    WellnessPlan {
        title: title.to_string(),
        summary,
        tasks,
    }
}

/// Per-response task id: position plus a short random suffix.
fn task_id(position: usize) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("task-{position}-{}", &suffix[..8])
}
