use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::health::{self, HealthAssessment};
use crate::models::{DailyActivity, DailyHealthSummary, MealLog};

/// Build the summary for one user-day from the current source data.
///
/// The result is a point-in-time snapshot: the activity fields are copied,
/// not referenced, so later logging does not change an already built value.
pub fn build_summary(
    user_id: Uuid,
    date: NaiveDate,
    activity: Option<&DailyActivity>,
    meals: &[MealLog],
) -> DailyHealthSummary {
    let meal_count = u32::try_from(meals.len()).unwrap_or(u32::MAX);
    let HealthAssessment {
        health_score,
        status,
        insights,
        recommendations,
    } = health::assess_day(activity, meal_count);

    DailyHealthSummary {
        user_id,
        date,
        water_intake: activity.map_or(0.0, |a| a.water_intake),
        sleep_hours: activity.and_then(|a| a.sleep_hours),
        sleep_quality: activity.and_then(|a| a.sleep_quality),
        mood: activity.and_then(|a| a.mood),
        total_active_minutes: activity.map_or(0, |a| a.total_active_minutes),
        total_calories: activity.map_or(0.0, |a| a.total_calories),
        exercise_types: activity.map(|a| a.exercise_types.clone()).unwrap_or_default(),
        gut_health: activity.and_then(|a| a.gut_health),
        meal_count,
        nutrition_calories: meals.iter().map(|m| m.total_calories).sum(),
        health_score,
        status,
        insights,
        recommendations,
        generated_at: Utc::now(),
    }
}
