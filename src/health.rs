//! Rule-based daily health scoring.
//!
//! A day is scored on six independent dimensions. Each dimension is scored by
//! its own function into a [`DimensionScore`]; [`assess`] folds them into a
//! bounded 0-100 score, a status and ordered insight/recommendation lists.

use serde::{Deserialize, Serialize};

use crate::models::{DailyActivity, GutHealth, HealthStatus, MoodScore, SleepQuality};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    Water,
    Sleep,
    Exercise,
    Mood,
    GutHealth,
    Meals,
}

impl Dimension {
    /// Evaluation order. Notes appear in the summary in this order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Water,
        Dimension::Sleep,
        Dimension::Exercise,
        Dimension::Mood,
        Dimension::GutHealth,
        Dimension::Meals,
    ];

    pub fn max_points(&self) -> u8 {
        match self {
            Dimension::Water => 20,
            Dimension::Sleep => 25,
            Dimension::Exercise => 20,
            Dimension::Mood => 15,
            Dimension::GutHealth => 10,
            Dimension::Meals => 10,
        }
    }

    /// Score this dimension, capped at [`Dimension::max_points`].
    pub fn score(&self, inputs: &DayInputs) -> DimensionScore {
        let scored = match self {
            Dimension::Water => score_water(inputs.water_intake),
            Dimension::Sleep => score_sleep(inputs.sleep_hours, inputs.sleep_quality),
            Dimension::Exercise => score_exercise(inputs.active_minutes),
            Dimension::Mood => score_mood(inputs.mood),
            Dimension::GutHealth => score_gut_health(inputs.gut_health),
            Dimension::Meals => score_meals(inputs.meal_count),
        };
        debug_assert_eq!(scored.dimension, *self);
        DimensionScore {
            points: scored.points.min(self.max_points()),
            ..scored
        }
    }
}

/// A positive observation or an improvement suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    Insight(&'static str),
    Recommendation(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub points: u8,
    pub note: Option<Note>,
}

impl DimensionScore {
    fn new(dimension: Dimension, points: u8, note: Option<Note>) -> Self {
        Self {
            dimension,
            points,
            note,
        }
    }
}

/// The inputs one day is scored on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayInputs {
    pub water_intake: f64,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<SleepQuality>,
    pub active_minutes: u32,
    pub total_calories: f64,
    pub mood: Option<MoodScore>,
    pub gut_health: Option<GutHealth>,
    pub meal_count: u32,
}

impl DayInputs {
    /// A missing activity record scores like an empty day.
    pub fn from_activity(activity: Option<&DailyActivity>, meal_count: u32) -> Self {
        match activity {
            Some(a) => Self {
                water_intake: a.water_intake,
                sleep_hours: a.sleep_hours,
                sleep_quality: a.sleep_quality,
                active_minutes: a.total_active_minutes,
                total_calories: a.total_calories,
                mood: a.mood,
                gut_health: a.gut_health,
                meal_count,
            },
            None => Self {
                meal_count,
                ..Self::default()
            },
        }
    }

    fn check_preconditions(&self) {
        assert_non_negative("water intake", self.water_intake);
        assert_non_negative("total calories", self.total_calories);
        if let Some(hours) = self.sleep_hours {
            assert_non_negative("sleep hours", hours);
        }
    }
}

fn assert_non_negative(field: &str, value: f64) {
    assert!(
        value.is_finite() && value >= 0.0,
        "{field} must be a finite, non-negative number, got {value}"
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub health_score: u8,
    pub status: HealthStatus,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score one day from its activity record (if any) and meal count.
pub fn assess_day(activity: Option<&DailyActivity>, meal_count: u32) -> HealthAssessment {
    assess(&DayInputs::from_activity(activity, meal_count))
}

/// Score one day.
///
/// # Panics
///
/// Panics if a numeric input is negative or not finite. Inputs are expected
/// to be validated before they reach the scorer.
pub fn assess(inputs: &DayInputs) -> HealthAssessment {
    inputs.check_preconditions();

    let breakdown: Vec<DimensionScore> = Dimension::ALL.iter().map(|d| d.score(inputs)).collect();
    let health_score: u8 = breakdown.iter().map(|s| s.points).sum();
    let status = HealthStatus::from_score(health_score);

    let mut insights = Vec::new();
    let mut recommendations = Vec::new();
    let notes = breakdown
        .iter()
        .filter_map(|s| s.note)
        .chain(std::iter::once(status.note()));
    for note in notes {
        match note {
            Note::Insight(text) => insights.push(text.to_string()),
            Note::Recommendation(text) => recommendations.push(text.to_string()),
        }
    }

    HealthAssessment {
        health_score,
        status,
        insights,
        recommendations,
    }
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => HealthStatus::Excellent,
            70..=84 => HealthStatus::Good,
            50..=69 => HealthStatus::Fair,
            _ => HealthStatus::Poor,
        }
    }

    /// The closing note appended for the overall day.
    pub fn note(&self) -> Note {
        match self {
            HealthStatus::Excellent => Note::Insight("🌟 Outstanding day! Keep up the great work!"),
            HealthStatus::Good => Note::Insight("👍 Solid day overall!"),
            HealthStatus::Fair => {
                Note::Recommendation("Focus on consistency across all health areas")
            }
            HealthStatus::Poor => {
                Note::Recommendation("Start small - pick one area to improve tomorrow")
            }
        }
    }
}

pub fn score_water(liters: f64) -> DimensionScore {
    let (points, note) = if liters >= 2.5 {
        (20, Note::Insight("✅ Great hydration today!"))
    } else if liters >= 1.5 {
        (15, Note::Insight("💧 Good water intake, try to reach 2.5L"))
    } else if liters >= 0.5 {
        (10, Note::Recommendation("Drink more water - aim for 2.5L daily"))
    } else {
        (0, Note::Recommendation("⚠️ Low water intake! Start drinking more water"))
    };
    DimensionScore::new(Dimension::Water, points, Some(note))
}

pub fn score_sleep(hours: Option<f64>, quality: Option<SleepQuality>) -> DimensionScore {
    let hours = hours.unwrap_or(0.0);
    let restful = matches!(
        quality,
        Some(SleepQuality::Good) | Some(SleepQuality::Excellent)
    );

    let (points, note) = if (7.0..=9.0).contains(&hours) {
        if restful {
            (25, Note::Insight("😴 Excellent sleep quality!"))
        } else {
            (
                20,
                Note::Insight("Sleep duration is good, but quality could improve"),
            )
        }
    } else if hours >= 6.0 {
        (15, Note::Recommendation("Try to get 7-9 hours of sleep"))
    } else if hours > 0.0 {
        (
            10,
            Note::Recommendation("⚠️ Insufficient sleep! Prioritize rest tonight"),
        )
    } else {
        (0, Note::Recommendation("Log your sleep data for better insights"))
    };
    DimensionScore::new(Dimension::Sleep, points, Some(note))
}

pub fn score_exercise(active_minutes: u32) -> DimensionScore {
    let (points, note) = match active_minutes {
        30.. => (20, Note::Insight("💪 Great workout today!")),
        15..=29 => (15, Note::Insight("Good activity level!")),
        1..=14 => (
            10,
            Note::Recommendation("Try to reach 30 minutes of activity daily"),
        ),
        0 => (
            0,
            Note::Recommendation("No exercise logged - even 10 minutes helps!"),
        ),
    };
    DimensionScore::new(Dimension::Exercise, points, Some(note))
}

pub fn score_mood(mood: Option<MoodScore>) -> DimensionScore {
    let (points, note) = match mood {
        Some(MoodScore::Excellent) => (15, Some(Note::Insight("😄 Feeling great emotionally!"))),
        Some(MoodScore::Good) => (12, Some(Note::Insight("😊 Good emotional state"))),
        Some(MoodScore::Neutral) => (
            10,
            Some(Note::Recommendation(
                "Consider activities that boost your mood",
            )),
        ),
        Some(MoodScore::Bad) | Some(MoodScore::VeryBad) => (
            5,
            Some(Note::Recommendation("💚 Take time for self-care and rest")),
        ),
        None => (0, None),
    };
    DimensionScore::new(Dimension::Mood, points, note)
}

pub fn score_gut_health(gut: Option<GutHealth>) -> DimensionScore {
    let (points, note) = match gut {
        Some(GutHealth::Normal) | Some(GutHealth::LowBloating) => {
            (10, Some(Note::Insight("🌿 Gut health is stable")))
        }
        Some(GutHealth::ModerateBloating) => (
            7,
            Some(Note::Recommendation("Monitor foods that may cause bloating")),
        ),
        Some(GutHealth::HighBloating) => (
            5,
            Some(Note::Recommendation("⚠️ High bloating - review recent meals")),
        ),
        None => (0, None),
    };
    DimensionScore::new(Dimension::GutHealth, points, note)
}

pub fn score_meals(meal_count: u32) -> DimensionScore {
    let (points, note) = match meal_count {
        3.. => (10, Some(Note::Insight("🍽️ Good meal tracking!"))),
        2 => (
            7,
            Some(Note::Recommendation("Log all meals for better insights")),
        ),
        1 => (5, None),
        0 => (0, None),
    };
    DimensionScore::new(Dimension::Meals, points, note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn best_day() -> DayInputs {
        DayInputs {
            water_intake: 2.5,
            sleep_hours: Some(8.0),
            sleep_quality: Some(SleepQuality::Excellent),
            active_minutes: 45,
            total_calories: 320.0,
            mood: Some(MoodScore::Excellent),
            gut_health: Some(GutHealth::Normal),
            meal_count: 3,
        }
    }

    #[test]
    fn maximal_day_scores_full_marks() {
        let result = assess(&best_day());
        assert_eq!(result.health_score, 100);
        assert_eq!(result.status, HealthStatus::Excellent);
        assert!(result.recommendations.is_empty());
        assert_eq!(
            result.insights.last().map(String::as_str),
            Some("🌟 Outstanding day! Keep up the great work!")
        );
    }

    #[test]
    fn dimension_maxima_sum_to_hundred() {
        let total: u32 = Dimension::ALL.iter().map(|d| u32::from(d.max_points())).sum();
        assert_eq!(total, 100);
        for dimension in Dimension::ALL {
            assert_eq!(dimension.score(&best_day()).points, dimension.max_points());
        }
    }

    #[test]
    fn absent_day_scores_zero_with_recommendations() {
        let result = assess_day(None, 0);
        assert_eq!(result.health_score, 0);
        assert_eq!(result.status, HealthStatus::Poor);
        assert!(result.insights.is_empty());
        assert_eq!(
            result.recommendations,
            vec![
                "⚠️ Low water intake! Start drinking more water",
                "Log your sleep data for better insights",
                "No exercise logged - even 10 minutes helps!",
                "Start small - pick one area to improve tomorrow",
            ]
        );
    }

    #[test]
    fn water_tiers_have_inclusive_lower_bounds() {
        assert_eq!(score_water(2.5).points, 20);
        assert_eq!(score_water(2.49).points, 15);
        assert_eq!(score_water(1.5).points, 15);
        assert_eq!(score_water(0.5).points, 10);
        assert_eq!(score_water(0.49).points, 0);
        assert!(matches!(score_water(0.0).note, Some(Note::Recommendation(_))));
    }

    #[test]
    fn sleep_tiers() {
        assert_eq!(score_sleep(Some(7.0), Some(SleepQuality::Good)).points, 25);
        assert_eq!(score_sleep(Some(9.0), Some(SleepQuality::Excellent)).points, 25);
        assert_eq!(score_sleep(Some(8.0), Some(SleepQuality::Fair)).points, 20);
        assert_eq!(score_sleep(Some(8.0), None).points, 20);
        assert_eq!(score_sleep(Some(6.0), Some(SleepQuality::Excellent)).points, 15);
        // Oversleeping falls through to the 6h tier.
        assert_eq!(score_sleep(Some(10.0), Some(SleepQuality::Excellent)).points, 15);
        assert_eq!(score_sleep(Some(4.5), None).points, 10);
        assert_eq!(score_sleep(Some(0.0), None).points, 0);
        assert_eq!(
            score_sleep(None, None).note,
            Some(Note::Recommendation("Log your sleep data for better insights"))
        );
    }

    #[test]
    fn exercise_tiers() {
        assert_eq!(score_exercise(30).points, 20);
        assert_eq!(score_exercise(29).points, 15);
        assert_eq!(score_exercise(15).points, 15);
        assert_eq!(score_exercise(14).points, 10);
        assert_eq!(score_exercise(1).points, 10);
        assert_eq!(score_exercise(0).points, 0);
    }

    #[test]
    fn mood_and_gut_without_data_stay_silent() {
        let mood = score_mood(None);
        assert_eq!((mood.points, mood.note), (0, None));
        let gut = score_gut_health(None);
        assert_eq!((gut.points, gut.note), (0, None));

        assert_eq!(score_mood(Some(MoodScore::Good)).points, 12);
        assert_eq!(score_mood(Some(MoodScore::Neutral)).points, 10);
        assert_eq!(score_mood(Some(MoodScore::Bad)).points, 5);
        assert_eq!(score_mood(Some(MoodScore::VeryBad)).points, 5);
        assert_eq!(score_gut_health(Some(GutHealth::LowBloating)).points, 10);
        assert_eq!(score_gut_health(Some(GutHealth::ModerateBloating)).points, 7);
        assert_eq!(score_gut_health(Some(GutHealth::HighBloating)).points, 5);
    }

    #[test]
    fn meal_tiers() {
        assert_eq!(score_meals(5).points, 10);
        assert_eq!(score_meals(2).points, 7);
        let single = score_meals(1);
        assert_eq!((single.points, single.note), (5, None));
        assert_eq!(score_meals(0).points, 0);
    }

    #[test]
    fn status_breakpoints() {
        assert_eq!(HealthStatus::from_score(100), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(85), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(84), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(70), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(69), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(50), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(49), HealthStatus::Poor);
        assert_eq!(HealthStatus::from_score(0), HealthStatus::Poor);
    }

    #[test]
    fn middling_day_gets_consistency_nudge() {
        let inputs = DayInputs {
            water_intake: 1.5,
            sleep_hours: Some(6.5),
            active_minutes: 10,
            mood: Some(MoodScore::Neutral),
            meal_count: 1,
            ..DayInputs::default()
        };
        // 15 + 15 + 10 + 10 + 0 + 5
        let result = assess(&inputs);
        assert_eq!(result.health_score, 55);
        assert_eq!(result.status, HealthStatus::Fair);
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some("Focus on consistency across all health areas")
        );
    }

    #[test]
    fn assessment_is_deterministic() {
        let inputs = DayInputs {
            water_intake: 0.75,
            sleep_hours: Some(7.5),
            sleep_quality: Some(SleepQuality::Poor),
            active_minutes: 20,
            total_calories: 150.0,
            mood: Some(MoodScore::Bad),
            gut_health: Some(GutHealth::ModerateBloating),
            meal_count: 2,
        };
        let first = assess(&inputs);
        let second = assess(&inputs);
        assert_eq!(first.health_score, second.health_score);
        assert_eq!(first.status, second.status);
        let as_set = |v: &[String]| v.iter().cloned().collect::<BTreeSet<_>>();
        assert_eq!(as_set(&first.insights), as_set(&second.insights));
        assert_eq!(as_set(&first.recommendations), as_set(&second.recommendations));
    }

    #[test]
    #[should_panic(expected = "water intake")]
    fn negative_water_is_a_precondition_violation() {
        assess(&DayInputs {
            water_intake: -1.0,
            ..DayInputs::default()
        });
    }

    #[test]
    #[should_panic(expected = "sleep hours")]
    fn non_finite_sleep_is_a_precondition_violation() {
        assess(&DayInputs {
            sleep_hours: Some(f64::NAN),
            ..DayInputs::default()
        });
    }
}
