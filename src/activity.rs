use chrono::{Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    ActivityUpdate, ConsistencyStreak, DailyActivity, ExerciseLog, GutHealth, MoodScore,
    SleepQuality,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ActivityError {
    #[error("water amount must be greater than 0, got {0}")]
    InvalidWater(f64),
    #[error("exercise type is required")]
    MissingExerciseType,
    #[error("exercise duration must be greater than 0 minutes")]
    InvalidDuration,
    #[error("calories burned must be a non-negative number, got {0}")]
    InvalidCalories(f64),
    #[error("sleep hours must be within (0, 24], got {0}")]
    InvalidSleep(f64),
}

impl ActivityUpdate {
    pub fn water(liters: f64) -> Result<Self, ActivityError> {
        if !liters.is_finite() || liters <= 0.0 {
            return Err(ActivityError::InvalidWater(liters));
        }
        Ok(Self {
            water_intake: Some(liters),
            ..Self::default()
        })
    }

    pub fn exercise(log: &ExerciseLog) -> Result<Self, ActivityError> {
        let kind = log.kind.trim();
        if kind.is_empty() {
            return Err(ActivityError::MissingExerciseType);
        }
        if log.duration_minutes == 0 {
            return Err(ActivityError::InvalidDuration);
        }
        let calories = log.calories_burned.unwrap_or(0.0);
        if !calories.is_finite() || calories < 0.0 {
            return Err(ActivityError::InvalidCalories(calories));
        }
        Ok(Self {
            active_minutes: Some(log.duration_minutes),
            calories: Some(calories),
            exercise_type: Some(kind.to_string()),
            ..Self::default()
        })
    }

    pub fn sleep(hours: f64, quality: Option<SleepQuality>) -> Result<Self, ActivityError> {
        if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
            return Err(ActivityError::InvalidSleep(hours));
        }
        Ok(Self {
            sleep_hours: Some(hours),
            sleep_quality: quality,
            ..Self::default()
        })
    }

    pub fn mood(mood: MoodScore) -> Self {
        Self {
            mood: Some(mood),
            ..Self::default()
        }
    }

    pub fn gut_health(gut: GutHealth) -> Self {
        Self {
            gut_health: Some(gut),
            ..Self::default()
        }
    }
}

impl DailyActivity {
    /// Fold one event into the day: numeric fields accumulate, categorical
    /// fields are replaced when the event carries them.
    pub fn apply(&mut self, update: &ActivityUpdate) {
        if let Some(liters) = update.water_intake {
            self.water_intake += liters;
        }
        if let Some(minutes) = update.active_minutes {
            self.total_active_minutes = self.total_active_minutes.saturating_add(minutes);
        }
        if let Some(calories) = update.calories {
            self.total_calories += calories;
        }
        if let Some(kind) = &update.exercise_type {
            self.exercise_types.push(kind.clone());
        }
        if update.sleep_hours.is_some() {
            self.sleep_hours = update.sleep_hours;
        }
        if update.sleep_quality.is_some() {
            self.sleep_quality = update.sleep_quality;
        }
        if update.mood.is_some() {
            self.mood = update.mood;
        }
        if update.gut_health.is_some() {
            self.gut_health = update.gut_health;
        }
        self.updated_at = Utc::now();
    }
}

/// Apply an event to the day's record, creating it on the first event.
pub fn upsert_activity(
    existing: Option<DailyActivity>,
    user_id: Uuid,
    date: NaiveDate,
    update: &ActivityUpdate,
) -> DailyActivity {
    let mut activity = existing.unwrap_or_else(|| DailyActivity::empty(user_id, date));
    activity.apply(update);
    activity
}

/// Record activity on `today`: continue from yesterday, keep a same-day
/// streak, otherwise start over at 1.
pub fn advance_streak(mut streak: ConsistencyStreak, today: NaiveDate) -> ConsistencyStreak {
    let yesterday = today.checked_sub_days(Days::new(1));

    streak.current_streak = match streak.last_activity_date {
        Some(last) if last == today => streak.current_streak.max(1),
        Some(last) if Some(last) == yesterday => streak.current_streak.saturating_add(1),
        _ => 1,
    };
    streak.longest_streak = streak.longest_streak.max(streak.current_streak);
    streak.last_activity_date = Some(today);
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreakKind;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn numeric_fields_accumulate() {
        let day = date("2026-03-04");
        let user = Uuid::new_v4();
        let first = upsert_activity(None, user, day, &ActivityUpdate::water(0.5).unwrap());
        let second = upsert_activity(Some(first), user, day, &ActivityUpdate::water(0.75).unwrap());

        let run = ExerciseLog {
            kind: "Walking".into(),
            duration_minutes: 20,
            calories_burned: Some(90.0),
        };
        let yoga = ExerciseLog {
            kind: "Yoga".into(),
            duration_minutes: 15,
            calories_burned: None,
        };
        let third = upsert_activity(Some(second), user, day, &ActivityUpdate::exercise(&run).unwrap());
        let fourth = upsert_activity(Some(third), user, day, &ActivityUpdate::exercise(&yoga).unwrap());

        assert_eq!(fourth.user_id, user);
        assert_eq!(fourth.date, day);
        assert!((fourth.water_intake - 1.25).abs() < 1e-9);
        assert_eq!(fourth.total_active_minutes, 35);
        assert!((fourth.total_calories - 90.0).abs() < 1e-9);
        assert_eq!(fourth.exercise_types, vec!["Walking", "Yoga"]);
    }

    #[test]
    fn categorical_fields_replace_and_survive_unrelated_events() {
        let day = date("2026-03-04");
        let user = Uuid::new_v4();
        let mut activity = DailyActivity::empty(user, day);

        activity.apply(&ActivityUpdate::mood(MoodScore::Bad));
        activity.apply(&ActivityUpdate::mood(MoodScore::Good));
        activity.apply(&ActivityUpdate::gut_health(GutHealth::HighBloating));
        activity.apply(&ActivityUpdate::sleep(7.5, Some(SleepQuality::Fair)).unwrap());
        activity.apply(&ActivityUpdate::water(1.0).unwrap());

        assert_eq!(activity.mood, Some(MoodScore::Good));
        assert_eq!(activity.gut_health, Some(GutHealth::HighBloating));
        assert_eq!(activity.sleep_hours, Some(7.5));
        assert_eq!(activity.sleep_quality, Some(SleepQuality::Fair));
    }

    #[test]
    fn invalid_events_are_rejected() {
        assert_eq!(ActivityUpdate::water(0.0), Err(ActivityError::InvalidWater(0.0)));
        assert!(ActivityUpdate::water(f64::NAN).is_err());
        assert_eq!(
            ActivityUpdate::exercise(&ExerciseLog {
                kind: "  ".into(),
                duration_minutes: 10,
                calories_burned: None,
            }),
            Err(ActivityError::MissingExerciseType)
        );
        assert_eq!(
            ActivityUpdate::exercise(&ExerciseLog {
                kind: "Cardio".into(),
                duration_minutes: 0,
                calories_burned: None,
            }),
            Err(ActivityError::InvalidDuration)
        );
        assert_eq!(
            ActivityUpdate::exercise(&ExerciseLog {
                kind: "Cardio".into(),
                duration_minutes: 10,
                calories_burned: Some(-5.0),
            }),
            Err(ActivityError::InvalidCalories(-5.0))
        );
        assert_eq!(ActivityUpdate::sleep(25.0, None), Err(ActivityError::InvalidSleep(25.0)));
        assert!(ActivityUpdate::sleep(0.0, None).is_err());
    }

    #[test]
    fn streak_starts_continues_and_resets() {
        let user = Uuid::new_v4();
        let streak = ConsistencyStreak::none(user, StreakKind::Overall);

        let day1 = advance_streak(streak, date("2026-03-01"));
        assert_eq!((day1.current_streak, day1.longest_streak), (1, 1));

        let same_day = advance_streak(day1, date("2026-03-01"));
        assert_eq!(same_day.current_streak, 1);

        let day2 = advance_streak(same_day, date("2026-03-02"));
        let day3 = advance_streak(day2, date("2026-03-03"));
        assert_eq!((day3.current_streak, day3.longest_streak), (3, 3));

        let after_gap = advance_streak(day3, date("2026-03-06"));
        assert_eq!(after_gap.current_streak, 1);
        assert_eq!(after_gap.longest_streak, 3);
        assert_eq!(after_gap.last_activity_date, Some(date("2026-03-06")));
    }

    #[test]
    fn streak_continues_across_month_boundary() {
        let mut streak = ConsistencyStreak::none(Uuid::new_v4(), StreakKind::Water);
        streak = advance_streak(streak, date("2026-02-28"));
        streak = advance_streak(streak, date("2026-03-01"));
        assert_eq!(streak.current_streak, 2);
    }
}
