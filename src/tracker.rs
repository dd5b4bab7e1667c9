use chrono::{Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::activity::ActivityError;
use crate::models::*;
use crate::prediction;
use crate::store::{HealthStore, StoreError};
use crate::summary;

const CYCLE_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 21..=45;
const PERIOD_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 2..=10;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error("average cycle length must be between 21 and 45 days, got {0}")]
    InvalidCycleLength(u32),
    #[error("period length must be between 2 and 10 days, got {0}")]
    InvalidPeriodLength(u32),
    #[error("cycle start {0} is in the future")]
    FutureCycleStart(NaiveDate),
    #[error("a meal needs at least one food item")]
    EmptyMeal,
    #[error("log date {0} is in the future")]
    FutureLogDate(NaiveDate),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Source of "today" in the user's local calendar.
pub type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Entry point for hosts: logging events, cycle history, predictions and
/// daily health summaries on top of a [`HealthStore`].
pub struct Tracker<S> {
    store: S,
    clock: Clock,
}

impl<S: HealthStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, || chrono::Local::now().date_naive())
    }

    pub fn with_clock(store: S, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    // ---- onboarding & cycles ----

    /// Store the self-reported profile and synthesize the first cycle record.
    pub fn onboard(&self, user_id: Uuid, answers: OnboardingProfile) -> TrackerResult<UserProfile> {
        if !CYCLE_LENGTH_RANGE.contains(&answers.average_cycle_length) {
            return Err(TrackerError::InvalidCycleLength(answers.average_cycle_length));
        }
        if let Some(len) = answers.period_length {
            if !PERIOD_LENGTH_RANGE.contains(&len) {
                return Err(TrackerError::InvalidPeriodLength(len));
            }
        }
        let today = self.today();
        if answers.last_period_start > today {
            return Err(TrackerError::FutureCycleStart(answers.last_period_start));
        }

        let settings = self.store.settings()?;
        // Re-onboarding keeps the original registration date.
        let registered_on = self
            .store
            .profile(user_id)?
            .map_or(today, |p| p.registered_on);

        let record = prediction::initial_cycle(user_id, &answers, settings.default_period_length);
        let profile = UserProfile {
            user_id,
            registered_on,
            average_cycle_length: answers.average_cycle_length,
            period_length: record.period_length.unwrap_or(settings.default_period_length),
            last_period_start: answers.last_period_start,
            onboarding_completed: true,
        };

        self.store.put_profile(profile.clone())?;
        self.store.insert_cycle(record)?;
        tracing::info!(%user_id, "onboarding completed");
        Ok(profile)
    }

    /// Record the start of a new period.
    ///
    /// If this is now the most recent cycle, the previous one gets its cycle
    /// length filled in, unless it already has one.
    pub fn record_cycle(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        period_length: Option<u32>,
    ) -> TrackerResult<CycleRecord> {
        if start_date > self.today() {
            return Err(TrackerError::FutureCycleStart(start_date));
        }
        if let Some(len) = period_length {
            if !PERIOD_LENGTH_RANGE.contains(&len) {
                return Err(TrackerError::InvalidPeriodLength(len));
            }
        }

        let previous = self.store.recent_cycles(user_id, 1)?.into_iter().next();

        let mut record = CycleRecord::new(user_id, start_date);
        record.period_length = period_length;
        self.store.insert_cycle(record.clone())?;

        if let Some(prev) = previous.filter(|p| p.cycle_length.is_none()) {
            let gap = (start_date - prev.start_date).num_days();
            if let Ok(len) = u32::try_from(gap) {
                if len > 0 {
                    self.store.set_cycle_length(prev.id, len)?;
                    tracing::debug!(cycle_id = %prev.id, len, "closed previous cycle");
                }
            }
        }

        Ok(record)
    }

    /// Recent cycle history, most recent first.
    pub fn cycles(&self, user_id: Uuid) -> TrackerResult<Vec<CycleRecord>> {
        let limit = self.store.settings()?.cycle_history_limit;
        Ok(self.store.recent_cycles(user_id, limit)?)
    }

    pub fn prediction(&self, user_id: Uuid) -> TrackerResult<Option<CyclePrediction>> {
        Ok(prediction::predict_next_period(&self.cycles(user_id)?))
    }

    pub fn cycle_status(&self, user_id: Uuid) -> TrackerResult<Option<CycleStatus>> {
        Ok(prediction::cycle_status(&self.cycles(user_id)?, self.today()))
    }

    pub fn cycle_stats(&self, user_id: Uuid) -> TrackerResult<CycleStats> {
        Ok(prediction::cycle_stats(&self.cycles(user_id)?))
    }

    // ---- daily logging ----

    pub fn log_water(&self, user_id: Uuid, liters: f64) -> TrackerResult<DailyActivity> {
        let update = ActivityUpdate::water(liters)?;
        self.log(user_id, &update, Some(StreakKind::Water))
    }

    pub fn log_exercise(&self, user_id: Uuid, exercise: &ExerciseLog) -> TrackerResult<DailyActivity> {
        let update = ActivityUpdate::exercise(exercise)?;
        self.log(user_id, &update, Some(StreakKind::Exercise))
    }

    pub fn log_sleep(
        &self,
        user_id: Uuid,
        hours: f64,
        quality: Option<SleepQuality>,
    ) -> TrackerResult<DailyActivity> {
        let update = ActivityUpdate::sleep(hours, quality)?;
        self.log(user_id, &update, None)
    }

    pub fn log_mood(&self, user_id: Uuid, mood: MoodScore) -> TrackerResult<DailyActivity> {
        self.log(user_id, &ActivityUpdate::mood(mood), None)
    }

    pub fn log_gut_health(&self, user_id: Uuid, gut: GutHealth) -> TrackerResult<DailyActivity> {
        self.log(user_id, &ActivityUpdate::gut_health(gut), None)
    }

    pub fn log_meal(&self, user_id: Uuid, meal: NewMeal) -> TrackerResult<MealLog> {
        if meal.foods.is_empty() {
            return Err(TrackerError::EmptyMeal);
        }
        if let Some(bad) = meal
            .foods
            .iter()
            .filter_map(|f| f.calories)
            .find(|c| !c.is_finite() || *c < 0.0)
        {
            return Err(ActivityError::InvalidCalories(bad).into());
        }
        let today = self.today();
        let record = MealLog {
            id: Uuid::new_v4(),
            user_id,
            date: today,
            meal_type: meal.meal_type,
            total_calories: meal.foods.iter().filter_map(|f| f.calories).sum(),
            foods: meal.foods,
            notes: meal.notes,
            created_at: Utc::now(),
        };
        self.store
            .record_meal(record.clone(), &streak_kinds(Some(StreakKind::FoodLogging)))?;
        Ok(record)
    }

    /// Meal history, most recent first. `limit` defaults to the configured
    /// log history size.
    pub fn meals(&self, user_id: Uuid, limit: Option<usize>) -> TrackerResult<Vec<MealLog>> {
        let limit = self.log_limit(limit)?;
        Ok(self.store.recent_meals(user_id, limit)?)
    }

    /// Record symptoms, mood and energy for a day (today unless given).
    pub fn log_symptoms(&self, user_id: Uuid, entry: NewSymptomLog) -> TrackerResult<SymptomLog> {
        let today = self.today();
        let date = entry.date.unwrap_or(today);
        if date > today {
            return Err(TrackerError::FutureLogDate(date));
        }
        let log = SymptomLog {
            id: Uuid::new_v4(),
            user_id,
            date,
            symptoms: entry.symptoms,
            mood: entry.mood,
            energy_level: entry.energy_level,
            notes: entry.notes,
            created_at: Utc::now(),
        };
        self.store.insert_symptom_log(log.clone())?;
        tracing::debug!(%user_id, %date, symptoms = log.symptoms.len(), "symptoms logged");
        Ok(log)
    }

    /// Symptom history, most recent first.
    pub fn symptom_logs(&self, user_id: Uuid, limit: Option<usize>) -> TrackerResult<Vec<SymptomLog>> {
        let limit = self.log_limit(limit)?;
        Ok(self.store.recent_symptom_logs(user_id, limit)?)
    }

    fn log_limit(&self, limit: Option<usize>) -> TrackerResult<usize> {
        match limit {
            Some(limit) => Ok(limit),
            None => Ok(self.store.settings()?.log_history_limit),
        }
    }

    pub fn activity(&self, user_id: Uuid, date: NaiveDate) -> TrackerResult<Option<DailyActivity>> {
        Ok(self.store.activity(user_id, date)?)
    }

    /// Current streak of the given kind; zeros if the user never logged.
    pub fn streak(&self, user_id: Uuid, kind: StreakKind) -> TrackerResult<ConsistencyStreak> {
        Ok(self
            .store
            .streak(user_id, kind)?
            .unwrap_or_else(|| ConsistencyStreak::none(user_id, kind)))
    }

    fn log(
        &self,
        user_id: Uuid,
        update: &ActivityUpdate,
        streak_kind: Option<StreakKind>,
    ) -> TrackerResult<DailyActivity> {
        let today = self.today();
        let activity =
            self.store
                .record_activity(user_id, today, update, &streak_kinds(streak_kind))?;
        tracing::debug!(%user_id, date = %today, "daily activity updated");
        Ok(activity)
    }

    // ---- health summaries ----

    /// Regenerate and store the summary for one day.
    ///
    /// Always recomputed from the current activity record and meals, so
    /// today's summary tracks new logging while past days stay stable once
    /// nothing more is logged for them.
    pub fn daily_summary(&self, user_id: Uuid, date: NaiveDate) -> TrackerResult<DailyHealthSummary> {
        let summary = self.generate_summary(user_id, date)?;
        self.store.put_summary(summary.clone())?;
        Ok(summary)
    }

    fn generate_summary(&self, user_id: Uuid, date: NaiveDate) -> TrackerResult<DailyHealthSummary> {
        let activity = self.store.activity(user_id, date)?;
        let meals = self.store.meals_on(user_id, date)?;

        let summary = summary::build_summary(user_id, date, activity.as_ref(), &meals);
        tracing::debug!(
            %user_id,
            %date,
            score = summary.health_score,
            status = ?summary.status,
            "health summary generated"
        );
        Ok(summary)
    }

    pub fn today_summary(&self, user_id: Uuid) -> TrackerResult<DailyHealthSummary> {
        self.daily_summary(user_id, self.today())
    }

    /// Summaries for up to `limit_days` days back from today, newest first,
    /// never reaching before `since`. Every listed day is regenerated and
    /// stored in one write.
    pub fn recent_summaries_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
        limit_days: u32,
    ) -> TrackerResult<Vec<DailyHealthSummary>> {
        let today = self.today();
        let mut summaries = Vec::new();

        for offset in 0..limit_days {
            let Some(day) = today.checked_sub_days(Days::new(u64::from(offset))) else {
                break;
            };
            // Days only get older from here.
            if day < since {
                tracing::debug!(%user_id, %day, %since, "stopping before registration date");
                break;
            }
            summaries.push(self.generate_summary(user_id, day)?);
        }

        self.store.put_summaries(summaries.clone())?;
        Ok(summaries)
    }

    /// Recent summaries bounded by the user's registration date.
    ///
    /// Without a profile there is no registration date to bound by, so
    /// nothing is generated.
    pub fn recent_summaries(
        &self,
        user_id: Uuid,
        limit_days: Option<u32>,
    ) -> TrackerResult<Vec<DailyHealthSummary>> {
        let Some(profile) = self.store.profile(user_id)? else {
            tracing::warn!(%user_id, "no profile found, skipping health summaries");
            return Ok(Vec::new());
        };
        let limit = match limit_days {
            Some(days) => days,
            None => self.store.settings()?.summary_history_days,
        };
        self.recent_summaries_since(user_id, profile.registered_on, limit)
    }

    // ---- settings ----

    pub fn settings(&self) -> TrackerResult<Settings> {
        Ok(self.store.settings()?)
    }

    pub fn update_settings(&self, settings: Settings) -> TrackerResult<Settings> {
        let settings = settings.clamped();
        self.store.put_settings(settings.clone())?;
        Ok(settings)
    }
}

/// Every logging event counts toward the overall streak, plus its own kind.
fn streak_kinds(kind: Option<StreakKind>) -> Vec<StreakKind> {
    std::iter::once(StreakKind::Overall).chain(kind).collect()
}
