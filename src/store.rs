//! Storage boundary for tracked health data.

use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::activity;
use crate::crypto::CryptoError;
use crate::models::{
    ActivityUpdate, ConsistencyStreak, CycleRecord, DailyActivity, DailyHealthSummary, HealthData,
    MealLog, Settings, StreakKind, SymptomLog, UserProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("vault is locked")]
    Locked,
    #[error("vault already exists")]
    AlreadyExists,
    #[error("cycle record {0} not found")]
    CycleNotFound(Uuid),
    #[error("store state poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the tracker needs. Keys are `(user, date)` for
/// day-scoped records.
///
/// The provided read-modify-write methods (`upsert_activity`,
/// `advance_streaks`, `record_activity`, `record_meal`) are built from the
/// primitive reads and writes and are not atomic. Stores shared between
/// threads override them; every [`HealthDocument`] does so with a single
/// write.
pub trait HealthStore: Send + Sync {
    // Profiles

    fn profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    fn put_profile(&self, profile: UserProfile) -> StoreResult<()>;

    // Cycles

    fn insert_cycle(&self, record: CycleRecord) -> StoreResult<()>;

    /// Up to `limit` records, most recent start date first.
    fn recent_cycles(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<CycleRecord>>;

    fn set_cycle_length(&self, cycle_id: Uuid, cycle_length: u32) -> StoreResult<()>;

    // Daily activity

    fn activity(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<DailyActivity>>;

    fn put_activity(&self, activity: DailyActivity) -> StoreResult<()>;

    /// Add an event to the day's record, creating it if needed.
    fn upsert_activity(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        update: &ActivityUpdate,
    ) -> StoreResult<DailyActivity> {
        let existing = self.activity(user_id, date)?;
        let updated = activity::upsert_activity(existing, user_id, date, update);
        self.put_activity(updated.clone())?;
        Ok(updated)
    }

    /// Apply a logging event and advance the given streaks for its date.
    fn record_activity(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        update: &ActivityUpdate,
        streaks: &[StreakKind],
    ) -> StoreResult<DailyActivity> {
        let updated = self.upsert_activity(user_id, date, update)?;
        self.advance_streaks(user_id, date, streaks)?;
        Ok(updated)
    }

    // Meals

    fn insert_meal(&self, meal: MealLog) -> StoreResult<()>;

    /// Store a meal and advance the given streaks for its date.
    fn record_meal(&self, meal: MealLog, streaks: &[StreakKind]) -> StoreResult<()> {
        let (user_id, date) = (meal.user_id, meal.date);
        self.insert_meal(meal)?;
        self.advance_streaks(user_id, date, streaks)?;
        Ok(())
    }

    fn meals_on(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Vec<MealLog>>;

    /// Up to `limit` meals, most recent date first.
    fn recent_meals(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<MealLog>>;

    // Symptoms

    fn insert_symptom_log(&self, log: SymptomLog) -> StoreResult<()>;

    /// Up to `limit` symptom logs, most recent date first.
    fn recent_symptom_logs(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<SymptomLog>>;

    // Summaries

    fn summary(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<DailyHealthSummary>>;

    /// Overwrites any summary already stored for the same day.
    fn put_summary(&self, summary: DailyHealthSummary) -> StoreResult<()>;

    fn put_summaries(&self, summaries: Vec<DailyHealthSummary>) -> StoreResult<()> {
        for summary in summaries {
            self.put_summary(summary)?;
        }
        Ok(())
    }

    // Streaks

    fn streak(&self, user_id: Uuid, kind: StreakKind) -> StoreResult<Option<ConsistencyStreak>>;

    fn put_streak(&self, streak: ConsistencyStreak) -> StoreResult<()>;

    /// Count `date` as an active day for each kind.
    fn advance_streaks(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        kinds: &[StreakKind],
    ) -> StoreResult<()> {
        for &kind in kinds {
            let current = self
                .streak(user_id, kind)?
                .unwrap_or_else(|| ConsistencyStreak::none(user_id, kind));
            self.put_streak(activity::advance_streak(current, date))?;
        }
        Ok(())
    }

    // Settings

    fn settings(&self) -> StoreResult<Settings>;

    fn put_settings(&self, settings: Settings) -> StoreResult<()>;
}

/// A store whose whole state is one [`HealthData`] document.
pub trait HealthDocument: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&HealthData) -> R) -> StoreResult<R>;

    fn write<R>(&self, f: impl FnOnce(&mut HealthData) -> R) -> StoreResult<R>;
}

impl<T: HealthDocument> HealthStore for T {
    fn profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        self.read(|d| d.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    fn put_profile(&self, profile: UserProfile) -> StoreResult<()> {
        self.write(|d| {
            d.profiles.retain(|p| p.user_id != profile.user_id);
            d.profiles.push(profile);
        })
    }

    fn insert_cycle(&self, record: CycleRecord) -> StoreResult<()> {
        self.write(|d| d.cycles.push(record))
    }

    fn recent_cycles(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<CycleRecord>> {
        self.read(|d| {
            let mut cycles: Vec<CycleRecord> = d
                .cycles
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            cycles.sort_by(|a, b| {
                b.start_date
                    .cmp(&a.start_date)
                    .then(b.created_at.cmp(&a.created_at))
            });
            cycles.truncate(limit);
            cycles
        })
    }

    fn set_cycle_length(&self, cycle_id: Uuid, cycle_length: u32) -> StoreResult<()> {
        let found = self.write(|d| match d.cycles.iter_mut().find(|c| c.id == cycle_id) {
            Some(record) => {
                record.cycle_length = Some(cycle_length);
                true
            }
            None => false,
        })?;
        if found {
            Ok(())
        } else {
            Err(StoreError::CycleNotFound(cycle_id))
        }
    }

    fn activity(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<DailyActivity>> {
        self.read(|d| {
            d.activities
                .iter()
                .find(|a| a.user_id == user_id && a.date == date)
                .cloned()
        })
    }

    fn put_activity(&self, activity: DailyActivity) -> StoreResult<()> {
        self.write(|d| {
            d.activities
                .retain(|a| !(a.user_id == activity.user_id && a.date == activity.date));
            d.activities.push(activity);
        })
    }

    fn upsert_activity(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        update: &ActivityUpdate,
    ) -> StoreResult<DailyActivity> {
        self.write(|d| apply_activity(d, user_id, date, update))
    }

    fn record_activity(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        update: &ActivityUpdate,
        streaks: &[StreakKind],
    ) -> StoreResult<DailyActivity> {
        self.write(|d| {
            let updated = apply_activity(d, user_id, date, update);
            advance_streaks_in(d, user_id, date, streaks);
            updated
        })
    }

    fn insert_meal(&self, meal: MealLog) -> StoreResult<()> {
        self.write(|d| d.meals.push(meal))
    }

    fn record_meal(&self, meal: MealLog, streaks: &[StreakKind]) -> StoreResult<()> {
        self.write(|d| {
            advance_streaks_in(d, meal.user_id, meal.date, streaks);
            d.meals.push(meal);
        })
    }

    fn recent_meals(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<MealLog>> {
        self.read(|d| {
            let mut meals: Vec<MealLog> = d
                .meals
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect();
            meals.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
            meals.truncate(limit);
            meals
        })
    }

    fn insert_symptom_log(&self, log: SymptomLog) -> StoreResult<()> {
        self.write(|d| d.symptoms.push(log))
    }

    fn recent_symptom_logs(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<SymptomLog>> {
        self.read(|d| {
            let mut logs: Vec<SymptomLog> = d
                .symptoms
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            logs.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
            logs.truncate(limit);
            logs
        })
    }

    fn meals_on(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Vec<MealLog>> {
        self.read(|d| {
            d.meals
                .iter()
                .filter(|m| m.user_id == user_id && m.date == date)
                .cloned()
                .collect()
        })
    }

    fn summary(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<DailyHealthSummary>> {
        self.read(|d| {
            d.summaries
                .iter()
                .find(|s| s.user_id == user_id && s.date == date)
                .cloned()
        })
    }

    fn put_summary(&self, summary: DailyHealthSummary) -> StoreResult<()> {
        self.write(|d| replace_summary(d, summary))
    }

    fn put_summaries(&self, summaries: Vec<DailyHealthSummary>) -> StoreResult<()> {
        self.write(|d| {
            for summary in summaries {
                replace_summary(d, summary);
            }
        })
    }

    fn streak(&self, user_id: Uuid, kind: StreakKind) -> StoreResult<Option<ConsistencyStreak>> {
        self.read(|d| {
            d.streaks
                .iter()
                .find(|s| s.user_id == user_id && s.kind == kind)
                .cloned()
        })
    }

    fn put_streak(&self, streak: ConsistencyStreak) -> StoreResult<()> {
        self.write(|d| {
            d.streaks
                .retain(|s| !(s.user_id == streak.user_id && s.kind == streak.kind));
            d.streaks.push(streak);
        })
    }

    fn advance_streaks(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        kinds: &[StreakKind],
    ) -> StoreResult<()> {
        self.write(|d| advance_streaks_in(d, user_id, date, kinds))
    }

    fn settings(&self) -> StoreResult<Settings> {
        self.read(|d| d.settings.clone())
    }

    fn put_settings(&self, settings: Settings) -> StoreResult<()> {
        self.write(|d| d.settings = settings)
    }
}

fn apply_activity(
    d: &mut HealthData,
    user_id: Uuid,
    date: NaiveDate,
    update: &ActivityUpdate,
) -> DailyActivity {
    match d
        .activities
        .iter_mut()
        .find(|a| a.user_id == user_id && a.date == date)
    {
        Some(existing) => {
            existing.apply(update);
            existing.clone()
        }
        None => {
            let created = activity::upsert_activity(None, user_id, date, update);
            d.activities.push(created.clone());
            created
        }
    }
}

fn advance_streaks_in(d: &mut HealthData, user_id: Uuid, date: NaiveDate, kinds: &[StreakKind]) {
    for &kind in kinds {
        match d
            .streaks
            .iter_mut()
            .find(|s| s.user_id == user_id && s.kind == kind)
        {
            Some(streak) => *streak = activity::advance_streak(streak.clone(), date),
            None => d.streaks.push(activity::advance_streak(
                ConsistencyStreak::none(user_id, kind),
                date,
            )),
        }
    }
}

fn replace_summary(d: &mut HealthData, summary: DailyHealthSummary) {
    d.summaries
        .retain(|s| !(s.user_id == summary.user_id && s.date == summary.date));
    d.summaries.push(summary);
}

/// Non-persistent store, for tests and for hosts that bring their own
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HealthData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: HealthData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }
}

impl HealthDocument for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&HealthData) -> R) -> StoreResult<R> {
        let data = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&data))
    }

    fn write<R>(&self, f: impl FnOnce(&mut HealthData) -> R) -> StoreResult<R> {
        let mut data = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut data))
    }
}
