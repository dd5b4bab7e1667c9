use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub cycle_length: Option<u32>,
    pub period_length: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CycleRecord {
    pub fn new(user_id: Uuid, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            cycle_length: None,
            period_length: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CyclePrediction {
    pub next_period_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "menstrual",
            CyclePhase::Follicular => "follicular",
            CyclePhase::Ovulation => "ovulation",
            CyclePhase::Luteal => "luteal",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where "today" falls in the current cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CycleStatus {
    pub cycle_day: u32,
    pub phase: CyclePhase,
    pub last_period_start: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f32>,
    pub avg_period_length: Option<f32>,
    pub shortest_cycle: Option<u32>,
    pub longest_cycle: Option<u32>,
    pub last_period_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MoodScore {
    VeryBad,
    Bad,
    Neutral,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GutHealth {
    Normal,
    LowBloating,
    ModerateBloating,
    HighBloating,
}

/// Accumulated inputs for one user-day. One row per `(user_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyActivity {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub water_intake: f64,
    pub total_active_minutes: u32,
    pub total_calories: f64,
    #[serde(default)]
    pub exercise_types: Vec<String>,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<SleepQuality>,
    pub mood: Option<MoodScore>,
    pub gut_health: Option<GutHealth>,
    pub updated_at: DateTime<Utc>,
}

impl DailyActivity {
    pub fn empty(user_id: Uuid, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            water_intake: 0.0,
            total_active_minutes: 0,
            total_calories: 0.0,
            exercise_types: Vec::new(),
            sleep_hours: None,
            sleep_quality: None,
            mood: None,
            gut_health: None,
            updated_at: Utc::now(),
        }
    }
}

/// Fields carried by a single logging event.
///
/// Numeric fields are deltas added to the day's totals; categorical fields
/// replace the stored value when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityUpdate {
    pub water_intake: Option<f64>,
    pub active_minutes: Option<u32>,
    pub calories: Option<f64>,
    pub exercise_type: Option<String>,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<SleepQuality>,
    pub mood: Option<MoodScore>,
    pub gut_health: Option<GutHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub kind: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub calories_burned: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub name: String,
    pub portion: String,
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub foods: Vec<FoodItem>,
    pub total_calories: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A meal as submitted by the user, before it is keyed and dated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMeal {
    pub meal_type: MealType,
    pub foods: Vec<FoodItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymptomType {
    Cramps,
    Bloating,
    Acne,
    Headache,
    MoodSwings,
    Fatigue,
    BackPain,
    BreastTenderness,
    FoodCravings,
    Insomnia,
    Anxiety,
    Depression,
    HairLoss,
    WeightGain,
    IrregularPeriods,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    VeryHappy,
    Happy,
    Neutral,
    Sad,
    VerySad,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    VeryHigh,
    High,
    Normal,
    Low,
    VeryLow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    pub symptom_type: SymptomType,
    pub severity: Severity,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Symptoms, mood and energy noted for one day. A user may log several
/// entries for the same date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub symptoms: Vec<Symptom>,
    pub mood: MoodLevel,
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A symptom entry as submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSymptomLog {
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub symptoms: Vec<Symptom>,
    pub mood: MoodLevel,
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyHealthSummary {
    pub user_id: Uuid,
    pub date: NaiveDate,
    // Snapshot of the inputs at generation time
    pub water_intake: f64,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<SleepQuality>,
    pub mood: Option<MoodScore>,
    pub total_active_minutes: u32,
    pub total_calories: f64,
    pub exercise_types: Vec<String>,
    pub gut_health: Option<GutHealth>,
    pub meal_count: u32,
    pub nutrition_calories: f64,
    // Analysis
    pub health_score: u8,
    pub status: HealthStatus,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub registered_on: NaiveDate,
    pub average_cycle_length: u32,
    pub period_length: u32,
    pub last_period_start: NaiveDate,
    #[serde(default)]
    pub onboarding_completed: bool,
}

/// Self-reported cycle history collected during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingProfile {
    pub average_cycle_length: u32,
    pub last_period_start: NaiveDate,
    pub period_length: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StreakKind {
    Overall,
    Water,
    Exercise,
    FoodLogging,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyStreak {
    pub user_id: Uuid,
    pub kind: StreakKind,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl ConsistencyStreak {
    pub fn none(user_id: Uuid, kind: StreakKind) -> Self {
        Self {
            user_id,
            kind,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        }
    }
}

/// Everything a store keeps, serialized as one document by the vault.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthData {
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub activities: Vec<DailyActivity>,
    #[serde(default)]
    pub meals: Vec<MealLog>,
    #[serde(default)]
    pub symptoms: Vec<SymptomLog>,
    #[serde(default)]
    pub summaries: Vec<DailyHealthSummary>,
    #[serde(default)]
    pub streaks: Vec<ConsistencyStreak>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub summary_history_days: u32,
    pub cycle_history_limit: usize,
    pub log_history_limit: usize,
    pub default_period_length: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            summary_history_days: 30,
            cycle_history_limit: 10,
            log_history_limit: 30,
            default_period_length: 5,
        }
    }
}

impl Settings {
    /// Bring every field back into its supported range.
    pub fn clamped(self) -> Self {
        Self {
            summary_history_days: self.summary_history_days.clamp(1, 365),
            cycle_history_limit: self.cycle_history_limit.clamp(1, 100),
            log_history_limit: self.log_history_limit.clamp(1, 365),
            default_period_length: self.default_period_length.clamp(2, 10),
        }
    }
}
