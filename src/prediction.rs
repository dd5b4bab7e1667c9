use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::models::{
    CyclePhase, CyclePrediction, CycleRecord, CycleStats, CycleStatus, OnboardingProfile,
};

/// Days between ovulation and the following period.
const LUTEAL_PHASE_DAYS: u64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: u64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: u64 = 1;

/// Predict the next period from cycle history ordered most-recent first.
///
/// Returns `None` when the history is empty or no record carries a cycle
/// length. The anchor is the first record's start date; callers are
/// responsible for the ordering.
pub fn predict_next_period(cycles: &[CycleRecord]) -> Option<CyclePrediction> {
    let last = cycles.first()?;

    let cycle_lengths: Vec<f64> = cycles
        .iter()
        .filter_map(|c| c.cycle_length)
        .filter(|&len| len > 0)
        .map(f64::from)
        .collect();

    if cycle_lengths.is_empty() {
        return None;
    }

    let avg_cycle = mean(&cycle_lengths).round();

    let next_period_date = last.start_date.checked_add_days(Days::new(avg_cycle as u64))?;
    let ovulation_date = next_period_date.checked_sub_days(Days::new(LUTEAL_PHASE_DAYS))?;
    let fertile_window_start =
        ovulation_date.checked_sub_days(Days::new(FERTILE_DAYS_BEFORE_OVULATION))?;
    let fertile_window_end =
        ovulation_date.checked_add_days(Days::new(FERTILE_DAYS_AFTER_OVULATION))?;

    let confidence = (1.0 - std_deviation(&cycle_lengths) / avg_cycle).clamp(0.0, 1.0);

    Some(CyclePrediction {
        next_period_date,
        ovulation_date,
        fertile_window_start,
        fertile_window_end,
        confidence,
    })
}

/// Classify a 1-based cycle day into a phase.
///
/// Bands assume a 28-day cycle and ignore the user's own average.
pub fn current_phase(day_of_cycle: u32) -> CyclePhase {
    match day_of_cycle {
        0..=5 => CyclePhase::Menstrual,
        6..=13 => CyclePhase::Follicular,
        14..=16 => CyclePhase::Ovulation,
        _ => CyclePhase::Luteal,
    }
}

/// 1-based day of the cycle that started on `start`. `None` if `start` is
/// after `today`.
pub fn cycle_day(start: NaiveDate, today: NaiveDate) -> Option<u32> {
    let elapsed = (today - start).num_days();
    if elapsed < 0 {
        return None;
    }
    u32::try_from(elapsed).ok()?.checked_add(1)
}

/// Day and phase for `today`, anchored on the first (most recent) record.
pub fn cycle_status(cycles: &[CycleRecord], today: NaiveDate) -> Option<CycleStatus> {
    let last = cycles.first()?;
    let day = cycle_day(last.start_date, today)?;

    Some(CycleStatus {
        cycle_day: day,
        phase: current_phase(day),
        last_period_start: last.start_date,
    })
}

/// Compute cycle statistics for the stats view.
///
/// Records without a stored cycle length fall back to the gap to the next
/// recorded start, so history with missing lengths still contributes.
pub fn cycle_stats(cycles: &[CycleRecord]) -> CycleStats {
    let mut ordered: Vec<&CycleRecord> = cycles.iter().collect();
    ordered.sort_by_key(|c| c.start_date);

    let mut cycle_lengths: Vec<u32> = ordered
        .windows(2)
        .filter_map(|w| {
            w[0].cycle_length.or_else(|| {
                u32::try_from((w[1].start_date - w[0].start_date).num_days()).ok()
            })
        })
        .filter(|&len| len > 0)
        .collect();
    if let Some(len) = ordered.last().and_then(|c| c.cycle_length) {
        if len > 0 {
            cycle_lengths.push(len);
        }
    }

    let period_lengths: Vec<f64> = ordered
        .iter()
        .filter_map(|c| c.period_length)
        .map(f64::from)
        .collect();

    let cycle_values: Vec<f64> = cycle_lengths.iter().copied().map(f64::from).collect();

    CycleStats {
        total_cycles: ordered.len(),
        avg_cycle_length: if cycle_values.is_empty() {
            None
        } else {
            Some(mean(&cycle_values) as f32)
        },
        avg_period_length: if period_lengths.is_empty() {
            None
        } else {
            Some(mean(&period_lengths) as f32)
        },
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        last_period_start: ordered.last().map(|c| c.start_date),
    }
}

/// Build the single record synthesized from onboarding answers.
pub fn initial_cycle(
    user_id: Uuid,
    profile: &OnboardingProfile,
    default_period_length: u32,
) -> CycleRecord {
    let mut record = CycleRecord::new(user_id, profile.last_period_start);
    record.cycle_length = Some(profile.average_cycle_length);
    record.period_length = Some(profile.period_length.unwrap_or(default_period_length));
    record
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
