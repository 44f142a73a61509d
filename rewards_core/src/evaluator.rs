//! Badge condition evaluation.
//!
//! Numeric conditions read [`AggregateMetrics`]. Special conditions are not
//! simple aggregates, so they re-scan the history directly.

use crate::classifier::classify_record;
use crate::metrics::AggregateMetrics;
use crate::{Category, Condition, SessionRecord, SpecialKind};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

/// Sessions starting before this hour count as early
pub const EARLY_BIRD_BEFORE_HOUR: u32 = 7;

/// Sessions starting at or after this hour count as late
pub const NIGHT_OWL_FROM_HOUR: u32 = 21;

/// Maximum gap between two session starts to count as back-to-back
pub const BACK_TO_BACK_WINDOW_MINUTES: i64 = 60;

/// Returns true if `condition` is met
///
/// An `Unrecognized` condition is a programming error: it asserts in debug
/// builds and stays locked in release builds.
pub fn evaluate(
    condition: &Condition,
    metrics: &AggregateMetrics,
    history: &[SessionRecord],
) -> bool {
    match condition {
        Condition::SessionCount { threshold } => metrics.total_sessions >= *threshold,
        Condition::StreakDays { threshold } => metrics.day_streak >= *threshold,
        Condition::PrCount { threshold } => metrics.pr_count >= *threshold,
        Condition::TotalVolume { threshold } => metrics.total_volume >= *threshold,
        Condition::TotalTimeSeconds { threshold } => metrics.total_time_seconds >= *threshold,
        Condition::CategoryCount {
            category,
            threshold,
        } => metrics.category_count(*category) >= *threshold,
        Condition::CategoryTimeSeconds {
            category,
            threshold,
        } => metrics.category_time(*category) >= *threshold,
        Condition::SingleSessionVolume { threshold } => metrics.max_session_volume >= *threshold,
        Condition::WeeklyConsistencyStreak { weeks } => metrics.weekly_streak >= *weeks,
        Condition::Special { kind, threshold } => {
            special_count(*kind, history) >= threshold.unwrap_or(1)
        }
        Condition::Unrecognized => {
            debug_assert!(false, "unrecognized badge condition reached the evaluator");
            tracing::error!("Unrecognized badge condition; treating as locked");
            false
        }
    }
}

/// Whether a condition tracks a monotonic numeric milestone
///
/// Only these have a meaningful "was it already met before" value.
pub fn is_progressive(condition: &Condition) -> bool {
    match condition {
        Condition::SessionCount { .. }
        | Condition::StreakDays { .. }
        | Condition::PrCount { .. }
        | Condition::TotalVolume { .. }
        | Condition::TotalTimeSeconds { .. }
        | Condition::CategoryCount { .. }
        | Condition::CategoryTimeSeconds { .. }
        | Condition::SingleSessionVolume { .. }
        | Condition::WeeklyConsistencyStreak { .. } => true,
        Condition::Special { .. } | Condition::Unrecognized => false,
    }
}

/// How far along a condition is, for progress bars
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConditionProgress {
    pub current: f64,
    pub target: f64,
}

impl ConditionProgress {
    /// Completion ratio clamped to `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.current / self.target).clamp(0.0, 1.0)
    }
}

/// Current value and target for a condition
pub fn progress(
    condition: &Condition,
    metrics: &AggregateMetrics,
    history: &[SessionRecord],
) -> ConditionProgress {
    let (current, target) = match condition {
        Condition::SessionCount { threshold } => (metrics.total_sessions as f64, *threshold as f64),
        Condition::StreakDays { threshold } => (metrics.day_streak as f64, *threshold as f64),
        Condition::PrCount { threshold } => (metrics.pr_count as f64, *threshold as f64),
        Condition::TotalVolume { threshold } => (metrics.total_volume, *threshold),
        Condition::TotalTimeSeconds { threshold } => {
            (metrics.total_time_seconds as f64, *threshold as f64)
        }
        Condition::CategoryCount {
            category,
            threshold,
        } => (metrics.category_count(*category) as f64, *threshold as f64),
        Condition::CategoryTimeSeconds {
            category,
            threshold,
        } => (metrics.category_time(*category) as f64, *threshold as f64),
        Condition::SingleSessionVolume { threshold } => (metrics.max_session_volume, *threshold),
        Condition::WeeklyConsistencyStreak { weeks } => {
            (metrics.weekly_streak as f64, *weeks as f64)
        }
        Condition::Special { kind, threshold } => (
            special_count(*kind, history) as f64,
            threshold.unwrap_or(1) as f64,
        ),
        Condition::Unrecognized => (0.0, 1.0),
    };

    ConditionProgress { current, target }
}

/// Occurrences of a special pattern in history
pub fn special_count(kind: SpecialKind, history: &[SessionRecord]) -> u32 {
    let count = match kind {
        SpecialKind::EarlyBird => history
            .iter()
            .filter(|r| r.date.hour() < EARLY_BIRD_BEFORE_HOUR)
            .count(),
        SpecialKind::NightOwl => history
            .iter()
            .filter(|r| r.date.hour() >= NIGHT_OWL_FROM_HOUR)
            .count(),
        SpecialKind::WeekendWarrior => full_weekends(history),
        SpecialKind::Variety => history
            .iter()
            .map(classify_record)
            .filter(|c| *c != Category::Unknown)
            .collect::<BTreeSet<_>>()
            .len(),
        SpecialKind::BackToBack => back_to_back_pairs(history),
    };
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Saturdays where the following Sunday also has a session
fn full_weekends(history: &[SessionRecord]) -> usize {
    let days: BTreeSet<NaiveDate> = history.iter().map(|r| r.date.date()).collect();
    days.iter()
        .filter(|d| d.weekday() == Weekday::Sat)
        .filter(|d| d.succ_opt().map(|sun| days.contains(&sun)).unwrap_or(false))
        .count()
}

/// Adjacent session starts no more than the back-to-back window apart
fn back_to_back_pairs(history: &[SessionRecord]) -> usize {
    let mut starts: Vec<NaiveDateTime> = history.iter().map(|r| r.date).collect();
    starts.sort();

    let window = Duration::minutes(BACK_TO_BACK_WINDOW_MINUTES);
    starts.windows(2).filter(|pair| pair[1] - pair[0] <= window).count()
}
