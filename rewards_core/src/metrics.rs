//! Aggregate metrics over a session history.
//!
//! Everything here is a pure reducer over `(history, as_of)`. Sessions dated
//! after `as_of` are ignored, which makes every figure replayable for any
//! point in the past. Nothing is cached between calls.

use crate::classifier::classify_record;
use crate::{Category, SessionRecord};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Durations below this are assumed to have been logged in minutes
///
/// Upstream producers are inconsistent about units. A genuine session of
/// 4m59s logged in seconds is misread as ~5 hours; this is a known
/// precision gap kept for compatibility with existing data.
pub const MINUTES_HEURISTIC_THRESHOLD: i64 = 300;

/// Strength sessions needed for a week to count towards consistency
pub const QUALIFYING_WEEK_SESSIONS: usize = 3;

/// Convert a raw duration into seconds, applying the minutes heuristic
///
/// Missing, zero, or negative durations contribute nothing.
pub fn normalize_duration(raw: Option<i64>) -> u64 {
    match raw {
        Some(d) if d <= 0 => 0,
        Some(d) if d < MINUTES_HEURISTIC_THRESHOLD => (d as u64) * 60,
        Some(d) => d as u64,
        None => 0,
    }
}

/// First day (Sunday) of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset))
        .unwrap_or(NaiveDate::MIN)
}

/// Date of the most recent session, if any
pub fn latest_session_date(history: &[SessionRecord]) -> Option<NaiveDate> {
    history.iter().map(|r| r.date.date()).max()
}

/// Index of the most recent session; ties go to the last one in input order
pub fn latest_session_index(history: &[SessionRecord]) -> Option<usize> {
    history
        .iter()
        .enumerate()
        .fold(None::<(usize, &SessionRecord)>, |best, (i, r)| match best {
            Some((_, b)) if b.date > r.date => best,
            _ => Some((i, r)),
        })
        .map(|(i, _)| i)
}

/// Explicit "as of" date, defaulting to the latest session date
pub fn resolve_as_of(history: &[SessionRecord], as_of: Option<NaiveDate>) -> NaiveDate {
    as_of
        .or_else(|| latest_session_date(history))
        .unwrap_or(NaiveDate::MIN)
}

/// Every numeric signal the badge conditions read
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub total_sessions: u32,
    pub category_counts: BTreeMap<Category, u32>,
    pub total_volume: f64,
    pub total_time_seconds: u64,
    pub category_time_seconds: BTreeMap<Category, u64>,
    pub max_session_volume: f64,
    pub pr_count: u32,
    pub day_streak: u32,
    pub weekly_streak: u32,
}

impl AggregateMetrics {
    /// Compute all metrics for `history` as of the end of `as_of`
    pub fn compute(history: &[SessionRecord], as_of: NaiveDate) -> Self {
        let mut metrics = AggregateMetrics::default();

        for record in history.iter().filter(|r| r.date.date() <= as_of) {
            let category = classify_record(record);
            let seconds = normalize_duration(record.duration_seconds);

            metrics.total_sessions = metrics.total_sessions.saturating_add(1);
            let count = metrics.category_counts.entry(category).or_insert(0);
            *count = count.saturating_add(1);
            metrics.total_time_seconds = metrics.total_time_seconds.saturating_add(seconds);
            let category_time = metrics.category_time_seconds.entry(category).or_insert(0);
            *category_time = category_time.saturating_add(seconds);

            if category == Category::Strength {
                let volume = record.volume();
                metrics.total_volume += volume;
                metrics.max_session_volume = metrics.max_session_volume.max(volume);
            }
        }

        metrics.pr_count = count_personal_records(history, as_of);
        metrics.day_streak = day_streak(history, as_of);
        metrics.weekly_streak = weekly_consistency_streak(history, as_of);

        tracing::trace!(
            "Computed metrics as of {}: {} sessions, streak {}d/{}w",
            as_of,
            metrics.total_sessions,
            metrics.day_streak,
            metrics.weekly_streak
        );

        metrics
    }

    pub fn category_count(&self, category: Category) -> u32 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    pub fn category_time(&self, category: Category) -> u64 {
        self.category_time_seconds
            .get(&category)
            .copied()
            .unwrap_or(0)
    }
}

/// Consecutive calendar days with at least one session, ending at `as_of`
///
/// A day without a session yet on `as_of` itself does not break the run;
/// the run may end the day before. Any other gap means 0.
pub fn day_streak(history: &[SessionRecord], as_of: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = history
        .iter()
        .map(|r| r.date.date())
        .filter(|d| *d <= as_of)
        .collect();

    let mut cursor = if days.contains(&as_of) {
        as_of
    } else {
        match as_of.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Consecutive qualifying weeks, counted back from the latest qualifying one
///
/// Weeks start on Sunday and qualify with at least
/// [`QUALIFYING_WEEK_SESSIONS`] strength sessions. The current week counts
/// as soon as it qualifies; the first non-qualifying week stops the count.
pub fn weekly_consistency_streak(history: &[SessionRecord], as_of: NaiveDate) -> u32 {
    let mut per_week: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in history
        .iter()
        .filter(|r| r.date.date() <= as_of)
        .filter(|r| classify_record(r) == Category::Strength)
    {
        *per_week.entry(week_start(record.date.date())).or_insert(0) += 1;
    }

    let qualifies = |week: &NaiveDate| {
        per_week.get(week).copied().unwrap_or(0) >= QUALIFYING_WEEK_SESSIONS
    };

    let Some(mut week) = per_week.keys().rev().find(|w| qualifies(*w)).copied() else {
        return 0;
    };

    let mut streak = 0;
    while qualifies(&week) {
        streak += 1;
        match week.checked_sub_days(Days::new(7)) {
            Some(prev) => week = prev,
            None => break,
        }
    }
    streak
}

/// Strength sessions logged in the week containing `day`, up to `day`
pub fn strength_sessions_in_week(history: &[SessionRecord], day: NaiveDate) -> usize {
    let start = week_start(day);
    history
        .iter()
        .filter(|r| {
            let d = r.date.date();
            d >= start && d <= day
        })
        .filter(|r| classify_record(r) == Category::Strength)
        .count()
}

/// Count personal records across strength sessions, in date order
///
/// An exercise's first appearance sets the baseline. After that, a session
/// whose heaviest set beats every earlier set of the same exercise scores
/// one PR for that exercise.
pub fn count_personal_records(history: &[SessionRecord], as_of: NaiveDate) -> u32 {
    let mut ordered: Vec<&SessionRecord> = history
        .iter()
        .filter(|r| r.date.date() <= as_of)
        .filter(|r| classify_record(r) == Category::Strength)
        .collect();
    ordered.sort_by_key(|r| r.date);

    let mut best: HashMap<String, f64> = HashMap::new();
    let mut prs = 0;

    for record in ordered {
        let Some(exercises) = record.exercises.as_ref() else {
            continue;
        };

        // Heaviest set per exercise in this session, names folded together
        let mut session_best: HashMap<String, f64> = HashMap::new();
        for (name, sets) in exercises {
            let heaviest = sets
                .iter()
                .filter_map(|s| s.weight)
                .filter(|w| w.is_finite() && *w > 0.0)
                .fold(0.0_f64, f64::max);
            let entry = session_best.entry(name.trim().to_lowercase()).or_insert(0.0);
            *entry = entry.max(heaviest);
        }

        for (key, heaviest) in session_best {
            match best.entry(key) {
                Entry::Occupied(mut previous) => {
                    if heaviest > *previous.get() {
                        prs += 1;
                        previous.insert(heaviest);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(heaviest);
                }
            }
        }
    }

    prs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetEntry;
    use chrono::NaiveDateTime;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn session(date: NaiveDate, hint: &str) -> SessionRecord {
        SessionRecord::new(at(date, 9), hint)
    }

    #[test]
    fn test_normalize_duration_heuristic() {
        assert_eq!(normalize_duration(None), 0);
        assert_eq!(normalize_duration(Some(-5)), 0);
        assert_eq!(normalize_duration(Some(0)), 0);
        assert_eq!(normalize_duration(Some(45)), 2700);
        assert_eq!(normalize_duration(Some(299)), 17940);
        assert_eq!(normalize_duration(Some(300)), 300);
        assert_eq!(normalize_duration(Some(3600)), 3600);
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2024-03-06 is a Wednesday
        assert_eq!(week_start(day(2024, 3, 6)), day(2024, 3, 3));
        assert_eq!(week_start(day(2024, 3, 3)), day(2024, 3, 3));
        assert_eq!(week_start(day(2024, 3, 9)), day(2024, 3, 3));
    }

    #[test]
    fn test_cumulative_volume() {
        let history = vec![
            session(day(2024, 3, 4), "strength")
                .with_sets("squat", vec![SetEntry::new(100.0, 10.0), SetEntry::new(50.0, 5.0)]),
            session(day(2024, 3, 5), "strength").with_sets("bench", vec![SetEntry::new(80.0, 8.0)]),
        ];

        let metrics = AggregateMetrics::compute(&history, day(2024, 3, 5));
        assert_eq!(metrics.total_volume, 1890.0);
        assert_eq!(metrics.max_session_volume, 1250.0);
    }

    #[test]
    fn test_volume_ignores_non_strength_sessions() {
        let history = vec![session(day(2024, 3, 4), "cardio")
            .with_sets("sled", vec![SetEntry::new(100.0, 10.0)])];

        let metrics = AggregateMetrics::compute(&history, day(2024, 3, 4));
        assert_eq!(metrics.total_volume, 0.0);
        assert_eq!(metrics.category_count(Category::Cardio), 1);
    }

    #[test]
    fn test_category_counts_and_time() {
        let history = vec![
            session(day(2024, 3, 4), "strength").with_duration(3600),
            session(day(2024, 3, 5), "yoga").with_duration(30),
            session(day(2024, 3, 6), "Yoga").with_duration(1800),
            session(day(2024, 3, 7), "nonsense").with_duration(-10),
        ];

        let metrics = AggregateMetrics::compute(&history, day(2024, 3, 7));
        assert_eq!(metrics.total_sessions, 4);
        assert_eq!(metrics.category_count(Category::Yoga), 2);
        assert_eq!(metrics.category_count(Category::Unknown), 1);
        assert_eq!(metrics.category_time(Category::Yoga), 1800 + 1800);
        assert_eq!(metrics.total_time_seconds, 3600 + 3600);
    }

    #[test]
    fn test_sessions_after_as_of_are_ignored() {
        let history = vec![
            session(day(2024, 3, 4), "strength"),
            session(day(2024, 3, 10), "strength"),
        ];

        let metrics = AggregateMetrics::compute(&history, day(2024, 3, 5));
        assert_eq!(metrics.total_sessions, 1);
    }

    #[test]
    fn test_day_streak_counts_calendar_days() {
        let history = vec![
            session(day(2024, 3, 1), "cardio"),
            session(day(2024, 3, 3), "cardio"),
            session(day(2024, 3, 4), "yoga"),
            SessionRecord::new(at(day(2024, 3, 4), 18), "strength"),
            session(day(2024, 3, 5), "recovery"),
        ];

        assert_eq!(day_streak(&history, day(2024, 3, 5)), 3);
    }

    #[test]
    fn test_day_streak_allows_today_not_yet_logged() {
        let history = vec![
            session(day(2024, 3, 3), "cardio"),
            session(day(2024, 3, 4), "cardio"),
        ];

        assert_eq!(day_streak(&history, day(2024, 3, 5)), 2);
        assert_eq!(day_streak(&history, day(2024, 3, 6)), 0);
    }

    #[test]
    fn test_day_streak_empty_history() {
        assert_eq!(day_streak(&[], day(2024, 3, 5)), 0);
    }

    fn strength_week(start: NaiveDate, sessions: u64) -> Vec<SessionRecord> {
        (0..sessions)
            .map(|i| session(start.checked_add_days(Days::new(i + 1)).unwrap(), "strength"))
            .collect()
    }

    #[test]
    fn test_weekly_streak_broken_by_empty_week() {
        // Weeks starting on Sundays 2024-03-03, 03-10, 03-17
        let mut history = strength_week(day(2024, 3, 3), 3);
        history.extend(strength_week(day(2024, 3, 17), 3));

        assert_eq!(weekly_consistency_streak(&history, day(2024, 3, 23)), 1);
    }

    #[test]
    fn test_weekly_streak_consecutive_weeks() {
        let mut history = strength_week(day(2024, 3, 3), 3);
        history.extend(strength_week(day(2024, 3, 10), 4));
        history.extend(strength_week(day(2024, 3, 17), 3));

        assert_eq!(weekly_consistency_streak(&history, day(2024, 3, 23)), 3);
    }

    #[test]
    fn test_weekly_streak_partial_current_week() {
        let mut history = strength_week(day(2024, 3, 3), 3);
        history.extend(strength_week(day(2024, 3, 10), 3));
        // Current week has only one session so far
        history.extend(strength_week(day(2024, 3, 17), 1));

        assert_eq!(weekly_consistency_streak(&history, day(2024, 3, 18)), 2);
    }

    #[test]
    fn test_weekly_streak_ignores_non_strength() {
        let history: Vec<_> = (1..=5)
            .map(|d| session(day(2024, 3, 3 + d), "cardio"))
            .collect();

        assert_eq!(weekly_consistency_streak(&history, day(2024, 3, 9)), 0);
    }

    #[test]
    fn test_strength_sessions_in_week() {
        let history = vec![
            session(day(2024, 3, 2), "strength"), // previous week
            session(day(2024, 3, 3), "strength"),
            session(day(2024, 3, 4), "cardio"),
            session(day(2024, 3, 5), "strength"),
            session(day(2024, 3, 8), "strength"), // after `day`
        ];

        assert_eq!(strength_sessions_in_week(&history, day(2024, 3, 6)), 2);
    }

    #[test]
    fn test_personal_records() {
        let history = vec![
            session(day(2024, 3, 1), "strength")
                .with_sets("Squat", vec![SetEntry::new(100.0, 5.0)])
                .with_sets("bench", vec![SetEntry::new(60.0, 5.0)]),
            session(day(2024, 3, 3), "strength")
                .with_sets("squat ", vec![SetEntry::new(90.0, 5.0), SetEntry::new(105.0, 3.0)])
                .with_sets("bench", vec![SetEntry::new(60.0, 8.0)]),
            session(day(2024, 3, 5), "strength")
                .with_sets("squat", vec![SetEntry::new(110.0, 1.0)]),
        ];

        // squat PR on 03-03 and 03-05; bench only tied
        assert_eq!(count_personal_records(&history, day(2024, 3, 5)), 2);
        assert_eq!(count_personal_records(&history, day(2024, 3, 3)), 1);
    }

    #[test]
    fn test_case_variants_in_one_session_score_one_pr() {
        let history = vec![
            session(day(2024, 3, 1), "strength")
                .with_sets("squat", vec![SetEntry::new(100.0, 5.0)]),
            session(day(2024, 3, 2), "strength")
                .with_sets("Squat", vec![SetEntry::new(105.0, 5.0)])
                .with_sets("squat", vec![SetEntry::new(110.0, 3.0)]),
        ];

        assert_eq!(count_personal_records(&history, day(2024, 3, 2)), 1);

        // The folded best carries forward: 108 is not a PR after 110
        let mut later = history.clone();
        later.push(
            session(day(2024, 3, 3), "strength")
                .with_sets("SQUAT", vec![SetEntry::new(108.0, 5.0)]),
        );
        assert_eq!(count_personal_records(&later, day(2024, 3, 3)), 1);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let history: Vec<_> = (1..=3)
            .map(|d| session(day(2024, 3, d), "cardio").with_duration(i64::MAX))
            .collect();

        let metrics = AggregateMetrics::compute(&history, day(2024, 3, 3));
        assert_eq!(metrics.total_sessions, 3);
        assert_eq!(metrics.total_time_seconds, u64::MAX);
        assert_eq!(metrics.category_time(Category::Cardio), u64::MAX);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let history = vec![
            session(day(2024, 3, 4), "strength").with_sets("row", vec![SetEntry::new(40.0, 10.0)]),
            session(day(2024, 3, 5), "cardio").with_duration(20),
        ];

        let first = AggregateMetrics::compute(&history, day(2024, 3, 5));
        let second = AggregateMetrics::compute(&history, day(2024, 3, 5));
        assert_eq!(first, second);
    }
}
