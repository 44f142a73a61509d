//! Reward orchestration.
//!
//! Combines classification, points, and unlock resolution into the three
//! operations a host performs:
//!
//! 1. **Apply** a just-logged session to the stored state
//! 2. **Backfill** after a migration or reinstall (retroactive, badges only)
//! 3. **Replay** a whole history into a fresh state
//!
//! None of these touch the filesystem; the host persists the returned state.

use crate::classifier::classify_record;
use crate::level::{compute_level, LevelInfo};
use crate::metrics::{day_streak, latest_session_index};
use crate::migration::{migrate_badge_ids_report, migrate_badge_ids_with};
use crate::points::{compute_session_points, weekly_bonus_active};
use crate::resolver::{resolve_unlocks, ResolveMode};
use crate::{BadgeDefinition, BadgeId, Catalog, Category, RewardState, SessionRecord};
use chrono::NaiveDate;
use serde::Serialize;

/// Result of applying one session
#[derive(Clone, Debug, Serialize)]
pub struct SessionOutcome {
    pub category: Category,
    pub streak_days: u32,
    pub weekly_bonus: bool,
    pub session_points: u64,
    pub badge_points: u64,
    pub new_badges: Vec<BadgeDefinition>,
    pub state: RewardState,
}

impl SessionOutcome {
    pub fn level(&self) -> LevelInfo {
        compute_level(self.state.total_points)
    }

    pub fn leveled_up(&self, prior: &RewardState) -> bool {
        self.level().level > compute_level(prior.total_points).level
    }
}

/// Result of a retroactive reconciliation
#[derive(Clone, Debug, Serialize)]
pub struct BackfillOutcome {
    /// Stored ids after migration to the current catalog
    pub migrated_ids: Vec<BadgeId>,
    /// Stored ids that had no place in the current catalog
    pub dropped: Vec<BadgeId>,
    pub new_badges: Vec<BadgeDefinition>,
    pub badge_points: u64,
    pub state: RewardState,
}

fn grant(prior_ids: &[BadgeId], new_badges: &[BadgeDefinition], points: u64) -> RewardState {
    let mut unlocked_badge_ids = prior_ids.to_vec();
    unlocked_badge_ids.extend(new_badges.iter().map(|b| b.id.clone()));
    RewardState {
        unlocked_badge_ids,
        total_points: points,
    }
}

/// Apply the latest session in `history` to `prior`
///
/// `history` must already contain the just-logged session; the latest by
/// date is the one scored. Stored ids are migrated to the current catalog
/// first, so a legacy id still blocks its renamed badge. Returns `None` for
/// an empty history.
pub fn apply_session(
    catalog: &Catalog,
    history: &[SessionRecord],
    prior: &RewardState,
) -> Option<SessionOutcome> {
    let index = latest_session_index(history)?;
    let latest = &history[index];
    let day = latest.date.date();

    let earlier: Vec<SessionRecord> = history
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, r)| r.clone())
        .collect();

    let category = classify_record(latest);
    let streak_days = day_streak(history, day);
    let weekly_bonus = weekly_bonus_active(&earlier, day);
    let session_points = compute_session_points(category, streak_days, weekly_bonus);

    let held = migrate_badge_ids_with(catalog, &prior.unlocked_badge_ids);
    let new_badges: Vec<BadgeDefinition> = resolve_unlocks(
        catalog,
        history,
        &held,
        ResolveMode::Incremental,
        Some(day),
    )
    .into_iter()
    .cloned()
    .collect();
    let badge_points: u64 = new_badges.iter().map(|b| b.points_on_unlock).sum();

    let total = prior
        .total_points
        .saturating_add(session_points)
        .saturating_add(badge_points);
    let state = grant(&held, &new_badges, total);

    tracing::info!(
        "Applied {} session: +{} points (streak {}d, weekly bonus {}), {} new badges",
        category,
        session_points,
        streak_days,
        weekly_bonus,
        new_badges.len()
    );

    Some(SessionOutcome {
        category,
        streak_days,
        weekly_bonus,
        session_points,
        badge_points,
        new_badges,
        state,
    })
}

/// Migrate stored ids and grant every earned badge not yet granted
///
/// Session points are not re-awarded; only badge bonuses are added.
pub fn backfill(
    catalog: &Catalog,
    history: &[SessionRecord],
    prior: &RewardState,
    as_of: Option<NaiveDate>,
) -> BackfillOutcome {
    let migration = migrate_badge_ids_report(catalog, &prior.unlocked_badge_ids);
    let migrated_ids = migration.ids;
    let dropped = migration.dropped;

    let new_badges: Vec<BadgeDefinition> = resolve_unlocks(
        catalog,
        history,
        &migrated_ids,
        ResolveMode::Retroactive,
        as_of,
    )
    .into_iter()
    .cloned()
    .collect();
    let badge_points: u64 = new_badges.iter().map(|b| b.points_on_unlock).sum();

    let state = grant(
        &migrated_ids,
        &new_badges,
        prior.total_points.saturating_add(badge_points),
    );

    tracing::info!(
        "Backfill: {} ids kept, {} dropped, {} badges granted (+{} points)",
        migrated_ids.len(),
        dropped.len(),
        new_badges.len(),
        badge_points
    );

    BackfillOutcome {
        migrated_ids,
        dropped,
        new_badges,
        badge_points,
        state,
    }
}

/// Rebuild reward state from nothing by applying every session in date order
pub fn replay(catalog: &Catalog, history: &[SessionRecord]) -> RewardState {
    let mut ordered: Vec<&SessionRecord> = history.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let mut prefix: Vec<SessionRecord> = Vec::with_capacity(ordered.len());
    let mut state = RewardState::default();

    for record in ordered {
        prefix.push(record.clone());
        if let Some(outcome) = apply_session(catalog, &prefix, &state) {
            state = outcome.state;
        }
    }

    tracing::info!(
        "Replayed {} sessions: {} points, {} badges",
        prefix.len(),
        state.total_points,
        state.unlocked_badge_ids.len()
    );

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_default_catalog, BADGE_UNLOCK_POINTS};
    use crate::SetEntry;
    use chrono::{Days, NaiveDateTime};

    fn at(offset_days: u64, hour: u32) -> NaiveDateTime {
        // 2024-01-01 is a Monday
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset_days))
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn strength(offset_days: u64) -> SessionRecord {
        SessionRecord::new(at(offset_days, 10), "strength")
            .with_sets("squat", vec![SetEntry::new(50.0, 10.0)])
    }

    #[test]
    fn test_apply_first_session() {
        let catalog = build_default_catalog();
        let history = vec![strength(0)];

        let outcome = apply_session(&catalog, &history, &RewardState::default()).unwrap();
        assert_eq!(outcome.category, Category::Strength);
        assert_eq!(outcome.session_points, 100);
        assert_eq!(outcome.badge_points, BADGE_UNLOCK_POINTS);
        assert_eq!(outcome.state.total_points, 100 + BADGE_UNLOCK_POINTS);
        assert_eq!(outcome.state.unlocked_badge_ids, vec!["first_workout".to_string()]);
        assert!(outcome.leveled_up(&RewardState::default()));
    }

    #[test]
    fn test_apply_empty_history() {
        let catalog = build_default_catalog();
        assert!(apply_session(&catalog, &[], &RewardState::default()).is_none());
    }

    #[test]
    fn test_weekly_bonus_from_earlier_sessions() {
        let catalog = build_default_catalog();
        // Mon, Tue, Wed earlier this week; Thursday is scored with the bonus
        let history: Vec<_> = (0..4).map(strength).collect();
        let prior = RewardState {
            unlocked_badge_ids: vec!["first_workout".into(), "streak_3".into()],
            total_points: 0,
        };

        let outcome = apply_session(&catalog, &history, &prior).unwrap();
        assert!(outcome.weekly_bonus);
        assert_eq!(outcome.streak_days, 4);
        assert_eq!(outcome.session_points, 120);
        assert!(outcome.new_badges.is_empty());
    }

    #[test]
    fn test_apply_does_not_regrant() {
        let catalog = build_default_catalog();
        let history = vec![strength(0)];
        let prior = RewardState {
            unlocked_badge_ids: vec!["first_workout".into()],
            total_points: 500,
        };

        let outcome = apply_session(&catalog, &history, &prior).unwrap();
        assert!(outcome.new_badges.is_empty());
        assert_eq!(outcome.state.unlocked_badge_ids, prior.unlocked_badge_ids);
        assert_eq!(outcome.state.total_points, 600);
    }

    #[test]
    fn test_backfill_migrates_and_grants() {
        let catalog = build_default_catalog();
        let history: Vec<_> = (0..3).map(strength).collect();
        let prior = RewardState {
            unlocked_badge_ids: vec!["first_session".into(), "beta_tester".into()],
            total_points: 1_000,
        };

        let outcome = backfill(&catalog, &history, &prior, None);
        assert_eq!(outcome.migrated_ids, vec!["first_workout".to_string()]);
        assert_eq!(outcome.dropped, vec!["beta_tester".to_string()]);

        let new_ids: Vec<_> = outcome.new_badges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(new_ids, vec!["streak_3"]);
        assert_eq!(outcome.state.total_points, 1_000 + BADGE_UNLOCK_POINTS);
        assert_eq!(
            outcome.state.unlocked_badge_ids,
            vec!["first_workout".to_string(), "streak_3".to_string()]
        );
    }

    #[test]
    fn test_apply_with_legacy_ids_does_not_regrant() {
        let catalog = build_default_catalog();
        let early = |day: u32, hour: u32| {
            let date = NaiveDate::from_ymd_opt(2024, 4, day).unwrap();
            SessionRecord::new(date.and_hms_opt(hour, 0, 0).unwrap(), "cardio")
        };
        let history = vec![early(1, 6), early(3, 6)];
        let prior = RewardState {
            unlocked_badge_ids: vec!["early_riser".into(), "first_session".into()],
            total_points: 0,
        };

        let outcome = apply_session(&catalog, &history, &prior).unwrap();
        assert!(outcome.new_badges.is_empty());
        assert_eq!(outcome.badge_points, 0);
        assert_eq!(
            outcome.state.unlocked_badge_ids,
            vec!["early_bird".to_string(), "first_workout".to_string()]
        );
        assert_eq!(outcome.state.total_points, 80);
    }

    #[test]
    fn test_backfill_does_not_count_duplicates_as_dropped() {
        let catalog = build_default_catalog();
        let history = vec![strength(0)];
        let prior = RewardState {
            unlocked_badge_ids: vec!["first_session".into(), "first_workout".into()],
            total_points: 150,
        };

        let outcome = backfill(&catalog, &history, &prior, None);
        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.migrated_ids, vec!["first_workout".to_string()]);
    }

    #[test]
    fn test_backfill_twice_is_noop() {
        let catalog = build_default_catalog();
        let history: Vec<_> = (0..8).map(strength).collect();

        let first = backfill(&catalog, &history, &RewardState::default(), None);
        let second = backfill(&catalog, &history, &first.state, None);
        assert!(second.new_badges.is_empty());
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn test_replay_matches_step_by_step() {
        let catalog = build_default_catalog();
        let history: Vec<_> = (0..9).map(strength).collect();

        let mut state = RewardState::default();
        for n in 1..=history.len() {
            state = apply_session(&catalog, &history[..n], &state).unwrap().state;
        }

        // Replay accepts any input order
        let mut shuffled = history.clone();
        shuffled.reverse();
        assert_eq!(replay(&catalog, &shuffled), state);
    }

    #[test]
    fn test_replay_grants_each_badge_once() {
        let catalog = build_default_catalog();
        let history: Vec<_> = (0..15).map(strength).collect();

        let state = replay(&catalog, &history);
        let mut ids = state.unlocked_badge_ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.unlocked_badge_ids.len());
        assert!(state.unlocked_badge_ids.contains(&"streak_7".to_string()));
    }
}
