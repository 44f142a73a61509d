//! Per-session points.
//!
//! `points = round(base(category) × weekly bonus × streak multiplier)`.
//! Rounding happens once, at the end, so values stay reproducible.

use crate::metrics::{strength_sessions_in_week, QUALIFYING_WEEK_SESSIONS};
use crate::{Category, SessionRecord};
use chrono::NaiveDate;

/// Multiplier applied while the weekly consistency bonus is active
pub const WEEKLY_BONUS_MULTIPLIER: f64 = 1.20;

/// Day-streak steps: (minimum streak days, multiplier), ascending
const STREAK_STEPS: &[(u32, f64)] = &[(7, 1.10), (30, 1.20), (100, 1.30), (365, 1.40)];

/// Base points awarded for a session of the given category
pub fn base_points(category: Category) -> u32 {
    match category {
        Category::Strength => 100,
        Category::Cardio => 80,
        Category::Yoga => 60,
        Category::Recovery => 40,
        Category::Unknown => 25,
    }
}

/// Monotonic step multiplier for the current day streak
///
/// 1.0 below 7 days, rising by 0.10 per step to 1.40 at 365 days.
pub fn streak_multiplier(streak_days: u32) -> f64 {
    STREAK_STEPS
        .iter()
        .rev()
        .find(|(min_days, _)| streak_days >= *min_days)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Points for one session
pub fn compute_session_points(
    category: Category,
    streak_days: u32,
    weekly_bonus_active: bool,
) -> u64 {
    let weekly = if weekly_bonus_active {
        WEEKLY_BONUS_MULTIPLIER
    } else {
        1.0
    };
    let raw = base_points(category) as f64 * weekly * streak_multiplier(streak_days);
    raw.round() as u64
}

/// Whether a session on `day` earns the weekly bonus
///
/// `earlier` must hold only sessions logged before the one being scored.
/// The bonus is active once that week already has enough strength sessions.
pub fn weekly_bonus_active(earlier: &[SessionRecord], day: NaiveDate) -> bool {
    strength_sessions_in_week(earlier, day) >= QUALIFYING_WEEK_SESSIONS
}
