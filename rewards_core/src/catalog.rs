//! Built-in badge catalog.
//!
//! The catalog is ordered data: results are always reported in catalog
//! order. Ids are stable; removing or renaming one needs an entry in
//! [`crate::migration`].

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Flat bonus granted once when any built-in badge unlocks
pub const BADGE_UNLOCK_POINTS: u64 = 50;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn badge(
    id: &str,
    name: &str,
    description: &str,
    tier: Tier,
    condition: Condition,
) -> BadgeDefinition {
    BadgeDefinition {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        tier,
        condition,
        points_on_unlock: BADGE_UNLOCK_POINTS,
    }
}

/// Builds the default badge catalog
///
/// **Note**: prefer `get_default_catalog()` which returns a cached reference.
pub fn build_default_catalog() -> Catalog {
    use Category::*;
    use Condition::*;
    use Tier::*;

    let badges = vec![
        // ====================================================================
        // Session milestones
        // ====================================================================
        badge(
            "first_workout",
            "First Step",
            "Log your first session.",
            Bronze,
            SessionCount { threshold: 1 },
        ),
        badge(
            "sessions_10",
            "Getting Started",
            "Log 10 sessions.",
            Bronze,
            SessionCount { threshold: 10 },
        ),
        badge(
            "sessions_50",
            "Regular",
            "Log 50 sessions.",
            Silver,
            SessionCount { threshold: 50 },
        ),
        badge(
            "sessions_100",
            "Centurion",
            "Log 100 sessions.",
            Gold,
            SessionCount { threshold: 100 },
        ),
        badge(
            "sessions_250",
            "Devoted",
            "Log 250 sessions.",
            Gold,
            SessionCount { threshold: 250 },
        ),
        badge(
            "sessions_500",
            "Lifer",
            "Log 500 sessions.",
            Platinum,
            SessionCount { threshold: 500 },
        ),
        // ====================================================================
        // Day streaks
        // ====================================================================
        badge(
            "streak_3",
            "Warming Up",
            "Train 3 days in a row.",
            Bronze,
            StreakDays { threshold: 3 },
        ),
        badge(
            "streak_7",
            "Week Warrior",
            "Train 7 days in a row.",
            Silver,
            StreakDays { threshold: 7 },
        ),
        badge(
            "streak_30",
            "Monthly Grind",
            "Train 30 days in a row.",
            Gold,
            StreakDays { threshold: 30 },
        ),
        badge(
            "streak_100",
            "Unbreakable",
            "Train 100 days in a row.",
            Platinum,
            StreakDays { threshold: 100 },
        ),
        badge(
            "streak_365",
            "Year of Iron",
            "Train every day for a year.",
            Platinum,
            StreakDays { threshold: 365 },
        ),
        // ====================================================================
        // Personal records
        // ====================================================================
        badge(
            "first_pr",
            "New Heights",
            "Set your first personal record.",
            Bronze,
            PrCount { threshold: 1 },
        ),
        badge(
            "pr_10",
            "Record Breaker",
            "Set 10 personal records.",
            Silver,
            PrCount { threshold: 10 },
        ),
        badge(
            "pr_50",
            "Limitless",
            "Set 50 personal records.",
            Gold,
            PrCount { threshold: 50 },
        ),
        // ====================================================================
        // Volume
        // ====================================================================
        badge(
            "volume_10k",
            "Heavy Lifter",
            "Lift 10,000 total volume.",
            Bronze,
            TotalVolume { threshold: 10_000.0 },
        ),
        badge(
            "volume_100k",
            "Iron Mover",
            "Lift 100,000 total volume.",
            Silver,
            TotalVolume { threshold: 100_000.0 },
        ),
        badge(
            "volume_1m",
            "Million Club",
            "Lift 1,000,000 total volume.",
            Platinum,
            TotalVolume { threshold: 1_000_000.0 },
        ),
        badge(
            "heavy_session_5k",
            "Big Day",
            "Lift 5,000 volume in one session.",
            Silver,
            SingleSessionVolume { threshold: 5_000.0 },
        ),
        badge(
            "heavy_session_10k",
            "Monster Session",
            "Lift 10,000 volume in one session.",
            Gold,
            SingleSessionVolume { threshold: 10_000.0 },
        ),
        // ====================================================================
        // Time
        // ====================================================================
        badge(
            "time_10h",
            "Ten Hours In",
            "Train for 10 hours in total.",
            Bronze,
            TotalTimeSeconds { threshold: 36_000 },
        ),
        badge(
            "time_100h",
            "Hundred Hours",
            "Train for 100 hours in total.",
            Gold,
            TotalTimeSeconds { threshold: 360_000 },
        ),
        badge(
            "cardio_time_10h",
            "Engine Builder",
            "Spend 10 hours on cardio.",
            Silver,
            CategoryTimeSeconds { category: Cardio, threshold: 36_000 },
        ),
        badge(
            "yoga_time_5h",
            "Deep Stretch",
            "Spend 5 hours on yoga and mobility.",
            Silver,
            CategoryTimeSeconds { category: Yoga, threshold: 18_000 },
        ),
        // ====================================================================
        // Categories
        // ====================================================================
        badge(
            "strength_10",
            "Strength Starter",
            "Log 10 strength sessions.",
            Bronze,
            CategoryCount { category: Strength, threshold: 10 },
        ),
        badge(
            "strength_50",
            "Strength Devotee",
            "Log 50 strength sessions.",
            Silver,
            CategoryCount { category: Strength, threshold: 50 },
        ),
        badge(
            "cardio_10",
            "Cardio Starter",
            "Log 10 cardio sessions.",
            Bronze,
            CategoryCount { category: Cardio, threshold: 10 },
        ),
        badge(
            "cardio_50",
            "Cardio Devotee",
            "Log 50 cardio sessions.",
            Silver,
            CategoryCount { category: Cardio, threshold: 50 },
        ),
        badge(
            "yoga_10",
            "Flow State",
            "Log 10 yoga or mobility sessions.",
            Bronze,
            CategoryCount { category: Yoga, threshold: 10 },
        ),
        badge(
            "recovery_10",
            "Rest Is Training",
            "Log 10 recovery sessions.",
            Bronze,
            CategoryCount { category: Recovery, threshold: 10 },
        ),
        // ====================================================================
        // Weekly consistency
        // ====================================================================
        badge(
            "consistency_4w",
            "Consistent",
            "Hit 3+ strength sessions for 4 straight weeks.",
            Silver,
            WeeklyConsistencyStreak { weeks: 4 },
        ),
        badge(
            "consistency_12w",
            "Habit Formed",
            "Hit 3+ strength sessions for 12 straight weeks.",
            Gold,
            WeeklyConsistencyStreak { weeks: 12 },
        ),
        badge(
            "consistency_26w",
            "Half-Year Hero",
            "Hit 3+ strength sessions for 26 straight weeks.",
            Platinum,
            WeeklyConsistencyStreak { weeks: 26 },
        ),
        // ====================================================================
        // Specials
        // ====================================================================
        badge(
            "early_bird",
            "Early Bird",
            "Start a session before 7am.",
            Bronze,
            Special { kind: SpecialKind::EarlyBird, threshold: None },
        ),
        badge(
            "night_owl",
            "Night Owl",
            "Start a session at 9pm or later.",
            Bronze,
            Special { kind: SpecialKind::NightOwl, threshold: None },
        ),
        badge(
            "weekend_warrior",
            "Weekend Warrior",
            "Train on both days of a weekend.",
            Bronze,
            Special { kind: SpecialKind::WeekendWarrior, threshold: None },
        ),
        badge(
            "well_rounded",
            "Well Rounded",
            "Log strength, cardio, yoga, and recovery sessions.",
            Silver,
            Special { kind: SpecialKind::Variety, threshold: Some(4) },
        ),
        badge(
            "back_to_back",
            "Double Header",
            "Start two sessions within an hour.",
            Bronze,
            Special { kind: SpecialKind::BackToBack, threshold: None },
        ),
    ];

    Catalog { badges }
}

impl Catalog {
    /// Parse a host-supplied catalog from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, id: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for badge in &self.badges {
            if badge.id.is_empty() {
                errors.push("Badge has empty ID".to_string());
            }
            if !seen.insert(badge.id.as_str()) {
                errors.push(format!("Duplicate badge ID '{}'", badge.id));
            }
            if badge.name.is_empty() {
                errors.push(format!("Badge '{}' has empty name", badge.id));
            }

            match &badge.condition {
                Condition::SessionCount { threshold }
                | Condition::StreakDays { threshold }
                | Condition::PrCount { threshold }
                | Condition::CategoryCount { threshold, .. } => {
                    if *threshold == 0 {
                        errors.push(format!("Badge '{}' has zero threshold", badge.id));
                    }
                }
                Condition::TotalTimeSeconds { threshold }
                | Condition::CategoryTimeSeconds { threshold, .. } => {
                    if *threshold == 0 {
                        errors.push(format!("Badge '{}' has zero threshold", badge.id));
                    }
                }
                Condition::TotalVolume { threshold }
                | Condition::SingleSessionVolume { threshold } => {
                    if !threshold.is_finite() || *threshold <= 0.0 {
                        errors.push(format!(
                            "Badge '{}' has invalid volume threshold {}",
                            badge.id, threshold
                        ));
                    }
                }
                Condition::WeeklyConsistencyStreak { weeks } => {
                    if *weeks == 0 {
                        errors.push(format!("Badge '{}' has zero week count", badge.id));
                    }
                }
                Condition::Special { threshold, .. } => {
                    if *threshold == Some(0) {
                        errors.push(format!("Badge '{}' has zero threshold", badge.id));
                    }
                }
                Condition::Unrecognized => {
                    errors.push(format!(
                        "Badge '{}' has a condition type this build does not understand",
                        badge.id
                    ));
                }
            }

            if let Condition::CategoryCount { category, .. }
            | Condition::CategoryTimeSeconds { category, .. } = &badge.condition
            {
                if *category == Category::Unknown {
                    errors.push(format!(
                        "Badge '{}' targets the unknown category",
                        badge.id
                    ));
                }
            }
        }

        errors
    }
}
