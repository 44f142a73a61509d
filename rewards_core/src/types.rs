//! Core domain types for the rewards engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Session records as logged by the host
//! - Activity categories
//! - Badge definitions and their unlock conditions
//! - Persisted reward state

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Stable badge identifier (e.g. `"streak_7"`)
pub type BadgeId = String;

// ============================================================================
// Session Types
// ============================================================================

/// A single logged set within an exercise
///
/// Missing or negative values contribute nothing to volume.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<f64>,
}

impl SetEntry {
    pub fn new(weight: f64, reps: f64) -> Self {
        Self {
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    /// weight × reps, with malformed values counted as zero
    pub fn volume(&self) -> f64 {
        let weight = clamp_non_negative(self.weight);
        let reps = clamp_non_negative(self.reps);
        weight * reps
    }
}

fn clamp_non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// One completed activity, immutable once logged
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Local wall-clock time the session was performed
    pub date: NaiveDateTime,
    #[serde(default)]
    pub category_hint: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<BTreeMap<String, Vec<SetEntry>>>,
}

impl SessionRecord {
    /// Create a record with a category hint and no exercises
    pub fn new(date: NaiveDateTime, category_hint: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            category_hint: Some(category_hint.into()),
            duration_seconds: None,
            exercises: None,
        }
    }

    pub fn with_duration(mut self, duration_seconds: i64) -> Self {
        self.duration_seconds = Some(duration_seconds);
        self
    }

    /// Append sets for an exercise, creating the exercise map if needed
    pub fn with_sets(mut self, exercise: impl Into<String>, sets: Vec<SetEntry>) -> Self {
        self.exercises
            .get_or_insert_with(BTreeMap::new)
            .entry(exercise.into())
            .or_default()
            .extend(sets);
        self
    }

    /// Σ(weight × reps) across every set of every exercise
    pub fn volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|map| map.values())
            .flatten()
            .map(SetEntry::volume)
            .sum()
    }

    pub fn has_exercises(&self) -> bool {
        self.exercises
            .as_ref()
            .map(|map| !map.is_empty())
            .unwrap_or(false)
    }
}

/// Closed set of activity categories a session can classify into
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strength,
    Cardio,
    Yoga,
    Recovery,
    Unknown,
}

impl Category {
    /// Categories that count towards variety and time totals
    pub const KNOWN: [Category; 4] = [
        Category::Strength,
        Category::Cardio,
        Category::Yoga,
        Category::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Strength => "strength",
            Category::Cardio => "cardio",
            Category::Yoga => "yoga",
            Category::Recovery => "recovery",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Badge Types
// ============================================================================

/// Badge tier (display metadata only)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// One-off conditions that need a direct scan of history
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Session started before 07:00
    EarlyBird,
    /// Session started at or after 21:00
    NightOwl,
    /// Sessions on a Saturday and the Sunday right after it
    WeekendWarrior,
    /// Distinct known categories logged
    Variety,
    /// Two sessions started within an hour of each other
    BackToBack,
}

/// Badge unlock condition
///
/// Serialized with a `type` tag. Tags unknown to this build deserialize to
/// `Unrecognized` so a newer catalog never takes the whole evaluation down.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    SessionCount {
        threshold: u32,
    },
    StreakDays {
        threshold: u32,
    },
    PrCount {
        threshold: u32,
    },
    TotalVolume {
        threshold: f64,
    },
    TotalTimeSeconds {
        threshold: u64,
    },
    CategoryCount {
        category: Category,
        threshold: u32,
    },
    CategoryTimeSeconds {
        category: Category,
        threshold: u64,
    },
    SingleSessionVolume {
        threshold: f64,
    },
    WeeklyConsistencyStreak {
        weeks: u32,
    },
    Special {
        kind: SpecialKind,
        #[serde(default)]
        threshold: Option<u32>,
    },
    #[serde(other)]
    Unrecognized,
}

/// A static catalog entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub tier: Tier,
    pub condition: Condition,
    pub points_on_unlock: u64,
}

/// Ordered badge catalog; order is the order results are reported in
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pub badges: Vec<BadgeDefinition>,
}

// ============================================================================
// Reward State
// ============================================================================

/// Host-persisted reward state
///
/// The level is deliberately absent: it is always derived from
/// `total_points` via [`crate::level::compute_level`].
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RewardState {
    #[serde(default)]
    pub unlocked_badge_ids: Vec<BadgeId>,
    #[serde(default)]
    pub total_points: u64,
}
