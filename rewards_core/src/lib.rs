#![forbid(unsafe_code)]

//! Rewards engine: badges, points, and levels from a workout history.
//!
//! This crate provides:
//! - Domain types (sessions, categories, badge conditions, reward state)
//! - Session classification and aggregate metrics
//! - Badge catalog, condition evaluation, and unlock resolution
//! - Points and level calculation
//! - Badge id migration between catalog versions
//! - Host adapters (journal, state store, config, logging)
//!
//! The engine modules are pure: they take a history snapshot and an explicit
//! "as of" date and never read the clock or the filesystem.

pub mod types;
pub mod error;
pub mod classifier;
pub mod metrics;
pub mod catalog;
pub mod evaluator;
pub mod resolver;
pub mod points;
pub mod level;
pub mod migration;
pub mod engine;
pub mod config;
pub mod logging;
pub mod journal;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use classifier::{classify, classify_record};
pub use metrics::AggregateMetrics;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use evaluator::{evaluate, progress, ConditionProgress};
pub use resolver::{resolve_unlocks, unlocked_badges, ResolveMode};
pub use points::{compute_session_points, streak_multiplier};
pub use level::{compute_level, LevelInfo};
pub use migration::{migrate_badge_ids, migrate_badge_ids_report, Migration};
pub use engine::{apply_session, backfill, replay, BackfillOutcome, SessionOutcome};
pub use config::Config;
pub use journal::{JsonlJournal, SessionJournal};
