//! Badge id migration between catalog versions.
//!
//! Older app versions used a different badge catalog. The legacy table maps
//! each retired id to its current equivalent, or to `None` when nothing in
//! the current catalog corresponds to it.

use crate::catalog::get_default_catalog;
use crate::{BadgeId, Catalog};
use std::collections::HashSet;

/// Retired badge ids and their replacements
pub static LEGACY_BADGE_IDS: &[(&str, Option<&str>)] = &[
    ("first_session", Some("first_workout")),
    ("ten_sessions", Some("sessions_10")),
    ("fifty_sessions", Some("sessions_50")),
    ("hundred_sessions", Some("sessions_100")),
    ("three_day_streak", Some("streak_3")),
    ("week_warrior", Some("streak_7")),
    ("month_master", Some("streak_30")),
    ("first_personal_record", Some("first_pr")),
    ("pr_hunter", Some("pr_10")),
    ("volume_king", Some("volume_100k")),
    ("iron_will", None),
    ("cardio_king", Some("cardio_50")),
    ("zen_master", Some("yoga_10")),
    ("consistency_king", Some("consistency_4w")),
    ("early_riser", Some("early_bird")),
    ("late_night", Some("night_owl")),
    ("social_butterfly", None),
    ("beta_tester", None),
];

fn legacy_target(id: &str) -> Option<Option<&'static str>> {
    LEGACY_BADGE_IDS
        .iter()
        .find(|(old, _)| *old == id)
        .map(|(_, new)| *new)
}

/// Outcome of migrating a stored id list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Migration {
    /// Ids valid in the current catalog, de-duplicated in first-seen order
    pub ids: Vec<BadgeId>,
    /// Retired or unknown ids with no current equivalent, each listed once
    pub dropped: Vec<BadgeId>,
}

/// Translate stored badge ids to the current catalog, reporting what was lost
///
/// Current ids pass through, legacy ids are mapped (or dropped when they have
/// no equivalent), and anything else is dropped. Duplicates collapse without
/// counting as dropped.
pub fn migrate_badge_ids_report(catalog: &Catalog, old_ids: &[BadgeId]) -> Migration {
    let mut seen = HashSet::new();
    let mut migration = Migration::default();

    for id in old_ids {
        let target = if catalog.contains(id) {
            Some(id.as_str())
        } else {
            match legacy_target(id) {
                Some(Some(new_id)) => {
                    tracing::debug!("Migrating badge '{}' -> '{}'", id, new_id);
                    Some(new_id)
                }
                Some(None) => {
                    tracing::debug!("Dropping retired badge '{}'", id);
                    None
                }
                None => {
                    tracing::debug!("Dropping unknown badge '{}'", id);
                    None
                }
            }
        };

        match target {
            Some(target) => {
                if seen.insert(target.to_string()) {
                    migration.ids.push(target.to_string());
                }
            }
            None => {
                if !migration.dropped.contains(id) {
                    migration.dropped.push(id.clone());
                }
            }
        }
    }

    migration
}

/// Translate stored badge ids to the current catalog
///
/// The result is de-duplicated in first-seen order. Applying it twice gives
/// the same result as once.
pub fn migrate_badge_ids_with(catalog: &Catalog, old_ids: &[BadgeId]) -> Vec<BadgeId> {
    migrate_badge_ids_report(catalog, old_ids).ids
}

/// [`migrate_badge_ids_with`] against the built-in catalog
pub fn migrate_badge_ids(old_ids: &[BadgeId]) -> Vec<BadgeId> {
    migrate_badge_ids_with(get_default_catalog(), old_ids)
}
