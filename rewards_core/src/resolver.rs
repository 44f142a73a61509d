//! Unlock set resolution.
//!
//! Works out which badges are unlocked for a history and which of those are
//! new relative to the host's stored set. Two modes:
//!
//! - **Incremental**: after a session is logged. Progressive badges that were
//!   already satisfied before the latest session are suppressed, so a stale
//!   stored set cannot make an old milestone look new.
//! - **Retroactive**: backfill after a reinstall or migration. Every earned
//!   badge not yet granted is returned, with no "before" guard.

use crate::evaluator::{evaluate, is_progressive};
use crate::metrics::{latest_session_index, resolve_as_of, AggregateMetrics};
use crate::{BadgeDefinition, BadgeId, Catalog, SessionRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// How newly unlocked badges are determined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    #[default]
    Incremental,
    Retroactive,
}

impl std::str::FromStr for ResolveMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "incremental" => Ok(ResolveMode::Incremental),
            "retroactive" => Ok(ResolveMode::Retroactive),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown resolve mode '{}'",
                other
            ))),
        }
    }
}

/// Sessions visible as of `as_of`, borrowed when nothing is filtered out
fn visible_history(history: &[SessionRecord], as_of: NaiveDate) -> Cow<'_, [SessionRecord]> {
    if history.iter().all(|r| r.date.date() <= as_of) {
        Cow::Borrowed(history)
    } else {
        Cow::Owned(
            history
                .iter()
                .filter(|r| r.date.date() <= as_of)
                .cloned()
                .collect(),
        )
    }
}

/// History minus its latest session (ties go to the last one in input order)
fn without_latest(history: &[SessionRecord]) -> Vec<SessionRecord> {
    let latest = latest_session_index(history);

    history
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != latest)
        .map(|(_, r)| r.clone())
        .collect()
}

/// Every badge currently unlocked by `history`, in catalog order
pub fn unlocked_badges<'c>(
    catalog: &'c Catalog,
    history: &[SessionRecord],
    as_of: Option<NaiveDate>,
) -> Vec<&'c BadgeDefinition> {
    let as_of = resolve_as_of(history, as_of);
    let visible = visible_history(history, as_of);
    let metrics = AggregateMetrics::compute(&visible, as_of);

    catalog
        .badges
        .iter()
        .filter(|b| evaluate(&b.condition, &metrics, &visible))
        .collect()
}

/// Badges newly unlocked relative to `previously_unlocked`, in catalog order
///
/// The inputs are never modified. Calling again with `previously_unlocked`
/// extended by the result returns an empty list.
pub fn resolve_unlocks<'c>(
    catalog: &'c Catalog,
    history: &[SessionRecord],
    previously_unlocked: &[BadgeId],
    mode: ResolveMode,
    as_of: Option<NaiveDate>,
) -> Vec<&'c BadgeDefinition> {
    let as_of = resolve_as_of(history, as_of);
    let visible = visible_history(history, as_of);
    if visible.is_empty() {
        return Vec::new();
    }

    let granted: HashSet<&str> = previously_unlocked.iter().map(String::as_str).collect();
    let metrics = AggregateMetrics::compute(&visible, as_of);

    let before = match mode {
        ResolveMode::Incremental => {
            let prior = without_latest(&visible);
            let prior_metrics = AggregateMetrics::compute(&prior, as_of);
            Some((prior, prior_metrics))
        }
        ResolveMode::Retroactive => None,
    };

    let newly: Vec<&BadgeDefinition> = catalog
        .badges
        .iter()
        .filter(|b| !granted.contains(b.id.as_str()))
        .filter(|b| evaluate(&b.condition, &metrics, &visible))
        .filter(|b| match &before {
            Some((prior, prior_metrics)) if is_progressive(&b.condition) => {
                let already = evaluate(&b.condition, prior_metrics, prior);
                if already {
                    tracing::debug!(
                        "Badge '{}' was already earned before the latest session; not reporting",
                        b.id
                    );
                }
                !already
            }
            _ => true,
        })
        .collect();

    for badge in &newly {
        tracing::info!("Badge unlocked ({:?}): {}", mode, badge.id);
    }

    newly
}
