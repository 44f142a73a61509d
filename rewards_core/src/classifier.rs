//! Session classification.
//!
//! Maps the free-form type string a session was logged with onto the closed
//! [`Category`] set. Upstream producers disagree on naming, so each category
//! accepts a fixed list of aliases.

use crate::{Category, SessionRecord};

const STRENGTH_HINTS: &[&str] = &[
    "strength",
    "weights",
    "weightlifting",
    "weight_training",
    "weight training",
    "lifting",
    "resistance",
    "powerlifting",
    "bodybuilding",
    "gym",
];

const CARDIO_HINTS: &[&str] = &[
    "cardio",
    "run",
    "running",
    "jog",
    "jogging",
    "walk",
    "walking",
    "cycling",
    "bike",
    "swim",
    "swimming",
    "rowing",
    "hiit",
    "elliptical",
];

const YOGA_HINTS: &[&str] = &[
    "yoga",
    "mobility",
    "stretch",
    "stretching",
    "flexibility",
    "pilates",
];

const RECOVERY_HINTS: &[&str] = &[
    "recovery",
    "rest",
    "rest day",
    "rest_day",
    "meditation",
    "breathwork",
    "foam rolling",
    "foam_rolling",
    "massage",
    "sauna",
];

/// Classify a hint string (case-insensitive, surrounding whitespace ignored)
///
/// Empty or unmapped hints are [`Category::Unknown`].
pub fn classify(hint: &str) -> Category {
    let normalized = hint.trim().to_lowercase();
    let hint = normalized.as_str();

    if STRENGTH_HINTS.contains(&hint) {
        Category::Strength
    } else if CARDIO_HINTS.contains(&hint) {
        Category::Cardio
    } else if YOGA_HINTS.contains(&hint) {
        Category::Yoga
    } else if RECOVERY_HINTS.contains(&hint) {
        Category::Recovery
    } else {
        Category::Unknown
    }
}

/// Classify a full record
///
/// Records logged before hints existed carry no hint at all; those count as
/// strength when they list exercises. A present-but-unmapped hint never falls
/// back to strength.
pub fn classify_record(record: &SessionRecord) -> Category {
    match record.category_hint.as_deref() {
        Some(hint) => classify(hint),
        None if record.has_exercises() => Category::Strength,
        None => Category::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetEntry;
    use chrono::NaiveDate;

    fn record(hint: Option<&str>) -> SessionRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        SessionRecord {
            id: None,
            date,
            category_hint: hint.map(String::from),
            duration_seconds: None,
            exercises: None,
        }
    }

    #[test]
    fn test_classify_known_hints() {
        assert_eq!(classify("strength"), Category::Strength);
        assert_eq!(classify("running"), Category::Cardio);
        assert_eq!(classify("yoga"), Category::Yoga);
        assert_eq!(classify("mobility"), Category::Yoga);
        assert_eq!(classify("recovery"), Category::Recovery);
        assert_eq!(classify("rest day"), Category::Recovery);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("STRENGTH"), Category::Strength);
        assert_eq!(classify("  Cardio "), Category::Cardio);
        assert_eq!(classify("YoGa"), Category::Yoga);
    }

    #[test]
    fn test_classify_empty_and_unmapped() {
        assert_eq!(classify(""), Category::Unknown);
        assert_eq!(classify("   "), Category::Unknown);
        assert_eq!(classify("underwater basket weaving"), Category::Unknown);
    }

    #[test]
    fn test_legacy_record_with_exercises_is_strength() {
        let legacy = record(None).with_sets("squat", vec![SetEntry::new(60.0, 5.0)]);
        assert_eq!(classify_record(&legacy), Category::Strength);
    }

    #[test]
    fn test_legacy_record_without_exercises_is_unknown() {
        assert_eq!(classify_record(&record(None)), Category::Unknown);
    }

    #[test]
    fn test_unmapped_hint_does_not_fall_back_to_strength() {
        let tagged = record(Some("")).with_sets("squat", vec![SetEntry::new(60.0, 5.0)]);
        assert_eq!(classify_record(&tagged), Category::Unknown);
    }
}
