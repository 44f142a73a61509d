//! Level calculation.
//!
//! A level is always derived from the points total and never stored, so a
//! persisted level can never disagree with the table.

use serde::Serialize;

/// Points required to reach level `index + 1`
pub static LEVEL_THRESHOLDS: &[u64] = &[
    0, 100, 250, 500, 1_000, 1_750, 2_750, 4_000, 5_500, 7_500, 10_000,
];

/// Extra points per level past the end of the table
pub const EXTRAPOLATED_LEVEL_INCREMENT: u64 = 2_500;

/// Level breakdown for a points total
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    /// Points earned since reaching `level`
    pub current_level_points: u64,
    pub points_to_next_level: u64,
}

impl LevelInfo {
    /// Progress through the current level (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        let span = self.current_level_points + self.points_to_next_level;
        if span == 0 {
            1.0
        } else {
            self.current_level_points as f64 / span as f64
        }
    }
}

/// Points needed to reach `level` (level 1 needs 0)
pub fn level_threshold(level: u32) -> u64 {
    let index = level.saturating_sub(1) as usize;
    match LEVEL_THRESHOLDS.get(index) {
        Some(points) => *points,
        None => {
            let last_index = LEVEL_THRESHOLDS.len() - 1;
            let beyond = (index - last_index) as u64;
            LEVEL_THRESHOLDS[last_index]
                .saturating_add(beyond.saturating_mul(EXTRAPOLATED_LEVEL_INCREMENT))
        }
    }
}

/// The unique level `L` with `threshold(L) <= points < threshold(L + 1)`
pub fn level_for_points(points: u64) -> u32 {
    let last_index = LEVEL_THRESHOLDS.len() - 1;
    let last = LEVEL_THRESHOLDS[last_index];

    if points >= last {
        let beyond = (points - last) / EXTRAPOLATED_LEVEL_INCREMENT;
        let level = last_index as u64 + 1 + beyond;
        return u32::try_from(level).unwrap_or(u32::MAX);
    }

    LEVEL_THRESHOLDS
        .iter()
        .rposition(|threshold| points >= *threshold)
        .map(|index| index as u32 + 1)
        .unwrap_or(1)
}

/// Level, progress within it, and distance to the next one
pub fn compute_level(total_points: u64) -> LevelInfo {
    let level = level_for_points(total_points);
    let floor = level_threshold(level);
    let next = level_threshold(level.saturating_add(1));

    LevelInfo {
        level,
        current_level_points: total_points - floor,
        points_to_next_level: next.saturating_sub(total_points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_points() {
        assert_eq!(
            compute_level(0),
            LevelInfo {
                level: 1,
                current_level_points: 0,
                points_to_next_level: LEVEL_THRESHOLDS[1],
            }
        );
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(249), 2);
        assert_eq!(level_for_points(250), 3);
        assert_eq!(level_for_points(9_999), 10);
        assert_eq!(level_for_points(10_000), 11);
    }

    #[test]
    fn test_level_extrapolates_past_table() {
        assert_eq!(level_for_points(12_499), 11);
        assert_eq!(level_for_points(12_500), 12);
        assert_eq!(level_threshold(12), 12_500);
        assert_eq!(level_threshold(13), 15_000);

        let info = compute_level(13_000);
        assert_eq!(info.level, 12);
        assert_eq!(info.current_level_points, 500);
        assert_eq!(info.points_to_next_level, 2_000);
    }

    #[test]
    fn test_level_matches_threshold_definition() {
        for points in (0..40_000).step_by(37) {
            let level = level_for_points(points);
            assert!(level_threshold(level) <= points);
            assert!(points < level_threshold(level + 1));
        }
    }

    #[test]
    fn test_level_monotonic() {
        let mut previous = level_for_points(0);
        for points in 1..30_000 {
            let level = level_for_points(points);
            assert!(level >= previous, "level dropped at {} points", points);
            previous = level;
        }
    }

    #[test]
    fn test_compute_level_is_pure() {
        assert_eq!(compute_level(4_321), compute_level(4_321));
    }

    #[test]
    fn test_huge_totals_do_not_panic() {
        let info = compute_level(u64::MAX);
        assert!(info.level > 11);
    }

    #[test]
    fn test_progress_fraction() {
        let info = compute_level(175);
        assert_eq!(info.level, 2);
        assert_eq!(info.progress(), 0.5);
    }
}
