//! Points awarded per correct answer.
use crate::constants::{STREAK_BONUS_PER_MILESTONE, STREAK_MILESTONE};
use crate::levels::level;

/// Base points of the level plus a bonus for every completed block of five
/// consecutive correct answers.
#[must_use]
pub fn points_for_correct(level_index: usize, streak: u32) -> u32 {
    let milestones = streak / STREAK_MILESTONE;
    level(level_index)
        .points_per_correct_answer
        .saturating_add(milestones.saturating_mul(STREAK_BONUS_PER_MILESTONE))
}

/// Whether `streak` just hit a bonus milestone.
#[must_use]
pub const fn is_streak_milestone(streak: u32) -> bool {
    streak > 0 && streak % STREAK_MILESTONE == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_points_plus_milestone_bonus() {
        assert_eq!(points_for_correct(0, 0), 10);
        assert_eq!(points_for_correct(0, 4), 10);
        assert_eq!(points_for_correct(0, 5), 15);
        assert_eq!(points_for_correct(0, 12), 20);
        assert_eq!(points_for_correct(5, 22), 70);
    }

    #[test]
    fn bonus_is_monotonic_in_streak() {
        let mut last = 0;
        for streak in 0..100 {
            let pts = points_for_correct(2, streak);
            assert!(pts >= last);
            last = pts;
        }
    }

    #[test]
    fn milestones_every_fifth_streak() {
        assert!(!is_streak_milestone(0));
        assert!(is_streak_milestone(5));
        assert!(!is_streak_milestone(6));
        assert!(is_streak_milestone(10));
    }
}
