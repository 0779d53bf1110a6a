//! Streak-driven level progression.
use serde::{Deserialize, Serialize};

use crate::levels::{LEVELS, MAX_LEVEL_INDEX, level};
use crate::numbers::percent_of;

/// Progress through the current level's streak band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub percent: u8,
    pub current: i64,
    pub target: i64,
    pub at_max: bool,
}

/// Highest level index whose entry threshold the streak satisfies.
#[must_use]
pub fn level_for_streak(streak: u32) -> usize {
    LEVELS
        .iter()
        .rposition(|def| streak >= def.streak_required_to_enter)
        .unwrap_or(0)
}

/// Progress toward the next level. The last level always reports 100%.
#[must_use]
pub fn level_progress(streak: u32, level_index: usize) -> LevelProgress {
    if level_index >= MAX_LEVEL_INDEX {
        return LevelProgress {
            percent: 100,
            current: i64::from(streak),
            target: i64::from(streak),
            at_max: true,
        };
    }
    let this_level = level(level_index);
    let next_level = level(level_index + 1);
    let current = i64::from(streak) - i64::from(this_level.streak_required_to_enter);
    let target = i64::from(next_level.streak_required_to_enter)
        - i64::from(this_level.streak_required_to_enter);
    LevelProgress {
        percent: percent_of(current, target),
        current,
        target,
        at_max: false,
    }
}
