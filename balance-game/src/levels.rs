//! Static level table.
use serde::Serialize;

/// One difficulty tier: the amount range drawn for instructions, the streak
/// needed to enter it, and the base points per correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelDefinition {
    pub index: usize,
    pub display_name: &'static str,
    pub number_range: (u32, u32),
    pub streak_required_to_enter: u32,
    pub points_per_correct_answer: u32,
}

impl LevelDefinition {
    /// 1-based number shown to players.
    #[must_use]
    pub const fn display_number(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub const fn min_amount(&self) -> u32 {
        self.number_range.0
    }

    #[must_use]
    pub const fn max_amount(&self) -> u32 {
        self.number_range.1
    }
}

pub const LEVELS: [LevelDefinition; 6] = [
    LevelDefinition {
        index: 0,
        display_name: "Anfänger",
        number_range: (1, 5),
        streak_required_to_enter: 0,
        points_per_correct_answer: 10,
    },
    LevelDefinition {
        index: 1,
        display_name: "Entdecker",
        number_range: (1, 8),
        streak_required_to_enter: 3,
        points_per_correct_answer: 15,
    },
    LevelDefinition {
        index: 2,
        display_name: "Lernender",
        number_range: (1, 12),
        streak_required_to_enter: 6,
        points_per_correct_answer: 20,
    },
    LevelDefinition {
        index: 3,
        display_name: "Fortgeschr.",
        number_range: (1, 15),
        streak_required_to_enter: 10,
        points_per_correct_answer: 25,
    },
    LevelDefinition {
        index: 4,
        display_name: "Profi",
        number_range: (1, 20),
        streak_required_to_enter: 15,
        points_per_correct_answer: 35,
    },
    LevelDefinition {
        index: 5,
        display_name: "Meister",
        number_range: (1, 25),
        streak_required_to_enter: 22,
        points_per_correct_answer: 50,
    },
];

pub const MAX_LEVEL_INDEX: usize = LEVELS.len() - 1;

/// Resolve a level index, clamping anything outside the table to level 0.
#[must_use]
pub fn level(index: usize) -> &'static LevelDefinition {
    LEVELS.get(index).unwrap_or(&LEVELS[0])
}

/// Whether `index` names a level in the table.
#[must_use]
pub const fn is_valid_level(index: usize) -> bool {
    index < LEVELS.len()
}
