//! Mutable session aggregate and the transitions applied to it.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::achievements::{AchievementRule, AchievementStats, evaluate_achievements};
use crate::computer::ComputerMove;
use crate::instruction::Instruction;
use crate::numbers::percent_of;
use crate::progression::{LevelProgress, level_for_streak, level_progress};
use crate::save::PersistedSave;
use crate::score::points_for_correct;

/// Whose move it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    #[default]
    User,
    Computer,
}

/// Everything one game session tracks. Owned by the session; mutated only
/// through the `apply_*` methods below.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub user_balance: i64,
    pub computer_balance: i64,
    pub active_turn: Turn,
    pub active_instruction: Option<Instruction>,
    pub current_level_index: usize,
    pub current_streak: u32,
    pub max_streak_ever: u32,
    pub score: u32,
    pub max_level_ever_reached: usize,
    pub total_correct_answers: u32,
    pub total_attempts: u32,
    pub double_negative_correct_count: u32,
    pub unlocked_achievement_ids: BTreeSet<String>,
    pub turn_counter: u32,
}

/// What a correct answer changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectAnswer {
    pub points: u32,
    pub previous_level_index: usize,
    pub level_index: usize,
    pub leveled_up: bool,
    pub newly_unlocked: Vec<&'static AchievementRule>,
}

impl GameState {
    /// Fresh state carrying cross-session progress from a save.
    #[must_use]
    pub fn restored(save: &PersistedSave) -> Self {
        Self {
            max_streak_ever: save.max_streak_ever,
            max_level_ever_reached: save.max_level_ever_reached,
            double_negative_correct_count: save.double_negative_correct_count,
            unlocked_achievement_ids: save.unlocked_achievement_ids.iter().cloned().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn achievement_stats(&self) -> AchievementStats {
        AchievementStats {
            total_correct: self.total_correct_answers,
            max_streak: self.max_streak_ever,
            double_negative_correct: self.double_negative_correct_count,
            max_level_display: self.max_level_ever_reached + 1,
            score: self.score,
        }
    }

    #[must_use]
    pub fn progress(&self) -> LevelProgress {
        level_progress(self.current_streak, self.current_level_index)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        percent_of(
            i64::from(self.total_correct_answers),
            i64::from(self.total_attempts),
        )
    }

    /// Apply a correct answer to `instruction`. Points use the level the
    /// instruction was asked at and the streak including this answer.
    pub fn apply_correct(&mut self, instruction: &Instruction) -> CorrectAnswer {
        self.current_streak = self.current_streak.saturating_add(1);
        self.total_correct_answers = self.total_correct_answers.saturating_add(1);
        self.total_attempts = self.total_attempts.saturating_add(1);
        if instruction.is_double_negative {
            self.double_negative_correct_count =
                self.double_negative_correct_count.saturating_add(1);
        }
        self.max_streak_ever = self.max_streak_ever.max(self.current_streak);

        let points = points_for_correct(self.current_level_index, self.current_streak);
        self.score = self.score.saturating_add(points);

        let previous_level_index = self.current_level_index;
        self.current_level_index = level_for_streak(self.current_streak);
        self.max_level_ever_reached = self.max_level_ever_reached.max(self.current_level_index);
        self.user_balance = instruction.resulting_balance;

        let newly_unlocked =
            evaluate_achievements(&self.achievement_stats(), &mut self.unlocked_achievement_ids);

        CorrectAnswer {
            points,
            previous_level_index,
            level_index: self.current_level_index,
            leveled_up: self.current_level_index > previous_level_index,
            newly_unlocked,
        }
    }

    /// Apply a wrong (or timed-out) answer: the streak and level reset, only
    /// the attempt counter moves.
    pub fn apply_incorrect(&mut self) {
        self.current_streak = 0;
        self.total_attempts = self.total_attempts.saturating_add(1);
        self.current_level_index = level_for_streak(0);
    }

    pub fn apply_computer_move(&mut self, mv: &ComputerMove) {
        self.computer_balance = mv.new_computer_balance;
    }
}
