//! Balance Game Engine
//!
//! Platform-agnostic core of a signed-number arithmetic trainer: the player
//! takes or gives positive and negative tickets, writes the matching
//! expression and the new balance, and plays turns against a computer
//! opponent. This crate holds the rules, progression, scoring, achievements
//! and persistence without any rendering or platform dependencies.

pub mod achievements;
pub mod computer;
pub mod constants;
pub mod expr;
pub mod feedback;
pub mod hint;
pub mod instruction;
pub mod levels;
pub mod numbers;
pub mod progression;
pub mod save;
pub mod score;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod teacher;
pub mod validate;

// Re-export commonly used types
pub use achievements::{
    ACHIEVEMENTS, AchievementRule, AchievementStats, UnlockCondition, evaluate_achievements,
    find_achievement,
};
pub use computer::{ComputerMove, computer_turn, computer_turn_in_range};
pub use expr::{ExprError, evaluate};
pub use feedback::{Cue, CueLog, FeedbackSink, Silent};
pub use hint::Hint;
pub use instruction::{
    Action, Instruction, Ticket, format_signed, generate_in_range, generate_instruction,
};
pub use levels::{LEVELS, LevelDefinition, MAX_LEVEL_INDEX, is_valid_level, level};
pub use progression::{LevelProgress, level_for_streak, level_progress};
pub use save::{PersistedSave, SaveRepository};
pub use score::{is_streak_milestone, points_for_correct};
pub use session::{GameSession, NewGameReport, RoundPhase, RoundReport, Scoreboard, Transition};
pub use state::{CorrectAnswer, GameState, Turn};
pub use stats::{
    OperationKey, OperationTally, SessionRecord, SessionSummary, StatsLedger, StatsRecorder,
};
pub use storage::{FileStorage, MemoryStorage, StorageError};
pub use teacher::{
    CheatSheet, TeacherConfigError, TeacherSettings, TeacherUnlock, TimerTick, TurnTimer,
    unlock_phrase_matches,
};
pub use validate::{InputError, ValidationResult, validate_answer};

/// Trait for abstracting string blob storage by key.
/// Platform-specific implementations should provide this
pub trait KeyValueStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the blob stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous blob
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete the blob under `key`; deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Unplugged;

    impl fmt::Display for Unplugged {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("storage unplugged")
        }
    }

    impl std::error::Error for Unplugged {}

    /// Backend that fails every call.
    #[derive(Debug, Clone, Copy, Default)]
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        type Error = Unplugged;

        fn read(&self, _key: &str) -> Result<Option<String>, Self::Error> {
            Err(Unplugged)
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
            Err(Unplugged)
        }

        fn remove(&self, _key: &str) -> Result<(), Self::Error> {
            Err(Unplugged)
        }
    }

    #[test]
    fn broken_storage_never_interrupts_play() {
        let mut session = GameSession::with_seed(BrokenStorage, 99);
        let instr = session.active_instruction().cloned().unwrap();
        let report = session
            .submit(
                &instr.canonical_expression,
                &instr.resulting_balance.to_string(),
            )
            .unwrap();
        assert!(report.correct);
        assert!(!report.new_high_score);
        assert!(matches!(session.advance(), Transition::ComputerThinking { .. }));
        assert!(matches!(session.advance(), Transition::UserTurn { .. }));
        let report = session.new_game();
        assert_eq!(report.high_score, 10);
        assert!(
            session
                .state()
                .unlocked_achievement_ids
                .contains("first_correct")
        );
    }

    #[test]
    fn repository_surfaces_backend_errors() {
        let repo = SaveRepository::new(BrokenStorage);
        assert!(matches!(repo.try_load(), Err(StorageError::Backend { .. })));
        assert_eq!(repo.load_save(), PersistedSave::default());
        assert!(!repo.update_high_score(5));
    }
}
