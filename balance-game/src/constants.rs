//! Tuning constants for the balance game core: pacing, scoring, storage
//! keys and evaluator limits.

// Scoring ------------------------------------------------------------------
pub(crate) const STREAK_MILESTONE: u32 = 5;
pub(crate) const STREAK_BONUS_PER_MILESTONE: u32 = 5;

// Round pacing (milliseconds) ----------------------------------------------
pub const CORRECT_FEEDBACK_DELAY_MS: u32 = 2_000;
pub const INCORRECT_FEEDBACK_DELAY_MS: u32 = 2_500;
pub const COMPUTER_THINKING_DELAY_MS: u32 = 1_500;
pub const TURN_TIMER_WARNING_SECS: u32 = 5;

// Persistence --------------------------------------------------------------
pub const SAVE_KEY: &str = "gleichgewichtsspiel_save";
pub const SAVE_VERSION_KEY: &str = "gleichgewichtsspiel_version";
/// Bump when the save schema changes; older saves are discarded.
pub const SAVE_VERSION: &str = "1.0.0";
pub const STATS_KEY: &str = "gleichgewicht_stats_v2";
pub(crate) const SESSION_HISTORY_CAP: usize = 30;

// Teacher mode -------------------------------------------------------------
pub(crate) const TEACHER_UNLOCK_PHRASE: &str = "lehrer";
pub(crate) const TEACHER_UNLOCK_BUFFER: usize = 7;

// Expression evaluation ----------------------------------------------------
pub(crate) const EXPR_MAX_DEPTH: usize = 64;
pub(crate) const EXPR_MAX_LEN: usize = 256;
