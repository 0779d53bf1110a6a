//! Turn loop: owns the game state and walks it through
//! user turn → evaluation → round complete → computer turn → user turn.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use smallvec::SmallVec;

use crate::KeyValueStorage;
use crate::achievements::AchievementRule;
use crate::computer::{ComputerMove, computer_turn_in_range};
use crate::constants::{
    COMPUTER_THINKING_DELAY_MS, CORRECT_FEEDBACK_DELAY_MS, INCORRECT_FEEDBACK_DELAY_MS,
};
use crate::feedback::{Cue, FeedbackSink};
use crate::hint::Hint;
use crate::instruction::{Instruction, generate_in_range};
use crate::levels::level;
use crate::progression::LevelProgress;
use crate::save::SaveRepository;
use crate::score::is_streak_milestone;
use crate::state::{GameState, Turn};
use crate::stats::{SessionSummary, StatsLedger, StatsRecorder};
use crate::teacher::{
    CheatSheet, TeacherConfigError, TeacherSettings, TeacherUnlock, TimerTick, TurnTimer,
};
use crate::validate::{InputError, ValidationResult, check_fields, validate_answer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    AwaitingUserAnswer,
    EvaluatingAnswer,
    RoundComplete,
    ComputerThinking,
}

/// Everything a front end needs after an answer (or a timeout) resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// `None` when the turn timer ran out.
    pub validation: Option<ValidationResult>,
    pub timed_out: bool,
    pub correct: bool,
    pub points: u32,
    pub leveled_up: bool,
    pub level_index: usize,
    pub newly_unlocked: Vec<&'static AchievementRule>,
    pub hint: Option<Hint>,
    pub cues: SmallVec<[Cue; 4]>,
    pub new_high_score: bool,
    pub progress: LevelProgress,
    /// Pause before calling [`GameSession::advance`].
    pub delay_ms: u32,
}

impl RoundReport {
    pub fn dispatch<F>(&self, sink: &mut F)
    where
        F: FeedbackSink + ?Sized,
    {
        for cue in &self.cues {
            sink.cue(*cue);
        }
    }
}

/// Result of [`GameSession::advance`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// The computer has drawn its instruction; apply it after `delay_ms`.
    ComputerThinking { preview: Instruction, delay_ms: u32 },
    /// The computer moved and the next user turn has started.
    UserTurn {
        computer: ComputerMove,
        instruction: Instruction,
    },
    /// Nothing is scheduled; the session waits for the user.
    Idle,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGameReport {
    pub finished: SessionSummary,
    pub high_score: u32,
    pub instruction: Instruction,
}

/// Score panel payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: u32,
    pub streak: u32,
    pub level_index: usize,
    pub level_name: &'static str,
    pub progress: LevelProgress,
    pub high_score: u32,
    pub accuracy_percent: u8,
}

/// One player's game against the computer.
///
/// All mutation goes through `submit`, `tick_timer`, `advance` and
/// `new_game`; persistence failures are logged and never surface here.
#[derive(Debug)]
pub struct GameSession<S, R = ChaCha20Rng> {
    state: GameState,
    phase: RoundPhase,
    rng: R,
    teacher: TeacherSettings,
    unlock: TeacherUnlock,
    timer: Option<TurnTimer>,
    pending_computer: Option<ComputerMove>,
    saves: SaveRepository<S>,
    stats: StatsRecorder<S>,
    high_score: u32,
}

impl<S> GameSession<S, ChaCha20Rng>
where
    S: KeyValueStorage + Clone,
{
    /// Deterministic session for replays and tests.
    #[must_use]
    pub fn with_seed(storage: S, seed: u64) -> Self {
        Self::new(storage, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<S, R> GameSession<S, R>
where
    S: KeyValueStorage + Clone,
    R: Rng,
{
    /// Restore cross-session progress from storage and start the first user
    /// turn.
    pub fn new(storage: S, rng: R) -> Self {
        let saves = SaveRepository::new(storage.clone());
        let save = saves.load_save();
        let mut session = Self {
            state: GameState::restored(&save),
            phase: RoundPhase::AwaitingUserAnswer,
            rng,
            teacher: TeacherSettings::default(),
            unlock: TeacherUnlock::new(),
            timer: None,
            pending_computer: None,
            saves,
            stats: StatsRecorder::new(storage),
            high_score: save.high_score,
        };
        session.start_user_turn();
        session
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub const fn teacher(&self) -> &TeacherSettings {
        &self.teacher
    }

    #[must_use]
    pub const fn saves(&self) -> &SaveRepository<S> {
        &self.saves
    }

    #[must_use]
    pub fn active_instruction(&self) -> Option<&Instruction> {
        self.state.active_instruction.as_ref()
    }

    /// Seconds left on the turn timer, if one is armed.
    #[must_use]
    pub fn timer_remaining(&self) -> Option<u32> {
        self.timer.map(|t| t.remaining())
    }

    #[must_use]
    pub const fn has_armed_timer(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score.max(self.state.score)
    }

    #[must_use]
    pub fn stats(&self) -> StatsLedger {
        self.stats.load()
    }

    #[must_use]
    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard {
            score: self.state.score,
            streak: self.state.current_streak,
            level_index: self.state.current_level_index,
            level_name: level(self.state.current_level_index).display_name,
            progress: self.state.progress(),
            high_score: self.high_score(),
            accuracy_percent: self.state.accuracy_percent(),
        }
    }

    /// The answer to the user's current instruction, when the cheat sheet is
    /// enabled.
    #[must_use]
    pub fn cheat_sheet(&self) -> Option<CheatSheet> {
        if self.phase != RoundPhase::AwaitingUserAnswer {
            return None;
        }
        self.active_instruction()
            .and_then(|instr| self.teacher.cheat_sheet_for(instr))
    }

    /// Replace teacher settings. They shape the next instruction drawn; a
    /// running timer is dropped when the new settings disable it.
    ///
    /// # Errors
    ///
    /// Returns [`TeacherConfigError`] for an unknown locked level or a bad
    /// custom range; the current settings stay in place.
    pub fn set_teacher_settings(
        &mut self,
        settings: TeacherSettings,
    ) -> Result<(), TeacherConfigError> {
        settings.validate()?;
        if !settings.timer_enabled() {
            self.timer = None;
        }
        self.teacher = settings;
        Ok(())
    }

    /// Feed a typed key; activates teacher mode once the unlock phrase is
    /// complete.
    pub fn type_key(&mut self, key: char) -> bool {
        if !self.unlock.push(key) {
            return false;
        }
        if !self.teacher.active {
            log::info!("teacher mode unlocked");
        }
        self.teacher.active = true;
        true
    }

    /// Check the user's answer for the active instruction.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotAwaitingAnswer`] outside the user's turn and
    /// [`InputError::EmptyExpression`] / [`InputError::EmptyBalance`] for
    /// blank fields. None of these change any state.
    pub fn submit(&mut self, expression: &str, balance: &str) -> Result<RoundReport, InputError> {
        if self.phase != RoundPhase::AwaitingUserAnswer {
            return Err(InputError::NotAwaitingAnswer);
        }
        let instruction = self
            .state
            .active_instruction
            .clone()
            .ok_or(InputError::NotAwaitingAnswer)?;
        check_fields(expression, balance)?;

        self.timer = None;
        self.phase = RoundPhase::EvaluatingAnswer;
        let validation = validate_answer(expression, balance, &instruction);
        self.stats
            .record_attempt(validation.both_accepted, &instruction);

        let report = if validation.both_accepted {
            self.resolve_correct(&instruction, validation)
        } else {
            self.resolve_incorrect(&instruction, Some(validation))
        };
        Ok(report)
    }

    /// Advance the turn timer by one second. Returns the timeout report when
    /// it runs out during the user's turn.
    pub fn tick_timer(&mut self) -> Option<RoundReport> {
        if self.phase != RoundPhase::AwaitingUserAnswer {
            self.timer = None;
            return None;
        }
        match self.timer.as_mut()?.tick() {
            TimerTick::Running { .. } => None,
            TimerTick::Expired => {
                self.timer = None;
                let instruction = self.state.active_instruction.clone()?;
                log::debug!("turn timer expired on {}", instruction.canonical_expression);
                self.phase = RoundPhase::EvaluatingAnswer;
                self.stats.record_attempt(false, &instruction);
                Some(self.resolve_incorrect(&instruction, None))
            }
        }
    }

    /// Run the next scheduled transition.
    pub fn advance(&mut self) -> Transition {
        match self.phase {
            RoundPhase::RoundComplete => {
                self.state.active_turn = Turn::Computer;
                let mv = self.draw_computer_move();
                self.state.active_instruction = Some(mv.instruction.clone());
                let preview = mv.instruction.clone();
                self.pending_computer = Some(mv);
                self.phase = RoundPhase::ComputerThinking;
                Transition::ComputerThinking {
                    preview,
                    delay_ms: COMPUTER_THINKING_DELAY_MS,
                }
            }
            RoundPhase::ComputerThinking => {
                let mv = self
                    .pending_computer
                    .take()
                    .unwrap_or_else(|| self.draw_computer_move());
                self.state.apply_computer_move(&mv);
                log::debug!(
                    "computer played {} -> {}",
                    mv.instruction.canonical_expression,
                    mv.new_computer_balance
                );
                self.saves.save_progress(&self.state);
                let instruction = self.start_user_turn();
                Transition::UserTurn {
                    computer: mv,
                    instruction,
                }
            }
            RoundPhase::AwaitingUserAnswer | RoundPhase::EvaluatingAnswer => Transition::Idle,
        }
    }

    /// Close out the current game and start a fresh one. Only unlocked
    /// achievements carry over; best values live on in the save.
    pub fn new_game(&mut self) -> NewGameReport {
        self.timer = None;
        self.pending_computer = None;
        let finished = SessionSummary {
            correct: self.state.total_correct_answers,
            total: self.state.total_attempts,
            streak: self.state.max_streak_ever,
        };
        self.stats.record_session(finished);
        self.saves.save_on_new_game(&self.state);

        let save = self.saves.load_save();
        self.high_score = self.high_score().max(save.high_score);
        let mut state = GameState::default();
        // A failed write must not lose unlocks earned this session.
        state.unlocked_achievement_ids = save.unlocked_achievement_ids.iter().cloned().collect();
        state
            .unlocked_achievement_ids
            .extend(self.state.unlocked_achievement_ids.iter().cloned());
        self.state = state;
        log::info!(
            "new game started; {} games played, high score {}",
            save.total_games_played,
            self.high_score
        );

        let instruction = self.start_user_turn();
        NewGameReport {
            finished,
            high_score: self.high_score,
            instruction,
        }
    }

    fn start_user_turn(&mut self) -> Instruction {
        self.state.active_turn = Turn::User;
        self.state.turn_counter = self.state.turn_counter.saturating_add(1);
        let range = self.teacher.amount_range(self.state.current_level_index);
        let instruction = generate_in_range(&mut self.rng, range, self.state.user_balance);
        self.state.active_instruction = Some(instruction.clone());
        self.timer = self
            .teacher
            .timer_enabled()
            .then(|| TurnTimer::new(self.teacher.timer_secs));
        self.phase = RoundPhase::AwaitingUserAnswer;
        instruction
    }

    fn draw_computer_move(&mut self) -> ComputerMove {
        let range = self.teacher.amount_range(self.state.current_level_index);
        computer_turn_in_range(&mut self.rng, range, self.state.computer_balance)
    }

    fn resolve_correct(
        &mut self,
        instruction: &Instruction,
        validation: ValidationResult,
    ) -> RoundReport {
        let outcome = self.state.apply_correct(instruction);
        let new_high_score = self.saves.update_high_score(self.state.score);
        self.high_score = self.high_score.max(self.state.score);
        self.saves.save_progress(&self.state);

        let mut cues = SmallVec::new();
        cues.push(Cue::Success);
        if is_streak_milestone(self.state.current_streak) {
            cues.push(Cue::Streak);
        }
        cues.push(Cue::Ticket);
        if outcome.leveled_up {
            cues.push(Cue::LevelUp);
            log::info!("level up to {}", level(outcome.level_index).display_name);
        }
        cues.extend(outcome.newly_unlocked.iter().map(|_| Cue::Achievement));

        self.phase = RoundPhase::RoundComplete;
        RoundReport {
            validation: Some(validation),
            timed_out: false,
            correct: true,
            points: outcome.points,
            leveled_up: outcome.leveled_up,
            level_index: outcome.level_index,
            newly_unlocked: outcome.newly_unlocked,
            hint: None,
            cues,
            new_high_score,
            progress: self.state.progress(),
            delay_ms: CORRECT_FEEDBACK_DELAY_MS,
        }
    }

    fn resolve_incorrect(
        &mut self,
        instruction: &Instruction,
        validation: Option<ValidationResult>,
    ) -> RoundReport {
        self.state.apply_incorrect();
        self.saves.save_progress(&self.state);
        self.phase = RoundPhase::RoundComplete;
        RoundReport {
            validation,
            timed_out: validation.is_none(),
            correct: false,
            points: 0,
            leveled_up: false,
            level_index: self.state.current_level_index,
            newly_unlocked: Vec::new(),
            hint: Some(Hint::from_instruction(instruction)),
            cues: SmallVec::from_slice(&[Cue::Error]),
            new_high_score: false,
            progress: self.state.progress(),
            delay_ms: INCORRECT_FEEDBACK_DELAY_MS,
        }
    }
}
