use std::collections::BTreeSet;
use std::fmt;

use balance_game::{
    GameSession, GameState, MemoryStorage, RoundPhase, RoundReport, TeacherSettings, Transition,
    level_for_streak,
};

use crate::logic::policy::{AnswerStyle, PolicyAnswer};

/// Check run against the finished summary of one iteration.
pub type Expectation = fn(&SimulationSummary) -> anyhow::Result<()>;

/// Everything needed to replay one automated game.
#[derive(Clone)]
pub struct SimulationPlan {
    pub style: AnswerStyle,
    pub rounds: usize,
    pub teacher: TeacherSettings,
    /// Start a new game every this many rounds.
    pub new_game_every: Option<usize>,
    pub expectations: Vec<Expectation>,
}

impl fmt::Debug for SimulationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationPlan")
            .field("style", &self.style)
            .field("rounds", &self.rounds)
            .field("teacher", &self.teacher)
            .field("new_game_every", &self.new_game_every)
            .field("expectations", &self.expectations.len())
            .finish()
    }
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(style: AnswerStyle, rounds: usize) -> Self {
        Self {
            style,
            rounds,
            teacher: TeacherSettings {
                active: false,
                locked_level: None,
                timer_secs: 0,
                cheat_sheet: false,
                custom_range: None,
            },
            new_game_every: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_teacher(mut self, teacher: TeacherSettings) -> Self {
        self.teacher = teacher;
        self
    }

    #[must_use]
    pub const fn with_new_game_every(mut self, rounds: usize) -> Self {
        self.new_game_every = Some(rounds);
        self
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Outcome of one automated game.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub policy_name: &'static str,
    pub rounds_played: usize,
    pub correct: u32,
    pub incorrect: u32,
    pub timeouts: u32,
    pub new_games: u32,
    pub games_recorded: u32,
    pub amount_range_seen: Option<(u32, u32)>,
    pub final_state: GameState,
    pub violations: Vec<String>,
}

impl SimulationSummary {
    fn note_amount(&mut self, amount: u32) {
        self.amount_range_seen = Some(match self.amount_range_seen {
            Some((lo, hi)) => (lo.min(amount), hi.max(amount)),
            None => (amount, amount),
        });
    }
}

/// Tracks the values that must never move backwards.
#[derive(Debug, Default)]
struct InvariantTracker {
    last_score: u32,
    unlocked: BTreeSet<String>,
}

impl InvariantTracker {
    fn check_state(&mut self, round: usize, state: &GameState, violations: &mut Vec<String>) {
        if state.total_correct_answers > state.total_attempts {
            violations.push(format!(
                "round {round}: {} correct out of {} attempts",
                state.total_correct_answers, state.total_attempts
            ));
        }
        if state.max_streak_ever < state.current_streak {
            violations.push(format!(
                "round {round}: max streak {} below current streak {}",
                state.max_streak_ever, state.current_streak
            ));
        }
        let expected_level = level_for_streak(state.current_streak);
        if state.current_level_index != expected_level {
            violations.push(format!(
                "round {round}: level {} but streak {} maps to {expected_level}",
                state.current_level_index, state.current_streak
            ));
        }
        if state.score < self.last_score {
            violations.push(format!(
                "round {round}: score fell from {} to {}",
                self.last_score, state.score
            ));
        }
        self.last_score = state.score;
        if !state.unlocked_achievement_ids.is_superset(&self.unlocked) {
            violations.push(format!("round {round}: unlocked achievements shrank"));
        }
        self.unlocked.clone_from(&state.unlocked_achievement_ids);
    }

    const fn reset_score(&mut self) {
        self.last_score = 0;
    }
}

/// Drives a [`GameSession`] with an answer policy and records invariant
/// violations instead of panicking.
pub fn run_plan(plan: &SimulationPlan, seed: u64) -> SimulationSummary {
    let storage = MemoryStorage::new();
    let mut session = GameSession::with_seed(storage, seed);
    let teacher_result = session.set_teacher_settings(plan.teacher);
    let mut policy = plan.style.create_policy(seed);
    let mut tracker = InvariantTracker::default();
    let mut summary = SimulationSummary {
        seed,
        policy_name: policy.name(),
        rounds_played: 0,
        correct: 0,
        incorrect: 0,
        timeouts: 0,
        new_games: 0,
        games_recorded: 0,
        amount_range_seen: None,
        final_state: session.state().clone(),
        violations: Vec::new(),
    };
    if let Err(err) = teacher_result {
        summary
            .violations
            .push(format!("teacher settings rejected: {err}"));
        return summary;
    }

    // Teacher settings shape the turn after they are applied.
    if plan.teacher.active {
        let _ = session.new_game();
        tracker.reset_score();
    }

    for round in 1..=plan.rounds {
        if let Some(every) = plan.new_game_every
            && round > 1
            && (round - 1) % every == 0
        {
            let report = session.new_game();
            log::debug!(
                "seed {seed}: new game after {} correct of {}",
                report.finished.correct,
                report.finished.total
            );
            summary.new_games += 1;
            tracker.reset_score();
        }

        let Some(instruction) = session.active_instruction().cloned() else {
            summary
                .violations
                .push(format!("round {round}: no active instruction"));
            break;
        };
        summary.note_amount(instruction.amount);

        let report = match play_turn(&mut session, policy.answer(&instruction), plan) {
            Ok(report) => report,
            Err(err) => {
                summary.violations.push(format!("round {round}: {err}"));
                break;
            }
        };
        if report.timed_out {
            summary.timeouts += 1;
        }
        if report.correct {
            summary.correct += 1;
        } else {
            summary.incorrect += 1;
        }
        tracker.check_state(round, session.state(), &mut summary.violations);

        if let Err(err) = hand_over(&mut session, plan) {
            summary.violations.push(format!("round {round}: {err}"));
            break;
        }
        summary.rounds_played = round;
    }

    summary.games_recorded = session.saves().load_save().total_games_played;
    summary.final_state = session.state().clone();
    summary
}

fn play_turn(
    session: &mut GameSession<MemoryStorage>,
    answer: PolicyAnswer,
    plan: &SimulationPlan,
) -> Result<RoundReport, String> {
    match answer {
        PolicyAnswer::Submit {
            expression,
            balance,
            expect_correct,
        } => {
            let report = session
                .submit(&expression, &balance)
                .map_err(|err| format!("submit {expression:?} / {balance:?} refused: {err}"))?;
            if report.correct != expect_correct {
                return Err(format!(
                    "{expression:?} / {balance:?} judged {} but policy expected {}",
                    report.correct, expect_correct
                ));
            }
            Ok(report)
        }
        PolicyAnswer::Idle => {
            let budget = plan.teacher.timer_secs.saturating_add(1);
            for _ in 0..budget {
                if let Some(report) = session.tick_timer() {
                    return Ok(report);
                }
            }
            Err(format!("turn timer did not expire within {budget} ticks"))
        }
    }
}

fn hand_over(
    session: &mut GameSession<MemoryStorage>,
    plan: &SimulationPlan,
) -> Result<(), String> {
    if session.phase() != RoundPhase::RoundComplete {
        return Err(format!("expected RoundComplete, found {:?}", session.phase()));
    }
    if session.has_armed_timer() {
        return Err("turn timer still armed after the answer resolved".to_string());
    }
    match session.advance() {
        Transition::ComputerThinking { .. } => {}
        other => return Err(format!("expected computer turn, got {other:?}")),
    }
    match session.advance() {
        Transition::UserTurn { .. } => {}
        other => return Err(format!("expected user turn, got {other:?}")),
    }
    if session.phase() != RoundPhase::AwaitingUserAnswer {
        return Err(format!(
            "expected AwaitingUserAnswer, found {:?}",
            session.phase()
        ));
    }
    if session.has_armed_timer() != plan.teacher.timer_enabled() {
        return Err(format!(
            "timer armed = {} but teacher timer enabled = {}",
            session.has_armed_timer(),
            plan.teacher.timer_enabled()
        ));
    }
    Ok(())
}
