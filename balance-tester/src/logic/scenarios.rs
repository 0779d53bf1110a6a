use anyhow::{Result, ensure};
use balance_game::{MAX_LEVEL_INDEX, TeacherSettings, level};

use crate::logic::policy::AnswerStyle;
use crate::logic::simulation::{SimulationPlan, SimulationSummary};

const LOCKED_LEVEL: usize = 4;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(
        name: impl Into<String>,
        description: &'static str,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            plan,
        }
    }
}

#[must_use]
pub fn list_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "smoke",
            "Ten canonical answers with no surprises",
            SimulationPlan::new(AnswerStyle::Canonical, 10)
                .with_expectation(no_violations)
                .with_expectation(every_answer_correct),
        ),
        TestScenario::simulation(
            "perfect-run",
            "Thirty correct answers climb to the top level",
            SimulationPlan::new(AnswerStyle::Canonical, 30)
                .with_expectation(no_violations)
                .with_expectation(every_answer_correct)
                .with_expectation(reaches_top_level),
        ),
        TestScenario::simulation(
            "equivalent-forms",
            "Bare values and chained signs count the same as the canonical form",
            SimulationPlan::new(AnswerStyle::Mixed, 24)
                .with_expectation(no_violations)
                .with_expectation(every_answer_correct),
        ),
        TestScenario::simulation(
            "sloppy-run",
            "A player who miscounts the balance thirty percent of the time",
            SimulationPlan::new(AnswerStyle::Sloppy { mistake_pct: 30 }, 40)
                .with_expectation(no_violations)
                .with_expectation(attempts_add_up),
        ),
        TestScenario::simulation(
            "timer-timeouts",
            "Teacher timer set to three seconds and nobody answers",
            SimulationPlan::new(AnswerStyle::Idle, 8)
                .with_teacher(TeacherSettings {
                    active: true,
                    timer_secs: 3,
                    ..TeacherSettings::default()
                })
                .with_expectation(no_violations)
                .with_expectation(every_round_timed_out),
        ),
        TestScenario::simulation(
            "locked-level",
            "Teacher pins the class to level four",
            SimulationPlan::new(AnswerStyle::Canonical, 12)
                .with_teacher(TeacherSettings {
                    active: true,
                    locked_level: Some(LOCKED_LEVEL),
                    ..TeacherSettings::default()
                })
                .with_expectation(no_violations)
                .with_expectation(amounts_stay_in_locked_range),
        ),
        TestScenario::simulation(
            "new-game-cycle",
            "Three games of ten rounds with progress carried between them",
            SimulationPlan::new(AnswerStyle::Sloppy { mistake_pct: 20 }, 30)
                .with_new_game_every(10)
                .with_expectation(no_violations)
                .with_expectation(two_new_games_recorded),
        ),
    ]
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    list_scenarios()
        .into_iter()
        .find(|scenario| scenario.name.eq_ignore_ascii_case(name))
}

fn no_violations(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.violations.is_empty(),
        "invariant violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn every_answer_correct(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.incorrect == 0,
        "{} answers were judged wrong",
        summary.incorrect
    );
    ensure!(
        usize::try_from(summary.correct)? == summary.rounds_played,
        "{} correct over {} rounds",
        summary.correct,
        summary.rounds_played
    );
    Ok(())
}

fn reaches_top_level(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    ensure!(
        state.current_level_index == MAX_LEVEL_INDEX,
        "finished on level {} instead of {MAX_LEVEL_INDEX}",
        state.current_level_index
    );
    ensure!(
        state.unlocked_achievement_ids.contains("level_6"),
        "level_6 achievement not unlocked"
    );
    Ok(())
}

fn attempts_add_up(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    ensure!(
        state.total_correct_answers == summary.correct,
        "state counts {} correct, tester saw {}",
        state.total_correct_answers,
        summary.correct
    );
    ensure!(
        state.total_attempts == summary.correct + summary.incorrect,
        "state counts {} attempts, tester saw {}",
        state.total_attempts,
        summary.correct + summary.incorrect
    );
    Ok(())
}

fn every_round_timed_out(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        usize::try_from(summary.timeouts)? == summary.rounds_played,
        "{} timeouts over {} rounds",
        summary.timeouts,
        summary.rounds_played
    );
    ensure!(summary.final_state.score == 0, "idle player scored points");
    Ok(())
}

fn amounts_stay_in_locked_range(summary: &SimulationSummary) -> Result<()> {
    let (min, max) = level(LOCKED_LEVEL).number_range;
    let Some((lo, hi)) = summary.amount_range_seen else {
        anyhow::bail!("no instructions were drawn");
    };
    ensure!(
        lo >= min && hi <= max,
        "amounts {lo}..={hi} left the locked range {min}..={max}"
    );
    Ok(())
}

fn two_new_games_recorded(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.new_games == 2, "started {} new games", summary.new_games);
    ensure!(
        summary.games_recorded == 2,
        "save records {} games",
        summary.games_recorded
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::simulation::run_plan;

    #[test]
    fn scenario_names_are_unique() {
        let scenarios = list_scenarios();
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn lookup_ignores_case() {
        assert!(get_scenario("Smoke").is_some());
        assert!(get_scenario("missing").is_none());
    }

    #[test]
    fn every_scenario_meets_its_expectations() {
        for scenario in list_scenarios() {
            for seed in [1, 1337] {
                let summary = run_plan(&scenario.plan, seed);
                for expectation in &scenario.plan.expectations {
                    if let Err(err) = expectation(&summary) {
                        panic!("{} seed {seed}: {err}", scenario.name);
                    }
                }
            }
        }
    }
}
