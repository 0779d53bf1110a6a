//! Answer validation against a generated instruction.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::evaluate;
use crate::instruction::Instruction;
use crate::numbers::round_half_up;

/// Outcome of checking both answer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub expression_accepted: bool,
    pub balance_accepted: bool,
    pub both_accepted: bool,
}

/// Submissions rejected before any evaluation takes place. None of these
/// record an attempt or touch game state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("the expression field is empty")]
    EmptyExpression,
    #[error("the balance field is empty")]
    EmptyBalance,
    #[error("no answer is expected right now")]
    NotAwaitingAnswer,
}

/// Guard both fields before evaluation.
///
/// # Errors
///
/// Returns [`InputError::EmptyExpression`] or [`InputError::EmptyBalance`]
/// when a field is blank after trimming.
pub fn check_fields(raw_expression: &str, raw_balance: &str) -> Result<(), InputError> {
    if raw_expression.trim().is_empty() {
        return Err(InputError::EmptyExpression);
    }
    if raw_balance.trim().is_empty() {
        return Err(InputError::EmptyBalance);
    }
    Ok(())
}

/// Trim, drop all interior whitespace, and map `×` to `*`.
///
/// The evaluator never accepts `*`, so a multiplication glyph still fails.
#[must_use]
pub fn normalize_expression(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '×' { '*' } else { c })
        .collect()
}

/// Accept the canonical text (case-insensitive) or any restricted arithmetic
/// expression whose rounded value equals the instruction's signed delta.
#[must_use]
pub fn expression_matches(normalized: &str, instruction: &Instruction) -> bool {
    if normalized.eq_ignore_ascii_case(&instruction.canonical_expression) {
        return true;
    }
    match evaluate(normalized) {
        Ok(value) => round_half_up(value) == Some(instruction.signed_delta),
        Err(err) => {
            log::debug!("expression {normalized:?} rejected: {err}");
            false
        }
    }
}

/// Accept any real number that rounds to the resulting balance.
#[must_use]
pub fn balance_matches(raw_balance: &str, instruction: &Instruction) -> bool {
    raw_balance
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(round_half_up)
        .is_some_and(|rounded| rounded == instruction.resulting_balance)
}

/// Check a free-form expression and balance. Never fails; malformed text is
/// simply not accepted.
#[must_use]
pub fn validate_answer(
    raw_expression: &str,
    raw_balance: &str,
    instruction: &Instruction,
) -> ValidationResult {
    let expression_accepted =
        expression_matches(&normalize_expression(raw_expression), instruction);
    let balance_accepted = balance_matches(raw_balance, instruction);
    ValidationResult {
        expression_accepted,
        balance_accepted,
        both_accepted: expression_accepted && balance_accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Action, Ticket, generate_instruction};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn give_negative_five() -> Instruction {
        Instruction::new(Action::Give, Ticket::Negative, 5, 0)
    }

    #[test]
    fn canonical_answer_round_trips_for_generated_instructions() {
        let mut rng = SmallRng::seed_from_u64(2024);
        for level in 0..6 {
            for balance in [-7, 0, 12] {
                let instr = generate_instruction(&mut rng, level, balance);
                let result = validate_answer(
                    &instr.canonical_expression,
                    &instr.resulting_balance.to_string(),
                    &instr,
                );
                assert!(result.both_accepted, "{instr:?} -> {result:?}");
            }
        }
    }

    #[test]
    fn equivalent_forms_are_accepted() {
        let instr = give_negative_five();
        for form in ["5", "+5", "--5", "-(-5)", " - ( - 5 ) ", "0-(-5)", "5.0", "+(+5)"] {
            assert!(
                validate_answer(form, "5", &instr).expression_accepted,
                "{form} should be accepted"
            );
        }
    }

    #[test]
    fn wrong_or_foreign_expressions_are_rejected() {
        let instr = give_negative_five();
        for form in ["abc", "-5", "-(+5)", "5×1", "5*1", "(5", "", "Math.abs(-5)"] {
            assert!(
                !validate_answer(form, "5", &instr).expression_accepted,
                "{form} should be rejected"
            );
        }
    }

    #[test]
    fn balance_uses_rounding_tolerance() {
        let instr = Instruction::new(Action::Take, Ticket::Negative, 3, 1);
        assert_eq!(instr.resulting_balance, -2);
        assert!(balance_matches("-2", &instr));
        assert!(balance_matches("-2.0", &instr));
        assert!(balance_matches(" -2.4 ", &instr));
        assert!(balance_matches("-2.5", &instr));
        assert!(!balance_matches("-2.6", &instr));
        assert!(!balance_matches("two", &instr));
        assert!(!balance_matches("NaN", &instr));
        assert!(!balance_matches("inf", &instr));
    }

    #[test]
    fn both_accepted_requires_both_fields() {
        let instr = give_negative_five();
        let result = validate_answer("-(-5)", "4", &instr);
        assert!(result.expression_accepted);
        assert!(!result.balance_accepted);
        assert!(!result.both_accepted);
    }

    #[test]
    fn field_guard_rejects_blank_input() {
        assert_eq!(check_fields("  ", "5"), Err(InputError::EmptyExpression));
        assert_eq!(check_fields("5", ""), Err(InputError::EmptyBalance));
        assert_eq!(check_fields("5", "5"), Ok(()));
    }
}
