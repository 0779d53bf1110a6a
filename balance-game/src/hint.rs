//! Structured hint facts for an answered-wrong (or timed-out) instruction.
use serde::{Deserialize, Serialize};

use crate::instruction::{Action, Instruction, Ticket};

/// Everything a renderer needs to explain the correct answer, as data:
/// the action, the tickets involved, the canonical expression and the
/// sentence `prior <operator> magnitude = resulting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub action: Action,
    pub amount: u32,
    pub ticket: Ticket,
    pub plural: bool,
    pub canonical_expression: String,
    pub signed_delta: i64,
    pub prior_balance: i64,
    pub operator: char,
    pub magnitude: u64,
    pub resulting_balance: i64,
}

impl Hint {
    #[must_use]
    pub fn from_instruction(instruction: &Instruction) -> Self {
        let operator = if instruction.signed_delta >= 0 { '+' } else { '-' };
        Self {
            action: instruction.action,
            amount: instruction.amount,
            ticket: instruction.ticket,
            plural: instruction.amount != 1,
            canonical_expression: instruction.canonical_expression.clone(),
            signed_delta: instruction.signed_delta,
            prior_balance: instruction.prior_balance,
            operator,
            magnitude: instruction.signed_delta.unsigned_abs(),
            resulting_balance: instruction.resulting_balance,
        }
    }

    /// `true` when the balance goes up.
    #[must_use]
    pub const fn balance_rises(&self) -> bool {
        self.signed_delta >= 0
    }

    /// The arithmetic sentence, e.g. `"3 + 5 = 8"`.
    #[must_use]
    pub fn sentence(&self) -> String {
        format!(
            "{} {} {} = {}",
            self.prior_balance, self.operator, self.magnitude, self.resulting_balance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn give_negative_raises_balance() {
        let hint = Hint::from_instruction(&Instruction::new(Action::Give, Ticket::Negative, 5, 3));
        assert_eq!(hint.canonical_expression, "-(-5)");
        assert!(hint.balance_rises());
        assert_eq!(hint.sentence(), "3 + 5 = 8");
        assert!(hint.plural);
    }

    #[test]
    fn take_negative_lowers_balance() {
        let hint = Hint::from_instruction(&Instruction::new(Action::Take, Ticket::Negative, 1, 0));
        assert_eq!(hint.operator, '-');
        assert_eq!(hint.magnitude, 1);
        assert_eq!(hint.sentence(), "0 - 1 = -1");
        assert!(!hint.plural);
    }
}
