//! Instruction generation: one random "take/give N positive/negative tickets"
//! challenge per turn.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::levels::level;

/// What the player does with the tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Taking tickets adds them to the balance (`+1`).
    Take,
    /// Giving tickets away subtracts them (`-1`).
    Give,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::Take, Self::Give];

    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Take => 1,
            Self::Give => -1,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Take => '+',
            Self::Give => '-',
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Take => "take",
            Self::Give => "give",
        }
    }
}

/// The kind of ticket handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ticket {
    Positive,
    Negative,
}

impl Ticket {
    pub const ALL: [Self; 2] = [Self::Positive, Self::Negative];

    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Positive => '+',
            Self::Negative => '-',
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// A generated challenge. Immutable once created; derived fields are
/// computed by [`Instruction::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub action: Action,
    pub ticket: Ticket,
    pub amount: u32,
    pub prior_balance: i64,
    pub signed_delta: i64,
    pub resulting_balance: i64,
    pub canonical_expression: String,
    pub is_double_negative: bool,
}

impl Instruction {
    #[must_use]
    pub fn new(action: Action, ticket: Ticket, amount: u32, prior_balance: i64) -> Self {
        let signed_delta = action.sign() * ticket.sign() * i64::from(amount);
        Self {
            action,
            ticket,
            amount,
            prior_balance,
            signed_delta,
            resulting_balance: prior_balance.saturating_add(signed_delta),
            canonical_expression: format!("{}({}{amount})", action.symbol(), ticket.symbol()),
            is_double_negative: matches!((action, ticket), (Action::Give, Ticket::Negative)),
        }
    }

    #[must_use]
    pub const fn action_sign(&self) -> i64 {
        self.action.sign()
    }

    #[must_use]
    pub const fn item_sign(&self) -> i64 {
        self.ticket.sign()
    }
}

/// Draw an instruction from the amount range of `level_index` (clamped to
/// level 0 when out of bounds).
pub fn generate_instruction<R>(rng: &mut R, level_index: usize, current_balance: i64) -> Instruction
where
    R: Rng + ?Sized,
{
    generate_in_range(rng, level(level_index).number_range, current_balance)
}

/// Draw an instruction with `amount` uniform in `min..=max`. Bounds are
/// ordered and raised to at least 1, so the amount is always positive.
pub fn generate_in_range<R>(rng: &mut R, range: (u32, u32), current_balance: i64) -> Instruction
where
    R: Rng + ?Sized,
{
    let min = range.0.min(range.1).max(1);
    let max = range.0.max(range.1).max(min);
    let amount = rng.gen_range(min..=max);
    let action = Action::ALL[rng.gen_range(0..Action::ALL.len())];
    let ticket = Ticket::ALL[rng.gen_range(0..Ticket::ALL.len())];
    let instruction = Instruction::new(action, ticket, amount, current_balance);
    log::debug!(
        "generated {} from balance {current_balance}",
        instruction.canonical_expression
    );
    instruction
}

/// Render with an explicit `+` for positive values.
#[must_use]
pub fn format_signed(n: i64) -> String {
    if n > 0 { format!("+{n}") } else { n.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn derived_fields_follow_signs() {
        let instr = Instruction::new(Action::Give, Ticket::Negative, 5, 2);
        assert_eq!(instr.signed_delta, 5);
        assert_eq!(instr.resulting_balance, 7);
        assert_eq!(instr.canonical_expression, "-(-5)");
        assert!(instr.is_double_negative);

        let instr = Instruction::new(Action::Take, Ticket::Negative, 3, 0);
        assert_eq!(instr.signed_delta, -3);
        assert_eq!(instr.canonical_expression, "+(-3)");
        assert!(!instr.is_double_negative);

        let instr = Instruction::new(Action::Give, Ticket::Positive, 4, -1);
        assert_eq!(instr.resulting_balance, -5);
        assert_eq!(instr.canonical_expression, "-(+4)");
    }

    #[test]
    fn level_zero_draws_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let instr = generate_instruction(&mut rng, 0, 0);
            assert!((1..=5).contains(&instr.amount));
            assert_eq!(
                instr.resulting_balance,
                instr.action_sign() * instr.item_sign() * i64::from(instr.amount)
            );
        }
    }

    #[test]
    fn out_of_range_level_uses_first_level() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            assert!(generate_instruction(&mut rng, 42, 10).amount <= 5);
        }
    }

    #[test]
    fn degenerate_ranges_still_draw_positive_amounts() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(generate_in_range(&mut rng, (0, 0), 0).amount, 1);
            assert!((1..=3).contains(&generate_in_range(&mut rng, (3, 0), 0).amount));
            assert!((4..=6).contains(&generate_in_range(&mut rng, (6, 4), 0).amount));
        }
    }

    #[test]
    fn all_four_combinations_appear() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let instr = generate_instruction(&mut rng, 2, 0);
            seen.insert((instr.action, instr.ticket));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = SmallRng::seed_from_u64(99);
        let mut b = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(
                generate_instruction(&mut a, 5, -3),
                generate_instruction(&mut b, 5, -3)
            );
        }
    }

    #[test]
    fn format_signed_marks_positive_values() {
        assert_eq!(format_signed(5), "+5");
        assert_eq!(format_signed(0), "0");
        assert_eq!(format_signed(-5), "-5");
    }
}
